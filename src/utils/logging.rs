/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试中可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录会话启动信息
///
/// # 参数
/// - `reviewer_id`: 标注员ID
/// - `session_url`: 会话 URL
pub fn log_startup(reviewer_id: &str, session_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 标注会话启动");
    info!("🆔 标注员: {}", reviewer_id);
    info!("🔗 会话地址: {}", truncate_text(session_url, 120));
    info!("{}", "=".repeat(60));
}

/// 打印会话统计
///
/// # 参数
/// - `submitted`: 提交次数
/// - `failed`: 提交失败次数
pub fn print_session_summary(submitted: usize, failed: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 会话统计");
    info!(
        "结束时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 已提交: {}", submitted);
    info!("❌ 提交失败: {}", failed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
