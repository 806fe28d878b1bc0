use anyhow::Result;
use clap::{Parser, Subcommand};
use grasp_annotate::config::Config;
use grasp_annotate::infrastructure::SessionUrl;
use grasp_annotate::models::load_skeleton_file;
use grasp_annotate::orchestrator::{generate_links, App, LinkMode};
use grasp_annotate::utils::logging;
use std::path::PathBuf;

/// 抓取描述标注工具
#[derive(Parser)]
#[command(name = "grasp-annotate")]
#[command(about = "grasp-annotate - 抓取描述标注会话与链接生成", long_about = None)]
#[command(version)]
struct Cli {
    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 在终端中进行标注
    Annotate {
        /// 会话地址（默认恢复上次的会话）
        #[arg(long)]
        url: Option<String>,

        /// 重新进行测验
        #[arg(long)]
        quiz: bool,
    },
    /// 从任务骨架生成标注链接
    GenerateUrls {
        /// 要包含的类别
        #[arg(required = true)]
        categories: Vec<String>,

        /// 任务骨架 TOML 文件
        #[arg(long)]
        skeleton: PathBuf,

        /// 外部平台完成码
        #[arg(short = 'p', long)]
        prolific_code: Option<String>,

        /// 生成一条包含全部任务的进度表链接
        #[arg(long)]
        schedule: bool,

        /// 输出文件（默认打印到标准输出）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    match cli.command {
        Commands::Annotate { url, quiz } => {
            App::initialize(config, url, quiz).await?.run().await?;
        }
        Commands::GenerateUrls {
            categories,
            skeleton,
            prolific_code,
            schedule,
            output,
        } => {
            let skeleton = load_skeleton_file(&skeleton).await?;
            let base = SessionUrl::parse(&config.app_base_url)?;
            let mode = if schedule { LinkMode::Schedule } else { LinkMode::PerTask };
            let links = generate_links(
                &skeleton,
                &categories,
                &base,
                mode,
                prolific_code.as_deref(),
                &mut rand::rng(),
            )?;

            match output {
                Some(path) => tokio::fs::write(&path, links.join("\n") + "\n").await?,
                None => links.iter().for_each(|link| println!("{}", link)),
            }
        }
    }

    Ok(())
}
