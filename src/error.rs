use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 任务 / 网格获取错误
    #[error("获取错误: {0}")]
    Fetch(#[from] FetchError),
    /// 标注提交错误
    #[error("提交错误: {0}")]
    Submission(#[from] SubmissionError),
    /// 网格数据错误
    #[error("几何错误: {0}")]
    Geometry(#[from] GeometryError),
    /// 进度令牌错误
    #[error("令牌错误: {0}")]
    Token(#[from] TokenError),
    /// 表单校验错误
    #[error("表单错误: {0}")]
    Validation(#[from] ValidationError),
    /// 流程状态错误
    #[error("流程错误: {0}")]
    Workflow(#[from] WorkflowError),
    /// 本地存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 任务或网格获取失败
///
/// 网络错误没有 HTTP 状态码，`status` 为 `None`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("请求 {endpoint} 失败 (状态码: {status:?}): {message}")]
pub struct FetchError {
    pub endpoint: String,
    pub status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn new(endpoint: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }
}

/// 标注提交失败，携带状态码与响应正文用于展示
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("标注提交失败 (状态码: {status:?}): {body}")]
pub struct SubmissionError {
    pub status: Option<u16>,
    pub body: String,
}

impl SubmissionError {
    pub fn new(status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// 网格数据错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// 缓冲区结构不合法
    #[error("网格数据不合法: {0}")]
    MalformedPayload(String),
}

/// 进度令牌错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// 令牌无法解码为合法的进度表
    #[error("无效的进度令牌: {0}")]
    InvalidToken(String),
}

/// 表单校验错误（不会发出网络请求）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 必填字段缺失
    #[error("缺少必填字段: {0}")]
    MissingField(&'static str),
    /// 描述为空
    #[error("描述不能为空")]
    EmptyDescription,
    /// 表单中的任务与正在展示的任务不一致
    #[error("表单任务 {submitted} 与当前任务 {shown} 不一致")]
    TaskMismatch { shown: String, submitted: String },
}

/// 流程状态错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// 当前状态不允许该操作
    #[error("当前状态 {state} 不允许操作 {action}")]
    InvalidTransition { action: &'static str, state: String },
    /// 测验选项不存在
    #[error("选项 {0} 不存在")]
    UnknownAnswer(String),
}

/// 本地存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 读取失败
    #[error("读取 {path} 失败: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入失败
    #[error("写入 {path} 失败: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// TOML 序列化失败
    #[error("TOML序列化失败: {0}")]
    TomlSerializeFailed(#[from] toml::ser::Error),
}

/// 配置错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// 及格线超出 [0, 1]
    #[error("及格线 {0} 必须在 [0, 1] 之间")]
    ThresholdOutOfRange(f64),
    /// URL 不合法
    #[error("URL '{value}' 不合法: {reason}")]
    InvalidUrl { value: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建非法状态转换错误
    pub fn invalid_transition(action: &'static str, state: impl std::fmt::Display) -> Self {
        AppError::Workflow(WorkflowError::InvalidTransition {
            action,
            state: state.to_string(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
