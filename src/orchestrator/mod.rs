//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session` - 终端标注会话
//! - 持有本地存储、HTTP 后端和流程控制器
//! - 展示测验与任务，收集表单
//! - 每次状态转换后记录可恢复的会话 URL
//!
//! ### `link_generator` - 标注链接生成
//! - 从任务骨架生成单任务链接或一条批量进度表链接
//!
//! ## 层次关系
//!
//! ```text
//! session (终端交互)
//!     ↓
//! workflow::WorkflowController (状态机)
//!     ↓
//! services (能力层：task source / quiz / codec / geometry / submission)
//!     ↓
//! infrastructure (基础设施：HTTP 后端、本地存储、会话 URL)
//! ```

pub mod link_generator;
pub mod session;

pub use link_generator::{generate_links, LinkMode};
pub use session::App;
