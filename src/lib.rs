//! # Grasp Annotate
//!
//! 抓取描述标注工具：标注员看到一个物体和一个抓取位姿，写下描述并标记两个质量问题
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源，只暴露能力
//! - `HttpBackend` - 任务分配、网格、提交三个接口
//! - `LocalStore` - 标注员ID、测验标记、可恢复的会话地址
//! - `SessionUrl` - 会话地址上的查询参数
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，无流程状态
//! - `GeometryBuilder` - 缓冲区 → 几何体
//! - `ScheduleCodec` - 进度表 ↔ URL 安全令牌
//! - `TaskSource` - 交互 / 批量两种任务来源
//! - `QuizGate` - 测验关卡
//! - `SubmissionClient` - 单次提交
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - `WorkflowController` 状态机与表单校验
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 终端标注会话
//! - `orchestrator/link_generator` - 标注链接生成
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{AnnotationBackend, HttpBackend, LocalStore, SessionUrl};
pub use models::{AnnotationRecord, AnnotationTask, MeshPayload, MeshSource, Schedule};
pub use orchestrator::App;
pub use services::{GeometryBuilder, QuizGate, ScheduleCodec, TaskSource};
pub use workflow::{AnnotationForm, WorkflowController, WorkflowState};
