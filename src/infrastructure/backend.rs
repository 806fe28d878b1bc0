//! 后端能力抽象 - 基础设施层

use crate::error::{FetchError, SubmissionError};
use crate::models::{AnnotationRecord, AnnotationTask, MeshSource};
use async_trait::async_trait;

/// 标注后端
///
/// 职责：
/// - 分配下一个任务（`None` 表示没有剩余任务）
/// - 提供任务的网格数据
/// - 接收标注记录，每次调用恰好一次写请求
#[async_trait]
pub trait AnnotationBackend: Send + Sync {
    async fn fetch_next_task(&self) -> Result<Option<AnnotationTask>, FetchError>;

    async fn fetch_mesh(&self, task: &AnnotationTask) -> Result<MeshSource, FetchError>;

    async fn submit_annotation(&self, record: &AnnotationRecord) -> Result<(), SubmissionError>;
}
