//! 标注提交服务 - 业务能力层
//!
//! 只负责"提交一次"能力：单次请求，不自动重试，是否重试由调用方决定

use crate::error::SubmissionError;
use crate::infrastructure::AnnotationBackend;
use crate::models::AnnotationRecord;
use std::sync::Arc;
use tracing::{info, warn};

pub struct SubmissionClient<B> {
    backend: Arc<B>,
}

impl<B: AnnotationBackend> SubmissionClient<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn submit(&self, record: &AnnotationRecord) -> Result<(), SubmissionError> {
        info!(
            "📤 提交标注 {} (耗时 {:.1}s)",
            record.task, record.time_taken
        );

        match self.backend.submit_annotation(record).await {
            Ok(()) => {
                info!("✓ 标注提交成功 {}", record.task);
                Ok(())
            }
            Err(e) => {
                warn!("⚠️ 标注提交失败 {}: {}", record.task, e);
                Err(e)
            }
        }
    }
}
