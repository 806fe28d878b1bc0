//! 任务来源 - 业务能力层
//!
//! 交互模式逐个向后端要任务；批量模式在预先生成的进度表上移动游标

use crate::error::FetchError;
use crate::infrastructure::AnnotationBackend;
use crate::models::{AnnotationTask, Schedule};
use std::sync::Arc;
use tracing::debug;

/// 取下一个任务的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextTask {
    Task(AnnotationTask),
    /// 没有剩余任务
    Exhausted,
}

/// 任务来源，会话开始时确定一次
pub enum TaskSource<B> {
    Interactive(Arc<B>),
    Batch(Schedule),
}

impl<B: AnnotationBackend> TaskSource<B> {
    pub fn is_batch(&self) -> bool {
        matches!(self, TaskSource::Batch(_))
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            TaskSource::Batch(schedule) => Some(schedule),
            TaskSource::Interactive(_) => None,
        }
    }

    /// 批量模式下游标当前指向的任务，无需网络请求
    pub fn current_task(&self) -> Option<&AnnotationTask> {
        self.schedule().map(Schedule::current)
    }

    /// 下一个任务
    ///
    /// 批量模式先前移游标再返回 `tasks[cursor]`；游标已在末尾时返回 `Exhausted`
    pub async fn next_task(&mut self) -> Result<NextTask, FetchError> {
        match self {
            TaskSource::Interactive(backend) => {
                let next = backend.fetch_next_task().await?;
                Ok(next.map(NextTask::Task).unwrap_or(NextTask::Exhausted))
            }
            TaskSource::Batch(schedule) => match schedule.advanced() {
                Some(next) => {
                    debug!("游标前进: {} -> {}", schedule.cursor(), next.cursor());
                    *schedule = next;
                    Ok(NextTask::Task(schedule.current().clone()))
                }
                None => Ok(NextTask::Exhausted),
            },
        }
    }

    /// 进度展示用的当前序号；交互模式没有整体进度，固定为 0
    pub fn current_index(&self) -> usize {
        self.schedule().map(Schedule::cursor).unwrap_or(0)
    }

    /// 进度展示用的总数；交互模式固定为 1
    pub fn total_count(&self) -> usize {
        self.schedule().map(Schedule::len).unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmissionError;
    use crate::models::{AnnotationRecord, MeshSource};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct QueueBackend {
        tasks: Mutex<Vec<AnnotationTask>>,
    }

    #[async_trait]
    impl AnnotationBackend for QueueBackend {
        async fn fetch_next_task(&self) -> Result<Option<AnnotationTask>, FetchError> {
            Ok(self.tasks.lock().unwrap().pop())
        }

        async fn fetch_mesh(&self, _task: &AnnotationTask) -> Result<MeshSource, FetchError> {
            Ok(MeshSource::Asset {
                url: "mesh.glb".to_string(),
            })
        }

        async fn submit_annotation(&self, _record: &AnnotationRecord) -> Result<(), SubmissionError> {
            Ok(())
        }
    }

    fn task(grasp_id: u64) -> AnnotationTask {
        AnnotationTask::new("Mug", "m1", grasp_id)
    }

    #[test]
    fn batch_advances_then_exhausts() {
        let schedule = Schedule::new(vec![task(0), task(1)]).unwrap();
        let mut source: TaskSource<QueueBackend> = TaskSource::Batch(schedule);

        assert_eq!(source.current_task(), Some(&task(0)));
        assert_eq!((source.current_index(), source.total_count()), (0, 2));

        let next = tokio_test::block_on(source.next_task()).unwrap();
        assert_eq!(next, NextTask::Task(task(1)));
        assert_eq!(source.current_index(), 1);

        let next = tokio_test::block_on(source.next_task()).unwrap();
        assert_eq!(next, NextTask::Exhausted);
        // 耗尽后游标停在最后一个任务
        assert_eq!(source.current_index(), 1);
    }

    #[test]
    fn interactive_reports_fixed_progress_and_exhaustion() {
        let backend = Arc::new(QueueBackend {
            tasks: Mutex::new(vec![task(9)]),
        });
        let mut source = TaskSource::Interactive(backend);
        assert_eq!((source.current_index(), source.total_count()), (0, 1));
        assert_eq!(source.current_task(), None);

        let next = tokio_test::block_on(source.next_task()).unwrap();
        assert_eq!(next, NextTask::Task(task(9)));
        let next = tokio_test::block_on(source.next_task()).unwrap();
        assert_eq!(next, NextTask::Exhausted);
    }
}
