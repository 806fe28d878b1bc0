//! 标注链接生成
//!
//! 单任务模式：每个抓取一条直接链接，带外部平台完成码或 `oneshot=true`
//! 进度表模式：所有任务打乱后编码进一条链接

use crate::infrastructure::session_url::{ONESHOT_PARAM, PROLIFIC_CODE_PARAM};
use crate::infrastructure::SessionUrl;
use crate::models::{AnnotationTask, Schedule, TaskSkeleton};
use crate::services::ScheduleCodec;
use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    PerTask,
    Schedule,
}

/// 按类别展开骨架中的任务
fn collect_tasks(skeleton: &TaskSkeleton, categories: &[String]) -> Result<Vec<AnnotationTask>> {
    let mut tasks = Vec::new();
    for category in categories {
        let Some(objects) = skeleton.get(category) else {
            anyhow::bail!("任务骨架中没有类别: {}", category);
        };
        for (object_id, grasps) in objects {
            tasks.extend(
                grasps
                    .iter()
                    .map(|&grasp_id| AnnotationTask::new(category.as_str(), object_id.as_str(), grasp_id)),
            );
        }
    }
    Ok(tasks)
}

/// 生成标注链接
pub fn generate_links<R: Rng + ?Sized>(
    skeleton: &TaskSkeleton,
    categories: &[String],
    base: &SessionUrl,
    mode: LinkMode,
    prolific_code: Option<&str>,
    rng: &mut R,
) -> Result<Vec<String>> {
    let mut tasks = collect_tasks(skeleton, categories)?;
    tasks.shuffle(rng);

    let base = match prolific_code {
        Some(code) => base.with_param(PROLIFIC_CODE_PARAM, code),
        None => base.clone(),
    };

    let links = match mode {
        LinkMode::PerTask => {
            let base = if prolific_code.is_none() {
                base.with_param(ONESHOT_PARAM, "true")
            } else {
                base
            };
            tasks
                .iter()
                .map(|task| base.with_direct_task(task).to_string())
                .collect()
        }
        LinkMode::Schedule => match Schedule::new(tasks) {
            Some(schedule) => {
                let mut url = base;
                url.set_schedule_token(&ScheduleCodec::encode(&schedule));
                vec![url.to_string()]
            }
            None => Vec::new(),
        },
    };

    info!("✓ 生成 {} 条链接 ({:?})", links.len(), mode);
    Ok(links)
}
