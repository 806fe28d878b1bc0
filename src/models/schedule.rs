//! 批量标注进度表
//!
//! 有序任务列表 + 游标。游标只能通过 [`Schedule::advanced`] 前进，
//! 每次前进产生一个新的进度表值

use crate::models::task::AnnotationTask;
use serde::{Deserialize, Serialize};

/// 进度表
///
/// 不变量：`tasks` 非空且 `cursor < tasks.len()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule")]
pub struct Schedule {
    cursor: usize,
    tasks: Vec<AnnotationTask>,
}

#[derive(Deserialize)]
struct RawSchedule {
    cursor: usize,
    tasks: Vec<AnnotationTask>,
}

impl TryFrom<RawSchedule> for Schedule {
    type Error = String;

    fn try_from(raw: RawSchedule) -> Result<Self, Self::Error> {
        if raw.tasks.is_empty() {
            return Err("任务列表为空".to_string());
        }
        if raw.cursor >= raw.tasks.len() {
            return Err(format!(
                "游标 {} 超出范围 [0, {})",
                raw.cursor,
                raw.tasks.len()
            ));
        }
        Ok(Self {
            cursor: raw.cursor,
            tasks: raw.tasks,
        })
    }
}

impl Schedule {
    /// 从任务列表创建进度表，游标位于第一个任务；列表为空时返回 `None`
    pub fn new(tasks: Vec<AnnotationTask>) -> Option<Self> {
        Self::with_cursor(0, tasks)
    }

    /// 指定游标创建进度表，违反不变量时返回 `None`
    pub fn with_cursor(cursor: usize, tasks: Vec<AnnotationTask>) -> Option<Self> {
        Self::try_from(RawSchedule { cursor, tasks }).ok()
    }

    /// 只包含一个任务的进度表
    pub fn single(task: AnnotationTask) -> Self {
        Self {
            cursor: 0,
            tasks: vec![task],
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// 进度表至少含一个任务，恒为 false
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[AnnotationTask] {
        &self.tasks
    }

    /// 游标指向的任务
    pub fn current(&self) -> &AnnotationTask {
        &self.tasks[self.cursor]
    }

    /// 游标是否已在最后一个任务
    pub fn is_last(&self) -> bool {
        self.cursor + 1 == self.tasks.len()
    }

    /// 游标前进一位后的新进度表；已在最后一个任务时返回 `None`
    pub fn advanced(&self) -> Option<Self> {
        if self.is_last() {
            return None;
        }
        Some(Self {
            cursor: self.cursor + 1,
            tasks: self.tasks.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(n: u64) -> Vec<AnnotationTask> {
        (0..n).map(|i| AnnotationTask::new("Mug", "m1", i)).collect()
    }

    #[test]
    fn empty_task_list_is_rejected() {
        assert!(Schedule::new(Vec::new()).is_none());
        let single = Schedule::single(AnnotationTask::new("Mug", "m1", 0));
        assert_eq!(single.len(), 1);
        assert!(!single.is_empty());
    }

    #[test]
    fn cursor_out_of_bounds_is_rejected() {
        assert!(Schedule::with_cursor(3, tasks(3)).is_none());
        assert!(Schedule::with_cursor(2, tasks(3)).is_some());
    }

    #[test]
    fn advance_stops_at_last_task() {
        let schedule = Schedule::new(tasks(2)).unwrap();
        let next = schedule.advanced().unwrap();
        assert_eq!(next.cursor(), 1);
        assert_eq!(next.current().grasp_id, 1);
        assert!(next.is_last());
        assert!(next.advanced().is_none());
        // 原值不变
        assert_eq!(schedule.cursor(), 0);
    }
}
