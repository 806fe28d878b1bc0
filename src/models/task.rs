use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 一个待标注的 物体 + 抓取 组合
///
/// 由后端分配（交互模式）或嵌入在预先生成的进度表中（批量模式），创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationTask {
    pub object_category: String,
    pub object_id: String,
    pub grasp_id: u64,
}

impl AnnotationTask {
    pub fn new(object_category: impl Into<String>, object_id: impl Into<String>, grasp_id: u64) -> Self {
        Self {
            object_category: object_category.into(),
            object_id: object_id.into(),
            grasp_id,
        }
    }
}

impl Display for AnnotationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[类别 {} 物体#{} 抓取#{}]",
            self.object_category, self.object_id, self.grasp_id
        )
    }
}

/// 提交给后端的标注记录
///
/// 只在一次提交期间存在，不做本地持久化
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRecord {
    #[serde(flatten)]
    pub task: AnnotationTask,
    pub description: String,
    pub is_mesh_malformed: bool,
    pub is_grasp_invalid: bool,
    pub user_id: String,
    /// 从任务展示到提交的耗时（秒）
    pub time_taken: f64,
}
