//! 标注表单
//!
//! 提交前在本地校验，校验失败不会发出任何网络请求

use crate::error::ValidationError;
use crate::models::AnnotationTask;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationForm {
    pub object_category: Option<String>,
    pub object_id: Option<String>,
    pub grasp_id: Option<u64>,
    pub description: String,
    pub is_mesh_malformed: bool,
    pub is_grasp_invalid: bool,
}

impl AnnotationForm {
    /// 为当前任务创建表单，任务字段已填好
    pub fn for_task(task: &AnnotationTask) -> Self {
        Self {
            object_category: Some(task.object_category.clone()),
            object_id: Some(task.object_id.clone()),
            grasp_id: Some(task.grasp_id),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_flags(mut self, is_mesh_malformed: bool, is_grasp_invalid: bool) -> Self {
        self.is_mesh_malformed = is_mesh_malformed;
        self.is_grasp_invalid = is_grasp_invalid;
        self
    }

    /// 校验必填字段，返回任务与去掉首尾空白的描述
    pub fn validate(&self) -> Result<(AnnotationTask, String), ValidationError> {
        let category = self
            .object_category
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or(ValidationError::MissingField("object_category"))?;
        let object_id = self
            .object_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or(ValidationError::MissingField("object_id"))?;
        let grasp_id = self.grasp_id.ok_or(ValidationError::MissingField("grasp_id"))?;

        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        Ok((
            AnnotationTask::new(category, object_id, grasp_id),
            description.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_task_fields_and_description() {
        assert_eq!(
            AnnotationForm::default().validate(),
            Err(ValidationError::MissingField("object_category"))
        );

        let task = AnnotationTask::new("Mug", "abc", 2);
        let form = AnnotationForm::for_task(&task);
        assert_eq!(form.validate(), Err(ValidationError::EmptyDescription));
        assert_eq!(
            form.clone().with_description("   ").validate(),
            Err(ValidationError::EmptyDescription)
        );

        let (validated, description) = form
            .with_description("  The grasp is on the handle. ")
            .validate()
            .unwrap();
        assert_eq!(validated, task);
        assert_eq!(description, "The grasp is on the handle.");
    }

    #[test]
    fn missing_grasp_id_is_reported() {
        let form = AnnotationForm {
            object_category: Some("Mug".to_string()),
            object_id: Some("abc".to_string()),
            description: "text".to_string(),
            ..AnnotationForm::default()
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingField("grasp_id")));
    }
}
