//! 会话 URL - 基础设施层
//!
//! 页面 URL 就是会话的唯一持久位置：进度令牌、一次性模式、外部平台参数都挂在查询参数上

use crate::error::ConfigError;
use crate::models::AnnotationTask;
use url::Url;

pub const SCHEDULE_PARAM: &str = "annotation_schedule";
pub const ONESHOT_PARAM: &str = "oneshot";
pub const PROLIFIC_CODE_PARAM: &str = "prolific_code";
pub const PROLIFIC_REJECTION_CODE_PARAM: &str = "prolific_rejection_code";
pub const PROLIFIC_PID_PARAM: &str = "PROLIFIC_PID";
pub const OBJECT_CATEGORY_PARAM: &str = "object_category";
pub const OBJECT_ID_PARAM: &str = "object_id";
pub const GRASP_ID_PARAM: &str = "grasp_id";

/// 会话 URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUrl {
    url: Url,
}

impl SessionUrl {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        Url::parse(value)
            .map(|url| Self { url })
            .map_err(|e| ConfigError::InvalidUrl {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    fn param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    }

    /// 替换（或追加）一个查询参数，其余参数保持原顺序
    fn set_param(&mut self, key: &str, value: Option<&str>) {
        let mut pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let position = self.url.query_pairs().position(|(k, _)| k == key);
        if let Some(value) = value {
            let entry = (key.to_string(), value.to_string());
            match position {
                Some(index) if index <= pairs.len() => pairs.insert(index, entry),
                _ => pairs.push(entry),
            }
        }

        if pairs.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }

    /// 进度令牌；缺失或为空时返回 `None`
    pub fn schedule_token(&self) -> Option<String> {
        self.param(SCHEDULE_PARAM)
    }

    pub fn set_schedule_token(&mut self, token: &str) {
        self.set_param(SCHEDULE_PARAM, Some(token));
    }

    pub fn clear_schedule_token(&mut self) {
        self.set_param(SCHEDULE_PARAM, None);
    }

    /// 一次性会话：提交一次后结束
    pub fn is_oneshot(&self) -> bool {
        matches!(self.param(ONESHOT_PARAM).as_deref(), Some("true") | Some("1"))
    }

    pub fn prolific_code(&self) -> Option<String> {
        self.param(PROLIFIC_CODE_PARAM)
    }

    pub fn prolific_rejection_code(&self) -> Option<String> {
        self.param(PROLIFIC_REJECTION_CODE_PARAM)
    }

    /// 外部平台提供的标注员ID
    pub fn platform_reviewer_id(&self) -> Option<String> {
        self.param(PROLIFIC_PID_PARAM)
    }

    /// 直接指定任务的链接（三个参数必须同时存在）
    pub fn direct_task(&self) -> Option<AnnotationTask> {
        let category = self.param(OBJECT_CATEGORY_PARAM)?;
        let object_id = self.param(OBJECT_ID_PARAM)?;
        let grasp_id = self.param(GRASP_ID_PARAM)?.parse().ok()?;
        Some(AnnotationTask::new(category, object_id, grasp_id))
    }

    /// 为任务生成直接链接
    pub fn with_direct_task(&self, task: &AnnotationTask) -> Self {
        let mut next = self.clone();
        next.set_param(OBJECT_CATEGORY_PARAM, Some(&task.object_category));
        next.set_param(OBJECT_ID_PARAM, Some(&task.object_id));
        next.set_param(GRASP_ID_PARAM, Some(&task.grasp_id.to_string()));
        next
    }

    pub fn with_param(&self, key: &str, value: &str) -> Self {
        let mut next = self.clone();
        next.set_param(key, Some(value));
        next
    }
}

impl std::fmt::Display for SessionUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_recognized_parameters() {
        let url = SessionUrl::parse(
            "http://localhost:3000/?oneshot=true&prolific_code=ABC&prolific_rejection_code=REJ&PROLIFIC_PID=p1",
        )
        .unwrap();
        assert!(url.is_oneshot());
        assert_eq!(url.prolific_code().as_deref(), Some("ABC"));
        assert_eq!(url.prolific_rejection_code().as_deref(), Some("REJ"));
        assert_eq!(url.platform_reviewer_id().as_deref(), Some("p1"));
        assert_eq!(url.schedule_token(), None);
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let url = SessionUrl::parse("http://localhost:3000/?annotation_schedule=").unwrap();
        assert_eq!(url.schedule_token(), None);
        assert!(!url.is_oneshot());
    }

    #[test]
    fn token_replacement_keeps_other_parameters_in_place() {
        let mut url =
            SessionUrl::parse("http://localhost:3000/?a=1&annotation_schedule=old&b=2").unwrap();
        url.set_schedule_token("new");
        assert_eq!(url.as_str(), "http://localhost:3000/?a=1&annotation_schedule=new&b=2");

        url.clear_schedule_token();
        assert_eq!(url.as_str(), "http://localhost:3000/?a=1&b=2");
    }

    #[test]
    fn clearing_last_parameter_drops_query() {
        let mut url = SessionUrl::parse("http://localhost:3000/?annotation_schedule=x").unwrap();
        url.clear_schedule_token();
        assert_eq!(url.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn direct_task_requires_all_three_parameters() {
        let url = SessionUrl::parse("http://localhost:3000/?object_category=Mug&object_id=abc").unwrap();
        assert_eq!(url.direct_task(), None);

        let task = AnnotationTask::new("Mug", "abc", 5);
        let linked = url.with_direct_task(&task);
        assert_eq!(linked.direct_task(), Some(task));

        let bad = SessionUrl::parse(
            "http://localhost:3000/?object_category=Mug&object_id=abc&grasp_id=x",
        )
        .unwrap();
        assert_eq!(bad.direct_task(), None);
    }
}
