//! 本地持久化存储 - 基础设施层
//!
//! 相当于浏览器的 cookie / localStorage：标注员ID、测验是否已通过、可恢复的会话 URL

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredState {
    reviewer_id: String,
    #[serde(default)]
    quiz_seen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resume_url: Option<String>,
}

/// 本地存储
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    state: StoredState,
}

impl LocalStore {
    /// 加载存储文件；文件不存在时生成新的标注员ID并写入
    pub fn load_or_init(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let display = path.display().to_string();

        let state = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str::<StoredState>(&content).map_err(|source| {
                StorageError::TomlParseFailed {
                    path: display.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredState::default(),
            Err(source) => {
                return Err(StorageError::ReadFailed {
                    path: display,
                    source,
                })
            }
        };

        let mut store = Self { path, state };
        if store.state.reviewer_id.is_empty() {
            store.state.reviewer_id = uuid::Uuid::new_v4().to_string();
            info!("🆔 生成新的标注员ID: {}", store.state.reviewer_id);
            store.save()?;
        }
        Ok(store)
    }

    fn save(&self) -> Result<(), StorageError> {
        let content = toml::to_string(&self.state)?;
        std::fs::write(&self.path, content).map_err(|source| StorageError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        })?;
        debug!("已保存本地状态: {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reviewer_id(&self) -> &str {
        &self.state.reviewer_id
    }

    pub fn quiz_seen(&self) -> bool {
        self.state.quiz_seen
    }

    pub fn mark_quiz_seen(&mut self) -> Result<(), StorageError> {
        if self.state.quiz_seen {
            return Ok(());
        }
        self.state.quiz_seen = true;
        self.save()
    }

    pub fn resume_url(&self) -> Option<&str> {
        self.state.resume_url.as_deref()
    }

    /// 记录（或清除）可恢复的会话 URL
    pub fn set_resume_url(&mut self, url: Option<&str>) -> Result<(), StorageError> {
        let next = url.map(str::to_string);
        if self.state.resume_url == next {
            return Ok(());
        }
        self.state.resume_url = next;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_reviewer_id_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");

        let first = LocalStore::load_or_init(&path).unwrap();
        assert!(!first.reviewer_id().is_empty());
        assert!(!first.quiz_seen());

        let second = LocalStore::load_or_init(&path).unwrap();
        assert_eq!(first.reviewer_id(), second.reviewer_id());
    }

    #[test]
    fn persists_flags_and_resume_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");

        let mut store = LocalStore::load_or_init(&path).unwrap();
        store.mark_quiz_seen().unwrap();
        store
            .set_resume_url(Some("http://localhost:3000/?annotation_schedule=abc"))
            .unwrap();

        let reloaded = LocalStore::load_or_init(&path).unwrap();
        assert!(reloaded.quiz_seen());
        assert_eq!(
            reloaded.resume_url(),
            Some("http://localhost:3000/?annotation_schedule=abc")
        );

        store.set_resume_url(None).unwrap();
        assert_eq!(LocalStore::load_or_init(&path).unwrap().resume_url(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");
        std::fs::write(&path, "reviewer_id = [").unwrap();
        assert!(matches!(
            LocalStore::load_or_init(&path),
            Err(StorageError::TomlParseFailed { .. })
        ));
    }
}
