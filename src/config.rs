use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端服务地址
    pub api_base_url: String,
    /// 标注页面地址（新会话的起始 URL，也用于生成链接）
    pub app_base_url: String,
    /// 测验及格线（答对比例）
    pub pass_threshold: f64,
    /// 外部平台完成 / 拒绝跳转地址
    pub completion_url_base: String,
    /// 感谢页面展示时长（秒）
    pub thank_you_delay_secs: u64,
    /// 本地持久化状态文件
    pub state_file: PathBuf,
    /// 自定义测验文件（可选）
    pub quiz_file: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            app_base_url: "http://localhost:3000/".to_string(),
            pass_threshold: 0.5,
            completion_url_base: "https://app.prolific.com/submissions/complete".to_string(),
            thank_you_delay_secs: 3,
            state_file: PathBuf::from(".grasp_annotate_state.toml"),
            quiz_file: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            app_base_url: std::env::var("APP_BASE_URL").unwrap_or(default.app_base_url),
            pass_threshold: std::env::var("PASS_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.pass_threshold),
            completion_url_base: std::env::var("COMPLETION_URL_BASE").unwrap_or(default.completion_url_base),
            thank_you_delay_secs: std::env::var("THANK_YOU_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.thank_you_delay_secs),
            state_file: std::env::var("STATE_FILE").map(PathBuf::from).unwrap_or(default.state_file),
            quiz_file: std::env::var("QUIZ_FILE").ok().map(PathBuf::from).or(default.quiz_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.pass_threshold) || self.pass_threshold.is_nan() {
            return Err(ConfigError::ThresholdOutOfRange(self.pass_threshold));
        }
        for value in [&self.api_base_url, &self.app_base_url, &self.completion_url_base] {
            Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
                value: value.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn thank_you_delay(&self) -> Duration {
        Duration::from_secs(self.thank_you_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_threshold_above_one() {
        let config = Config {
            pass_threshold: 1.5,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ThresholdOutOfRange(1.5)));
    }

    #[test]
    fn rejects_bad_base_url() {
        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));
    }
}
