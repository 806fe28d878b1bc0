//! 进度令牌编解码 - 业务能力层
//!
//! JSON 序列化后做 URL 安全的 base64 编码（无填充），令牌可直接放进查询参数

use crate::error::TokenError;
use crate::models::Schedule;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

pub struct ScheduleCodec;

impl ScheduleCodec {
    pub fn encode(schedule: &Schedule) -> String {
        // Schedule 只包含字符串和整数，序列化不会失败
        let json = serde_json::to_vec(schedule).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Schedule, TokenError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| TokenError::InvalidToken(format!("base64 解码失败: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TokenError::InvalidToken(format!("结构不合法: {}", e)))
    }

    /// 缺失或为空的令牌表示"没有进行中的进度表"，不是错误
    pub fn decode_optional(token: Option<&str>) -> Result<Option<Schedule>, TokenError> {
        match token.map(str::trim) {
            None | Some("") => Ok(None),
            Some(token) => Self::decode(token).map(Some),
        }
    }
}
