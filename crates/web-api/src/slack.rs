//! Slack Events API 载荷
//!
//! 只解析计数需要的字段，其余字段忽略。

use domain::{DomainError, ReactionEvent, ReactionKind};
use serde::Deserialize;

/// webhook 顶层信封
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEnvelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event: SlackEvent,
    },
    #[serde(other)]
    Unsupported,
}

/// `event_callback` 中的内部事件，按 `type` 分派；只有反应事件解析字段
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEvent {
    ReactionAdded(ReactionPayload),
    ReactionRemoved(ReactionPayload),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct ReactionPayload {
    #[serde(default)]
    pub reaction: String,
    #[serde(default)]
    pub user: String,
    /// 秒级时间戳，Slack 以字符串形式发送，如 "1714557600.000200"
    #[serde(default)]
    pub event_ts: String,
}

impl ReactionPayload {
    fn to_reaction_event(&self, kind: ReactionKind) -> Result<ReactionEvent, DomainError> {
        let timestamp_seconds = self.event_ts.trim().parse::<f64>().map_err(|_| {
            DomainError::invalid_event("timestamp", format!("not a number: {:?}", self.event_ts))
        })?;

        Ok(ReactionEvent {
            kind,
            timestamp_seconds,
            reaction_name: self.reaction.clone(),
            user_id: self.user.clone(),
        })
    }
}

impl SlackEvent {
    /// 转换为反应事件；非反应类事件返回 `None`
    pub fn to_reaction_event(&self) -> Option<Result<ReactionEvent, DomainError>> {
        match self {
            SlackEvent::ReactionAdded(payload) => {
                Some(payload.to_reaction_event(ReactionKind::Added))
            }
            SlackEvent::ReactionRemoved(payload) => {
                Some(payload.to_reaction_event(ReactionKind::Removed))
            }
            SlackEvent::Other => None,
        }
    }
}
