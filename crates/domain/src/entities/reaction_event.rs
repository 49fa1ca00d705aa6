use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::errors::DomainResult;
use crate::value_objects::{DayBucket, ReactionName, SlackUserId};

/// 反应事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Added,
    Removed,
}

/// 入站反应事件（已从 webhook 载荷中剥离，但尚未校验）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionEvent {
    pub kind: ReactionKind,
    pub timestamp_seconds: f64,
    pub reaction_name: String,
    pub user_id: String,
}

impl ReactionEvent {
    pub fn added(
        timestamp_seconds: f64,
        reaction_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: ReactionKind::Added,
            timestamp_seconds,
            reaction_name: reaction_name.into(),
            user_id: user_id.into(),
        }
    }

    pub fn removed(
        timestamp_seconds: f64,
        reaction_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: ReactionKind::Removed,
            timestamp_seconds,
            reaction_name: reaction_name.into(),
            user_id: user_id.into(),
        }
    }

    /// 校验并归一化为 (日桶, 反应, 用户, 方向)
    pub fn normalize(&self, offset: FixedOffset) -> DomainResult<CounterDelta> {
        let reaction = ReactionName::parse(self.reaction_name.as_str())?;
        let user = SlackUserId::parse(self.user_id.as_str())?;
        let day = DayBucket::from_timestamp(self.timestamp_seconds, offset)?;
        Ok(CounterDelta {
            day,
            reaction,
            user,
            kind: self.kind,
        })
    }
}

/// 归一化后的计数变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDelta {
    pub day: DayBucket,
    pub reaction: ReactionName,
    pub user: SlackUserId,
    pub kind: ReactionKind,
}
