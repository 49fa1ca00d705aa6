use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{DayBucket, ReactionName, SlackUserId};

/// 单日单反应的计数记录，标识为 (day, reaction)。
///
/// `count` 理论上等于 `user_counts` 之和，但移除事件先于添加事件到达时
/// 两者可能暂时不一致；单个用户的计数永远不会小于零。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReactionRecord {
    pub day: DayBucket,
    pub reaction: ReactionName,
    pub count: i64,
    pub user_counts: BTreeMap<SlackUserId, i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DailyReactionRecord {
    /// 首次添加时创建的记录
    pub fn first(day: DayBucket, reaction: ReactionName, user: SlackUserId) -> Self {
        let mut user_counts = BTreeMap::new();
        user_counts.insert(user, 1);
        Self {
            day,
            reaction,
            count: 1,
            user_counts,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn user_count(&self, user: &SlackUserId) -> i64 {
        self.user_counts.get(user).copied().unwrap_or(0)
    }

    /// 各用户贡献之和
    pub fn user_total(&self) -> i64 {
        self.user_counts.values().sum()
    }
}
