//! 聚合视图的结果记录

use serde::{Deserialize, Serialize};

use crate::value_objects::{ReactionName, SlackUserId};

/// 热门反应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRanking {
    pub reaction: ReactionName,
    pub count: i64,
    pub distinct_user_count: usize,
}

/// 某个反应的计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionTally {
    pub reaction: ReactionName,
    pub count: i64,
}

/// 某个用户的计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTally {
    pub user_id: SlackUserId,
    pub count: i64,
}

/// 热门用户，附带该用户自己最常用的反应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRanking {
    pub user_id: SlackUserId,
    pub count: i64,
    pub reactions: Vec<ReactionTally>,
}

/// 单个反应在窗口内的使用情况
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmojiUsage {
    pub reaction: ReactionName,
    pub total: i64,
    pub users: Vec<UserTally>,
}
