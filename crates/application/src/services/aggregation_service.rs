use std::sync::Arc;

use chrono::FixedOffset;
use domain::{
    CounterStore, DayBucket, DomainError, EmojiUsage, ReactionName, ReactionRanking,
    ReactionTally, SlackUserId, UserRanking,
};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

use crate::{aggregate::WindowAggregate, clock::Clock, error::ApplicationError};

/// 同时进行的单日读取数
const CONCURRENT_DAY_READS: usize = 8;

/// 调用方想要的视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationView {
    TopReactions,
    TopUsers,
    ReactionsForUser(SlackUserId),
    UsersForEmoji(ReactionName),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "camelCase")]
pub enum ViewResult {
    TopReactions(Vec<ReactionRanking>),
    TopUsers(Vec<UserRanking>),
    ReactionsForUser {
        user: SlackUserId,
        reactions: Vec<ReactionTally>,
    },
    UsersForEmoji(EmojiUsage),
}

pub struct AggregationEngineDependencies {
    pub store: Arc<dyn CounterStore>,
    pub clock: Arc<dyn Clock>,
    /// 参考时区
    pub offset: FixedOffset,
}

/// 窗口聚合服务
///
/// 读取最近 N 个日桶（含今天）并合并。读取与写入之间不做协调，
/// 扫描期间提交的写入可能读不到。
pub struct AggregationEngine {
    deps: AggregationEngineDependencies,
}

impl AggregationEngine {
    pub fn new(deps: AggregationEngineDependencies) -> Self {
        Self { deps }
    }

    /// 窗口内的日桶，从今天往前
    pub fn window(&self, window_days: u32) -> Result<Vec<DayBucket>, ApplicationError> {
        if window_days == 0 {
            return Err(DomainError::invalid_query("windowDays", "must be at least 1").into());
        }
        let today = DayBucket::containing(self.deps.clock.now(), self.deps.offset);
        Ok((0..window_days)
            .filter_map(|i| today.days_before(i))
            .collect())
    }

    /// 读取窗口并合并，`emoji` 限定只读一个反应
    pub async fn aggregate(
        &self,
        window_days: u32,
        emoji: Option<&ReactionName>,
    ) -> Result<WindowAggregate, ApplicationError> {
        let days = self.window(window_days)?;
        let store = &self.deps.store;

        let aggregate = futures::stream::iter(days)
            .map(move |day| store.query_day(day, emoji.cloned()))
            .buffer_unordered(CONCURRENT_DAY_READS)
            .try_fold(WindowAggregate::default(), |mut acc, records| async move {
                acc.absorb_all(records);
                Ok(acc)
            })
            .await
            .map_err(|err| {
                tracing::error!(window_days, error = %err, "读取窗口失败");
                err
            })?;

        Ok(aggregate)
    }

    pub async fn run(
        &self,
        view: &AggregationView,
        window_days: u32,
    ) -> Result<ViewResult, ApplicationError> {
        let result = match view {
            AggregationView::TopReactions => {
                ViewResult::TopReactions(self.top_reactions(window_days).await?)
            }
            AggregationView::TopUsers => ViewResult::TopUsers(self.top_users(window_days).await?),
            AggregationView::ReactionsForUser(user) => ViewResult::ReactionsForUser {
                user: user.clone(),
                reactions: self.top_reactions_for_user(user, window_days).await?,
            },
            AggregationView::UsersForEmoji(emoji) => {
                ViewResult::UsersForEmoji(self.top_users_for_emoji(emoji, window_days).await?)
            }
        };
        tracing::info!(view = ?view, window_days, "聚合查询完成");
        Ok(result)
    }

    pub async fn top_reactions(
        &self,
        window_days: u32,
    ) -> Result<Vec<ReactionRanking>, ApplicationError> {
        Ok(self.aggregate(window_days, None).await?.top_reactions())
    }

    pub async fn top_users(&self, window_days: u32) -> Result<Vec<UserRanking>, ApplicationError> {
        Ok(self.aggregate(window_days, None).await?.top_users())
    }

    pub async fn top_reactions_for_user(
        &self,
        user: &SlackUserId,
        window_days: u32,
    ) -> Result<Vec<ReactionTally>, ApplicationError> {
        Ok(self
            .aggregate(window_days, None)
            .await?
            .top_reactions_for_user(user))
    }

    pub async fn top_users_for_emoji(
        &self,
        emoji: &ReactionName,
        window_days: u32,
    ) -> Result<EmojiUsage, ApplicationError> {
        Ok(self
            .aggregate(window_days, Some(emoji))
            .await?
            .users_for_emoji(emoji))
    }
}
