//! 计数存储接口
//!
//! 所有变更都必须由存储端以条件/原子指令完成，实现不得在客户端
//! 先读后写。同一个键上的并发竞争完全交给存储端的条件写来裁决。

use async_trait::async_trait;

use crate::entities::DailyReactionRecord;
use crate::errors::StoreResult;
use crate::value_objects::{DayBucket, ReactionName, SlackUserId};

/// 单日单次读取的记录上限，超出部分不会被读取
pub const DAY_PAGE_SIZE: usize = 1000;

/// `record_add` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// 本次调用创建了记录
    Created,
    /// 记录已存在（可能刚被并发创建），本次调用做了递增
    Incremented,
}

/// `record_remove` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// 条件成立，计数已递减
    Decremented,
    /// 记录不存在或该用户计数不为正，未做任何修改
    Absorbed,
}

/// 按 (日桶, 反应) 分区的计数存储
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// 记录一次添加：不存在则以 count=1 创建，否则原子递增总数和该用户计数
    async fn record_add(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<AddOutcome>;

    /// 记录一次移除：仅当记录存在且该用户计数大于零时原子递减
    async fn record_remove(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<RemoveOutcome>;

    /// 读取某天的全部记录，可只取一个反应；最多返回 [`DAY_PAGE_SIZE`] 条
    async fn query_day(
        &self,
        day: DayBucket,
        reaction: Option<ReactionName>,
    ) -> StoreResult<Vec<DailyReactionRecord>>;
}
