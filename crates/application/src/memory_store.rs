//! 内存计数存储
//!
//! 互斥锁在这里扮演存储服务端的角色：每个临界区对应一次服务端原子指令。
//! 添加操作仍拆成"条件创建"和"递增"两次往返，创建竞争的回退路径会被真实地走到。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use domain::{
    AddOutcome, CounterStore, DailyReactionRecord, DayBucket, ReactionName, RemoveOutcome,
    SlackUserId, StoreError, StoreResult, DAY_PAGE_SIZE,
};

type RecordKey = (DayBucket, ReactionName);

pub struct InMemoryCounterStore {
    records: Mutex<BTreeMap<RecordKey, DailyReactionRecord>>,
    page_size: usize,
    /// 接下来若干次调用直接返回瞬时错误
    injected_failures: AtomicU32,
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::with_page_size(DAY_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            page_size,
            injected_failures: AtomicU32::new(0),
        }
    }

    /// 让接下来的 `count` 次调用返回 `StoreError::Unavailable`
    pub fn fail_next(&self, count: u32) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    /// 读取单条记录（测试断言用）
    pub fn get(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
    ) -> StoreResult<Option<DailyReactionRecord>> {
        Ok(self.lock()?.get(&(day, reaction.clone())).cloned())
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn check_injected_failure(&self) -> StoreResult<()> {
        let injected = self
            .injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match injected {
            Ok(_) => Err(StoreError::unavailable("injected failure")),
            Err(_) => Ok(()),
        }
    }

    fn lock(
        &self,
    ) -> StoreResult<std::sync::MutexGuard<'_, BTreeMap<RecordKey, DailyReactionRecord>>> {
        self.records
            .lock()
            .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
    }

    /// 条件创建：仅当记录不存在时写入
    fn create_if_absent(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<bool> {
        let mut records = self.lock()?;
        let key = (day, reaction.clone());
        if records.contains_key(&key) {
            return Ok(false);
        }
        records.insert(
            key,
            DailyReactionRecord::first(day, reaction.clone(), user.clone()),
        );
        Ok(true)
    }

    fn increment(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<()> {
        let mut records = self.lock()?;
        let record = records
            .entry((day, reaction.clone()))
            .or_insert_with(|| DailyReactionRecord {
                day,
                reaction: reaction.clone(),
                count: 0,
                user_counts: BTreeMap::new(),
                updated_at: None,
            });
        record.count += 1;
        *record.user_counts.entry(user.clone()).or_insert(0) += 1;
        record.updated_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn record_add(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<AddOutcome> {
        self.check_injected_failure()?;
        if self.create_if_absent(day, reaction, user)? {
            return Ok(AddOutcome::Created);
        }
        // 两次往返之间让出执行权，模拟网络间隙
        tokio::task::yield_now().await;
        self.increment(day, reaction, user)?;
        Ok(AddOutcome::Incremented)
    }

    async fn record_remove(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<RemoveOutcome> {
        self.check_injected_failure()?;
        let mut records = self.lock()?;
        let Some(record) = records.get_mut(&(day, reaction.clone())) else {
            return Ok(RemoveOutcome::Absorbed);
        };
        match record.user_counts.get_mut(user) {
            Some(count) if *count > 0 => {
                *count -= 1;
                record.count -= 1;
                record.updated_at = Some(Utc::now());
                Ok(RemoveOutcome::Decremented)
            }
            _ => Ok(RemoveOutcome::Absorbed),
        }
    }

    async fn query_day(
        &self,
        day: DayBucket,
        reaction: Option<ReactionName>,
    ) -> StoreResult<Vec<DailyReactionRecord>> {
        self.check_injected_failure()?;
        let records = self.lock()?;
        let found: Vec<DailyReactionRecord> = match reaction {
            Some(reaction) => records.get(&(day, reaction)).cloned().into_iter().collect(),
            None => records
                .iter()
                .filter(|((d, _), _)| *d == day)
                .take(self.page_size)
                .map(|(_, record)| record.clone())
                .collect(),
        };
        Ok(found)
    }
}
