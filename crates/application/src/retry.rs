//! 存储往返的有界指数退避重试

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use domain::{
    AddOutcome, CounterStore, DailyReactionRecord, DayBucket, ReactionName, RemoveOutcome,
    SlackUserId, StoreError, StoreResult,
};
use tokio::time::sleep;

#[derive(Clone, Debug, PartialEq)]
pub enum Backoff {
    Exponential { base: Duration },
}

impl Backoff {
    pub fn exponential(base: Duration) -> Self {
        Backoff::Exponential { base }
    }

    fn delay_at(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Exponential { base } => {
                let exp = std::cmp::min(attempt.saturating_sub(1), 20);
                let factor = 1u32 << exp;
                base.saturating_mul(factor)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// 整个重试循环的截止时间
    pub deadline: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Backoff::exponential(Duration::from_millis(300)),
            deadline: None,
        }
    }
}

impl From<&config::RetrySettings> for RetryConfig {
    fn from(settings: &config::RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            backoff: Backoff::exponential(Duration::from_millis(settings.base_delay_ms)),
            deadline: settings.deadline_ms.map(Duration::from_millis),
        }
    }
}

/// 执行 `op`，对瞬时错误按退避重试；非瞬时错误立即返回。
pub async fn retry_async<F, Fut, T>(config: &RetryConfig, operation: &str, op: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let attempts = retry_loop(config, operation, op);
    match config.deadline {
        Some(deadline) => tokio::time::timeout(deadline, attempts)
            .await
            .map_err(|_| {
                tracing::error!(
                    operation,
                    deadline_ms = deadline.as_millis() as u64,
                    "存储操作超过截止时间"
                );
                StoreError::DeadlineExceeded {
                    operation: operation.to_string(),
                    deadline_ms: deadline.as_millis() as u64,
                }
            })?,
        None => attempts.await,
    }
}

async fn retry_loop<F, Fut, T>(config: &RetryConfig, operation: &str, mut op: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) if attempt >= config.max_attempts => {
                tracing::error!(operation, attempts = attempt, error = %e, "存储重试次数耗尽");
                return Err(StoreError::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                let delay = config.backoff.delay_at(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "存储暂时不可用，准备重试"
                );
                sleep(delay).await;
            }
        }
    }
}

/// 为任意计数存储的每次往返加上重试策略
pub struct RetryingCounterStore<S> {
    inner: S,
    config: RetryConfig,
}

impl<S> RetryingCounterStore<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CounterStore> CounterStore for RetryingCounterStore<S> {
    async fn record_add(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<AddOutcome> {
        let inner = &self.inner;
        retry_async(&self.config, "record_add", move || {
            inner.record_add(day, reaction, user)
        })
        .await
    }

    async fn record_remove(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<RemoveOutcome> {
        let inner = &self.inner;
        retry_async(&self.config, "record_remove", move || {
            inner.record_remove(day, reaction, user)
        })
        .await
    }

    async fn query_day(
        &self,
        day: DayBucket,
        reaction: Option<ReactionName>,
    ) -> StoreResult<Vec<DailyReactionRecord>> {
        let inner = &self.inner;
        retry_async(&self.config, "query_day", move || {
            inner.query_day(day, reaction.clone())
        })
        .await
    }
}
