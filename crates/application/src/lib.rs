//! 应用层实现。
//!
//! 事件摄取与窗口聚合两个用例服务，以及围绕计数存储的重试策略和内存实现。

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod memory_store;
pub mod retry;
pub mod services;

pub use aggregate::{ReactionTotals, WindowAggregate};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::ApplicationError;
pub use memory_store::InMemoryCounterStore;
pub use retry::{retry_async, Backoff, RetryConfig, RetryingCounterStore};
pub use services::{
    AggregationEngine, AggregationEngineDependencies, AggregationView, EventIngestor,
    EventIngestorDependencies, IngestOutcome, ViewResult,
};
