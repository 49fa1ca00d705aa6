//! Repository接口定义
//!
//! 内层定义接口，外层（内存实现、Redis 实现）实现接口。

pub mod counter_store;

pub use counter_store::{AddOutcome, CounterStore, RemoveOutcome, DAY_PAGE_SIZE};

#[cfg(feature = "testing")]
pub use counter_store::MockCounterStore;
