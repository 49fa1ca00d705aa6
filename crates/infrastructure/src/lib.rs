//! 基础设施层实现。
//!
//! 提供基于 Redis 的计数存储，实现领域层定义的 `CounterStore` 接口。

pub mod redis;

pub use self::redis::{map_redis_err, RedisCounterStore};

use std::sync::Arc;

/// 按配置创建 Redis 客户端和计数存储
///
/// 只解析地址，不建立连接；每次存储往返各自获取多路复用连接。
pub fn create_redis_counter_store(
    config: &config::AppConfig,
) -> Result<RedisCounterStore, domain::StoreError> {
    let client = ::redis::Client::open(config.redis.url.as_str())
        .map_err(|e| domain::StoreError::backend(format!("invalid Redis URL: {e}")))?;
    Ok(RedisCounterStore::from_config(
        Arc::new(client),
        &config.redis,
        &config.store,
    ))
}
