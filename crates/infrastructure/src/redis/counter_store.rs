//! Redis 计数存储
//!
//! 数据布局（`{day}` 作为 hash tag，同一天的键落在同一个 slot）：
//!
//! ```text
//! {prefix}:{YYYY-MM-DD}:reaction:{name}   HASH  count / updatedAt / u:{userId}
//! {prefix}:{YYYY-MM-DD}:index             ZSET  当天出现过的反应名，score 恒为 0
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    AddOutcome, CounterStore, DailyReactionRecord, DayBucket, ReactionName, RemoveOutcome,
    SlackUserId, StoreError, StoreResult, DAY_PAGE_SIZE,
};

use super::error::map_redis_err;
use super::scripts;

const COUNT_FIELD: &str = "count";
const UPDATED_AT_FIELD: &str = "updatedAt";
const USER_FIELD_PREFIX: &str = "u:";

/// Redis实现的计数存储
pub struct RedisCounterStore {
    redis_client: Arc<redis::Client>,
    key_prefix: String,
    page_size: usize,
    create_script: redis::Script,
    increment_script: redis::Script,
    decrement_script: redis::Script,
}

impl RedisCounterStore {
    pub fn new(redis_client: Arc<redis::Client>, key_prefix: impl Into<String>) -> Self {
        Self {
            redis_client,
            key_prefix: key_prefix.into(),
            page_size: DAY_PAGE_SIZE,
            create_script: redis::Script::new(scripts::CREATE_IF_ABSENT),
            increment_script: redis::Script::new(scripts::INCREMENT),
            decrement_script: redis::Script::new(scripts::DECREMENT_IF_POSITIVE),
        }
    }

    /// 按配置创建
    pub fn from_config(
        redis_client: Arc<redis::Client>,
        redis: &config::RedisConfig,
        store: &config::StoreConfig,
    ) -> Self {
        Self::new(redis_client, redis.key_prefix.clone()).with_page_size(store.page_size)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 生成记录哈希的Redis键
    fn record_key(&self, day: DayBucket, reaction: &str) -> String {
        format!("{}:{{{}}}:reaction:{}", self.key_prefix, day, reaction)
    }

    /// 生成当日索引的Redis键
    fn index_key(&self, day: DayBucket) -> String {
        format!("{}:{{{}}}:index", self.key_prefix, day)
    }

    /// 获取连接
    async fn get_connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.redis_client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_err)
    }
}

fn user_field(user: &SlackUserId) -> String {
    format!("{USER_FIELD_PREFIX}{user}")
}

/// 把 HGETALL 的结果还原为记录
fn decode_record(
    key: &str,
    day: DayBucket,
    reaction: &str,
    fields: HashMap<String, String>,
) -> StoreResult<DailyReactionRecord> {
    let reaction =
        ReactionName::parse(reaction).map_err(|e| StoreError::malformed(key, e.to_string()))?;
    let mut count = None;
    let mut updated_at = None;
    let mut user_counts = BTreeMap::new();

    for (field, value) in fields {
        if field == COUNT_FIELD {
            count = Some(parse_counter(key, &field, &value)?);
        } else if field == UPDATED_AT_FIELD {
            // 仅供参考，解析失败不影响计数
            updated_at = DateTime::parse_from_rfc3339(&value)
                .ok()
                .map(|t| t.with_timezone(&Utc));
        } else if let Some(user) = field.strip_prefix(USER_FIELD_PREFIX) {
            let user =
                SlackUserId::parse(user).map_err(|e| StoreError::malformed(key, e.to_string()))?;
            let n = parse_counter(key, &field, &value)?;
            user_counts.insert(user, n);
        }
    }

    let count = count.ok_or_else(|| StoreError::malformed(key, "missing count field"))?;
    Ok(DailyReactionRecord {
        day,
        reaction,
        count,
        user_counts,
        updated_at,
    })
}

fn parse_counter(key: &str, field: &str, value: &str) -> StoreResult<i64> {
    value
        .parse::<i64>()
        .map_err(|e| StoreError::malformed(key, format!("{field}={value}: {e}")))
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn record_add(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<AddOutcome> {
        let mut conn = self.get_connection().await?;
        let record_key = self.record_key(day, reaction.as_str());
        let index_key = self.index_key(day);
        let user_field = user_field(user);
        let now = Utc::now().to_rfc3339();

        let created: i64 = self
            .create_script
            .key(&record_key)
            .key(&index_key)
            .arg(reaction.as_str())
            .arg(&user_field)
            .arg(&now)
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;

        if created == 1 {
            return Ok(AddOutcome::Created);
        }

        // 记录已存在（也可能刚被并发创建），回退为递增
        let _: i64 = self
            .increment_script
            .key(&record_key)
            .key(&index_key)
            .arg(reaction.as_str())
            .arg(&user_field)
            .arg(&now)
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;

        Ok(AddOutcome::Incremented)
    }

    async fn record_remove(
        &self,
        day: DayBucket,
        reaction: &ReactionName,
        user: &SlackUserId,
    ) -> StoreResult<RemoveOutcome> {
        let mut conn = self.get_connection().await?;
        let record_key = self.record_key(day, reaction.as_str());

        let decremented: i64 = self
            .decrement_script
            .key(&record_key)
            .arg(user_field(user))
            .arg(Utc::now().to_rfc3339())
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;

        Ok(if decremented == 1 {
            RemoveOutcome::Decremented
        } else {
            RemoveOutcome::Absorbed
        })
    }

    async fn query_day(
        &self,
        day: DayBucket,
        reaction: Option<ReactionName>,
    ) -> StoreResult<Vec<DailyReactionRecord>> {
        let mut conn = self.get_connection().await?;

        let names: Vec<String> = match reaction {
            Some(reaction) => vec![reaction.as_str().to_string()],
            None => redis::cmd("ZRANGE")
                .arg(self.index_key(day))
                .arg(0)
                .arg(self.page_size as i64 - 1)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_err)?,
        };

        if names.is_empty() {
            return Ok(Vec::new());
        }
        if names.len() >= self.page_size {
            tracing::warn!(
                day = %day,
                page_size = self.page_size,
                "当日记录达到单页上限，超出部分不会被读取"
            );
        }

        let keys: Vec<String> = names
            .iter()
            .map(|name| self.record_key(day, name))
            .collect();
        let mut pipe = redis::pipe();
        for key in &keys {
            pipe.cmd("HGETALL").arg(key);
        }
        let hashes: Vec<HashMap<String, String>> =
            pipe.query_async(&mut conn).await.map_err(map_redis_err)?;

        keys.iter()
            .zip(names.iter())
            .zip(hashes)
            .filter(|(_, fields)| !fields.is_empty())
            .map(|((key, name), fields)| decode_record(key, day, name, fields))
            .collect()
    }
}
