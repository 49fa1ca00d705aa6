//! 计数存储使用的 Lua 脚本
//!
//! KEYS[1] 记录哈希，KEYS[2] 当日索引（有序集合）。

/// 条件创建：记录已存在时返回 0，否则写入 count=1 并登记索引，返回 1
pub(crate) const CREATE_IF_ABSENT: &str = r#"
local record_key = KEYS[1]
local index_key = KEYS[2]
local reaction = ARGV[1]
local user_field = ARGV[2]
local now = ARGV[3]

if redis.call('EXISTS', record_key) == 1 then
    return 0
end

redis.call('HSET', record_key, 'count', 1, user_field, 1, 'updatedAt', now)
redis.call('ZADD', index_key, 0, reaction)
return 1
"#;

/// 递增总数和用户计数；缺失的用户字段从 0 开始
pub(crate) const INCREMENT: &str = r#"
local record_key = KEYS[1]
local index_key = KEYS[2]
local reaction = ARGV[1]
local user_field = ARGV[2]
local now = ARGV[3]

redis.call('HINCRBY', record_key, 'count', 1)
redis.call('HINCRBY', record_key, user_field, 1)
redis.call('HSET', record_key, 'updatedAt', now)
redis.call('ZADD', index_key, 0, reaction)
return 1
"#;

/// 条件递减：记录存在且用户计数为正时才递减，返回 1；否则不做修改，返回 0
pub(crate) const DECREMENT_IF_POSITIVE: &str = r#"
local record_key = KEYS[1]
local user_field = ARGV[1]
local now = ARGV[2]

if redis.call('EXISTS', record_key) == 0 then
    return 0
end

local current = tonumber(redis.call('HGET', record_key, user_field))
if current == nil or current <= 0 then
    return 0
end

redis.call('HINCRBY', record_key, 'count', -1)
redis.call('HINCRBY', record_key, user_field, -1)
redis.call('HSET', record_key, 'updatedAt', now)
return 1
"#;
