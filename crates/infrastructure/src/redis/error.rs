//! Redis 错误到计数存储错误的映射

use domain::StoreError;
use redis::ErrorKind;

/// 服务端要求稍后再试的错误码：脚本执行中（BUSY）、内存达到上限（OOM）
const THROTTLING_CODES: &[&str] = &["BUSY", "OOM"];

fn is_throttling_code(code: &str) -> bool {
    THROTTLING_CODES.contains(&code)
}

/// 连接类故障和节点暂不可服务视为瞬时错误，服务端压力类回复视为限流，其余不重试
pub fn map_redis_err(err: redis::RedisError) -> StoreError {
    if err.code().is_some_and(is_throttling_code) {
        return StoreError::throttled(err.to_string());
    }

    if err.is_io_error()
        || err.is_timeout()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
    {
        return StoreError::unavailable(err.to_string());
    }

    match err.kind() {
        ErrorKind::BusyLoadingError
        | ErrorKind::TryAgain
        | ErrorKind::ClusterDown
        | ErrorKind::MasterDown => StoreError::unavailable(err.to_string()),
        _ => StoreError::backend(err.to_string()),
    }
}
