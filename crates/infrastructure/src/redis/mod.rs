//! Redis 计数存储模块
//!
//! 条件写由服务端 Lua 脚本完成，脚本在 Redis 内原子执行。

pub mod counter_store;
pub mod error;
mod scripts;

// 重新导出
pub use counter_store::*;
pub use error::*;
