//! 反应计数系统核心领域模型
//!
//! 包含日桶、反应事件、每日计数记录、聚合视图记录，以及计数存储接口。

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use repositories::*;
pub use value_objects::*;
