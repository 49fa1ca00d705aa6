//! Web API 层。
//!
//! 提供 Axum 路由：Slack 事件 webhook、斜杠命令和 JSON 报表，
//! 将请求委托给应用层的摄取与聚合服务。

mod blocks;
mod command;
mod error;
mod routes;
mod slack;
mod state;

pub use blocks::ReportBuilder;
pub use command::{parse_command, Command, SlashCommand};
pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use slack::{ReactionPayload, SlackEnvelope, SlackEvent};
pub use state::AppState;
