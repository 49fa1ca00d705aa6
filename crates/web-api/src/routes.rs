use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use application::ApplicationError;
use domain::ReactionTally;

use crate::{
    blocks::ReportBuilder,
    command::{parse_command, Command},
    error::ApiError,
    slack::SlackEnvelope,
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct SlashCommandForm {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    #[serde(rename = "numDays")]
    num_days: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/slack/events", post(slack_events))
        .route("/slack/commands", post(slash_command))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new().route("/report", get(report))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn slack_events(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let envelope: SlackEnvelope = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid event payload: {e}")))?;

    let event = match envelope {
        SlackEnvelope::UrlVerification { challenge } => {
            return Ok(Json(json!({ "challenge": challenge })).into_response());
        }
        SlackEnvelope::EventCallback { event } => event,
        SlackEnvelope::Unsupported => {
            tracing::warn!("未处理的 webhook 类型");
            return Ok(StatusCode::OK.into_response());
        }
    };

    let Some(reaction_event) = event.to_reaction_event() else {
        tracing::warn!("未处理的事件类型");
        return Ok(StatusCode::OK.into_response());
    };
    let reaction_event = reaction_event.map_err(ApplicationError::from)?;

    state.ingestor.ingest(&reaction_event).await?;
    Ok((StatusCode::OK, "ok").into_response())
}

async fn slash_command(
    State(state): State<AppState>,
    Form(form): Form<SlashCommandForm>,
) -> Result<Json<Value>, ApiError> {
    let report = &state.report;
    let builder = ReportBuilder::new(report.top_n, report.default_days);
    let parsed = parse_command(&form.text, report);
    tracing::info!(
        text = %form.text,
        command = ?parsed.command,
        days = parsed.days,
        "收到斜杠命令"
    );

    let payload = match (&parsed.command, parsed.command.view()) {
        (Command::Help, _) => builder.help(),
        (_, Some(view)) => {
            let result = state.engine.run(&view, parsed.days).await?;
            builder.render(&result, parsed.days)
        }
        (_, None) => builder.error(),
    };

    Ok(Json(payload))
}

async fn report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<ReactionTally>>, ApiError> {
    let days = query.num_days.unwrap_or(state.report.default_days);
    if days > state.report.max_days {
        return Err(ApiError::bad_request(format!(
            "numDays: must be at most {}",
            state.report.max_days
        )));
    }

    let rankings = state.engine.top_reactions(days).await?;
    Ok(Json(
        rankings
            .into_iter()
            .map(|r| ReactionTally {
                reaction: r.reaction,
                count: r.count,
            })
            .collect(),
    ))
}
