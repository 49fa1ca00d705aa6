//! 主应用程序入口
//!
//! 启动反应计数服务：Slack webhook、斜杠命令与 JSON 报表。

use std::sync::Arc;

use anyhow::Context;
use application::{
    AggregationEngine, AggregationEngineDependencies, EventIngestor, EventIngestorDependencies,
    RetryConfig, RetryingCounterStore, SystemClock,
};
use chrono::FixedOffset;
use config::AppConfig;
use domain::CounterStore;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load().context("加载配置失败")?;
    tracing::info!(config = %config.sanitize(), "配置已加载");

    let offset = FixedOffset::east_opt(config.report.utc_offset_seconds)
        .context("无效的 UTC 偏移")?;

    // Redis 存储外面包一层重试
    let redis_store = infrastructure::create_redis_counter_store(&config)?;
    let store: Arc<dyn CounterStore> = Arc::new(RetryingCounterStore::new(
        redis_store,
        RetryConfig::from(&config.retry),
    ));

    let ingestor = EventIngestor::new(EventIngestorDependencies {
        store: store.clone(),
        offset,
    });
    let engine = AggregationEngine::new(AggregationEngineDependencies {
        store,
        clock: Arc::new(SystemClock),
        offset,
    });

    let state = AppState::new(Arc::new(ingestor), Arc::new(engine), config.report.clone());

    // 启动 Web 服务器
    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听 {addr}"))?;

    tracing::info!("反应计数服务启动在 http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
