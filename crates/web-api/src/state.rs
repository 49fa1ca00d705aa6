use std::sync::Arc;

use application::{AggregationEngine, EventIngestor};
use config::ReportConfig;

#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<EventIngestor>,
    pub engine: Arc<AggregationEngine>,
    pub report: Arc<ReportConfig>, // 默认窗口与展示条数
}

impl AppState {
    pub fn new(
        ingestor: Arc<EventIngestor>,
        engine: Arc<AggregationEngine>,
        report: ReportConfig,
    ) -> Self {
        Self {
            ingestor,
            engine,
            report: Arc::new(report),
        }
    }
}
