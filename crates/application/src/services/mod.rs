mod aggregation_service;
mod ingest_service;

pub use aggregation_service::{
    AggregationEngine, AggregationEngineDependencies, AggregationView, ViewResult,
};
pub use ingest_service::{EventIngestor, EventIngestorDependencies, IngestOutcome};
