use std::sync::Arc;

use chrono::FixedOffset;
use domain::{AddOutcome, CounterStore, ReactionEvent, ReactionKind, RemoveOutcome};

use crate::error::ApplicationError;

/// 单次摄取的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Added(AddOutcome),
    Removed(RemoveOutcome),
}

pub struct EventIngestorDependencies {
    pub store: Arc<dyn CounterStore>,
    /// 参考时区
    pub offset: FixedOffset,
}

/// 事件摄取服务
///
/// 无状态，可被任意并发调用；同键竞争由存储端的条件写裁决。
/// 重复的添加事件不会去重，每次都计数。
pub struct EventIngestor {
    deps: EventIngestorDependencies,
}

impl EventIngestor {
    pub fn new(deps: EventIngestorDependencies) -> Self {
        Self { deps }
    }

    pub async fn ingest(&self, event: &ReactionEvent) -> Result<IngestOutcome, ApplicationError> {
        let delta = event.normalize(self.deps.offset).map_err(|err| {
            tracing::warn!(
                error = %err,
                kind = ?event.kind,
                reaction = %event.reaction_name,
                user = %event.user_id,
                "丢弃无效的反应事件"
            );
            err
        })?;

        let outcome = match delta.kind {
            ReactionKind::Added => IngestOutcome::Added(
                self.deps
                    .store
                    .record_add(delta.day, &delta.reaction, &delta.user)
                    .await?,
            ),
            ReactionKind::Removed => IngestOutcome::Removed(
                self.deps
                    .store
                    .record_remove(delta.day, &delta.reaction, &delta.user)
                    .await?,
            ),
        };

        match outcome {
            IngestOutcome::Added(AddOutcome::Incremented) => tracing::debug!(
                day = %delta.day,
                reaction = %delta.reaction,
                "记录已存在，按递增处理"
            ),
            IngestOutcome::Removed(RemoveOutcome::Absorbed) => tracing::debug!(
                day = %delta.day,
                reaction = %delta.reaction,
                user = %delta.user,
                "没有可移除的计数，忽略"
            ),
            _ => {}
        }

        tracing::info!(
            day = %delta.day,
            reaction = %delta.reaction,
            user = %delta.user,
            outcome = ?outcome,
            "反应事件已记录"
        );

        Ok(outcome)
    }
}
