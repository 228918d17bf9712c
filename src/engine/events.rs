// src/engine/events.rs

use async_trait::async_trait;
use serde::Serialize;

/// Emitted exactly once per attempt that completes with a passing verdict.
/// The achievement/points system downstream decides what it is worth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassEvent {
    pub user_id: i64,
    pub category_id: i64,
    pub definition_id: i64,
    pub attempt_id: i64,
}

/// Outbound boundary for pass events. Publishing happens after the
/// completing transaction commits and never blocks the submit response.
#[async_trait]
pub trait PassEventSink: Send + Sync {
    async fn publish(&self, event: PassEvent);
}

/// Default sink: records the event in the log. Deployments wire a real
/// integration in its place.
pub struct LogPassEventSink;

#[async_trait]
impl PassEventSink for LogPassEventSink {
    async fn publish(&self, event: PassEvent) {
        tracing::info!(
            user_id = event.user_id,
            category_id = event.category_id,
            definition_id = event.definition_id,
            attempt_id = event.attempt_id,
            "assessment passed"
        );
    }
}
