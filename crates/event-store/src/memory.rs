use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{AppendOptions, EventStore, validate_events_for_append};
use crate::{AggregateId, EventEnvelope, EventStoreError, Result, Version};

#[derive(Default)]
struct Streams {
    by_aggregate: HashMap<AggregateId, Vec<EventEnvelope>>,
    /// Every stored event as `(stream, index)`, in commit order.
    log: Vec<(AggregateId, usize)>,
}

/// In-memory event store.
///
/// Streams are kept per aggregate. The version check and the write happen
/// under a single write-lock acquisition, so two writers that read the same
/// version cannot both append. Cross-stream reads follow commit order.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<Streams>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events across all streams.
    pub async fn event_count(&self) -> usize {
        self.streams.read().await.log.len()
    }

    /// Returns the number of streams that have at least one event.
    pub async fn aggregate_count(&self) -> usize {
        self.streams.read().await.by_aggregate.len()
    }
}

fn stream_version(stream: Option<&Vec<EventEnvelope>>) -> Version {
    stream
        .and_then(|events| events.last())
        .map(|e| e.version)
        .unwrap_or_else(Version::initial)
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id;
        let first_new_version = events[0].version;

        let mut streams = self.streams.write().await;
        let current_version = stream_version(streams.by_aggregate.get(&aggregate_id));

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            tracing::debug!(%aggregate_id, %expected, actual = %current_version, "append rejected");
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Even without an expected version the stream must stay gap-free.
        if first_new_version != current_version.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(current_version);

        let Streams { by_aggregate, log } = &mut *streams;
        let stream = by_aggregate.entry(aggregate_id).or_default();
        log.extend((stream.len()..stream.len() + events.len()).map(|i| (aggregate_id, i)));
        stream.extend(events);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let streams = self.streams.read().await;
        Ok(streams
            .by_aggregate
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let streams = self.streams.read().await;
        Ok(streams
            .by_aggregate
            .get(&aggregate_id)
            .and_then(|events| events.last())
            .map(|e| e.version))
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let streams = self.streams.read().await;
        Ok(streams
            .log
            .iter()
            .filter_map(|(id, index)| streams.by_aggregate.get(id)?.get(*index))
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }
}
