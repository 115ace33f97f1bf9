//! Command handling infrastructure.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    pub new_version: Version,
}

/// Loads aggregates from an event store and runs commands against them.
///
/// Each execution:
/// 1. replays the aggregate's stream,
/// 2. checks the caller's expected version, if one was given,
/// 3. runs the command to produce events,
/// 4. appends them on the condition that the stream is still at the
///    version that was replayed.
///
/// Step 4 is what makes a decision taken in step 3 safe: if another writer
/// appended in between, the append fails and nothing is persisted.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replays an aggregate. A stream with no events yields `A::default()`.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        let events = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in events {
            let event: A::Event = envelope.decode()?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Replays an aggregate, returning `None` if it was never created.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        Ok(aggregate.id().is_some().then_some(aggregate))
    }

    /// Executes a command and persists the resulting events.
    ///
    /// `expected_version` pins the command to the version the caller last
    /// saw; it is only checked for aggregates that exist, so commands against
    /// a missing aggregate still reach the command function.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        expected_version: Option<Version>,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        if let Some(expected) = expected_version
            && aggregate.id().is_some()
            && expected != current_version
        {
            return Err(DomainError::StaleVersion {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, current_version, &events)?;

        let options = if current_version == Version::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_version(current_version)
        };

        let new_version = self.store.append(envelopes, options).await?;

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut version = current_version;
        events
            .iter()
            .map(|event| -> Result<EventEnvelope, DomainError> {
                version = version.next();
                let envelope = EventEnvelope::builder()
                    .aggregate_id(aggregate_id)
                    .aggregate_type(A::aggregate_type())
                    .event_type(event.event_type())
                    .version(version)
                    .payload(event)?
                    .build()?;
                Ok(envelope)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum NoteEvent {
        Written { id: AggregateId, text: String },
        Edited { text: String },
    }

    impl DomainEvent for NoteEvent {
        fn event_type(&self) -> &'static str {
            match self {
                NoteEvent::Written { .. } => "NoteWritten",
                NoteEvent::Edited { .. } => "NoteEdited",
            }
        }
    }

    #[derive(Debug, Default)]
    struct Note {
        id: Option<AggregateId>,
        text: String,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("empty text")]
    struct EmptyText;

    impl From<EmptyText> for DomainError {
        fn from(_: EmptyText) -> Self {
            DomainError::Serialization(serde_json::Error::io(std::io::Error::other(
                "empty text",
            )))
        }
    }

    impl Aggregate for Note {
        type Event = NoteEvent;
        type Error = EmptyText;

        fn aggregate_type() -> &'static str {
            "Note"
        }

        fn id(&self) -> Option<AggregateId> {
            self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                NoteEvent::Written { id, text } => {
                    self.id = Some(id);
                    self.text = text;
                }
                NoteEvent::Edited { text } => self.text = text,
            }
        }
    }

    fn write(id: AggregateId, text: &str) -> Result<Vec<NoteEvent>, EmptyText> {
        Ok(vec![NoteEvent::Written {
            id,
            text: text.to_string(),
        }])
    }

    #[tokio::test]
    async fn test_execute_creates_aggregate() {
        let handler: CommandHandler<_, Note> = CommandHandler::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        let result = handler.execute(id, None, |_| write(id, "hello")).await.unwrap();

        assert_eq!(result.new_version, Version::first());
        assert_eq!(result.aggregate.id(), Some(id));
        assert_eq!(result.aggregate.text, "hello");
    }

    #[tokio::test]
    async fn test_load_replays_events() {
        let handler: CommandHandler<_, Note> = CommandHandler::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        handler.execute(id, None, |_| write(id, "one")).await.unwrap();
        handler
            .execute(id, None, |_| {
                Ok(vec![NoteEvent::Edited {
                    text: "two".to_string(),
                }])
            })
            .await
            .unwrap();

        let note = handler.load(id).await.unwrap();
        assert_eq!(note.text, "two");
        assert_eq!(note.version(), Version::new(2));
    }

    #[tokio::test]
    async fn test_command_error_persists_nothing() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Note> = CommandHandler::new(store.clone());

        let result = handler.execute(AggregateId::new(), None, |_| Err(EmptyText)).await;

        assert!(result.is_err());
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_expected_version_mismatch_is_stale() {
        let handler: CommandHandler<_, Note> = CommandHandler::new(InMemoryEventStore::new());
        let id = AggregateId::new();
        handler.execute(id, None, |_| write(id, "one")).await.unwrap();

        let result = handler
            .execute(id, Some(Version::new(7)), |_| {
                Ok(vec![NoteEvent::Edited {
                    text: "late".to_string(),
                }])
            })
            .await;

        assert!(matches!(result, Err(DomainError::StaleVersion { .. })));
    }

    #[tokio::test]
    async fn test_load_existing_distinguishes_missing() {
        let handler: CommandHandler<_, Note> = CommandHandler::new(InMemoryEventStore::new());
        let id = AggregateId::new();

        assert!(handler.load_existing(id).await.unwrap().is_none());

        handler.execute(id, None, |_| write(id, "here")).await.unwrap();
        assert!(handler.load_existing(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_events_returns_without_persisting() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, Note> = CommandHandler::new(store.clone());

        let result = handler
            .execute(AggregateId::new(), None, |_| Ok(vec![]))
            .await
            .unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.new_version, Version::initial());
        assert_eq!(store.event_count().await, 0);
    }
}
