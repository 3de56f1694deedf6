//! Command execution pipeline for event-sourced aggregates.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the aggregate stream from the store
//!   ↓
//! 2. Rehydrate (apply historical events)
//!   ↓
//! 3. Check the caller's expected version, if any
//!   ↓
//! 4. Handle the command (pure decision, produces events)
//!   ↓
//! 5. Append with ExpectedVersion::Exact(loaded version)
//!   ↓
//! 6. Publish committed envelopes to the bus
//! ```
//!
//! Step 5 is what prevents lost updates: two concurrent receipts on one
//! item both load version N, only the first append at N succeeds, the
//! second surfaces as [`DispatchError::Concurrency`]. Nothing is retried here.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use teeforge_core::{Aggregate, AggregateId, DomainError, ExpectedVersion};
use teeforge_events::{EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Optimistic concurrency failure (stale version, duplicate creation).
    #[error("conflict: {0}")]
    Concurrency(String),
    /// Domain validation failure.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Domain invariant failure.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// The aggregate does not exist.
    #[error("not found")]
    NotFound,
    /// A stored payload could not be read back as the aggregate's event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),
    /// Reading or appending failed.
    #[error(transparent)]
    Store(EventStoreError),
    /// Publication failed after a successful append.
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            other => DispatchError::Store(other),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Conflict(msg) => DispatchError::Concurrency(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone)]
pub struct Dispatched<A> {
    /// Events appended by this command (empty when the command was a no-op).
    pub committed: Vec<StoredEvent>,
    /// Aggregate state after the committed events were applied.
    pub aggregate: A,
}

impl<A> Dispatched<A>
where
    A: Aggregate,
{
    pub fn version(&self) -> u64 {
        self.aggregate.version()
    }
}

/// Reusable command execution engine.
///
/// Generic over the store and the bus so the same pipeline runs against
/// in-memory implementations in tests and whatever backends a deployment
/// wires in.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Dispatch a command through the full pipeline.
    ///
    /// `expected` is the caller's view of the stream version
    /// (`ExpectedVersion::Any` when the caller has none). The append itself
    /// always uses the version that was loaded.
    pub fn dispatch<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        expected: ExpectedVersion,
        command: A::Command,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<Dispatched<A>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: teeforge_events::Event + Serialize + DeserializeOwned,
    {
        let span = tracing::info_span!("dispatch", %aggregate_id, aggregate_type);
        let _guard = span.enter();

        let history = self.store.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;
        let loaded_version = stream_version(&history);

        if !expected.matches(loaded_version) {
            return Err(DispatchError::Concurrency(format!(
                "expected {expected:?}, found {loaded_version}"
            )));
        }

        let mut aggregate = make_aggregate(aggregate_id);
        apply_history(&mut aggregate, &history)?;

        let decided = aggregate.handle(&command).map_err(DispatchError::from)?;
        if decided.is_empty() {
            debug!(version = loaded_version, "command decided no events");
            return Ok(Dispatched {
                committed: vec![],
                aggregate,
            });
        }

        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(aggregate_id, aggregate_type, Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self
            .store
            .append(uncommitted, ExpectedVersion::Exact(loaded_version))?;

        for ev in &decided {
            aggregate.apply(ev);
        }

        debug!(
            events = committed.len(),
            version = stream_version(&committed),
            "events committed"
        );

        for stored in &committed {
            self.bus.publish(stored.to_envelope()).map_err(|e| {
                warn!(error = ?e, "publish failed after append");
                DispatchError::Publish(format!("{e:?}"))
            })?;
        }

        Ok(Dispatched {
            committed,
            aggregate,
        })
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            ))));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use teeforge_core::AggregateRoot;
    use teeforge_events::InMemoryEventBus;
    use teeforge_inventory::{
        ConsumeForNeed, CreateItem, InventoryCategoryId, InventoryCommand, InventoryItem,
        InventoryItemId, ItemDetails, ITEM_AGGREGATE_TYPE, Quantity,
    };

    use super::*;
    use crate::event_store::InMemoryEventStore;

    type TestDispatcher =
        CommandDispatcher<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

    fn dispatcher() -> TestDispatcher {
        CommandDispatcher::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryEventBus::new()),
        )
    }

    fn create(d: &TestDispatcher, stock: i64) -> AggregateId {
        let agg = AggregateId::new();
        let cmd = InventoryCommand::CreateItem(CreateItem {
            item_id: InventoryItemId::new(agg),
            details: ItemDetails {
                name: "Plastisol white".to_string(),
                category_id: InventoryCategoryId::new(AggregateId::new()),
                unit: "litres".to_string(),
                description: None,
            },
            stock: Decimal::from(stock),
            pending_restock: None,
            occurred_at: Utc::now(),
        });
        d.dispatch(agg, ITEM_AGGREGATE_TYPE, ExpectedVersion::Any, cmd, |id| {
            InventoryItem::empty(InventoryItemId::new(id))
        })
        .unwrap();
        agg
    }

    fn consume(agg: AggregateId, needed: i64) -> InventoryCommand {
        InventoryCommand::ConsumeForNeed(ConsumeForNeed {
            item_id: InventoryItemId::new(agg),
            needed_qty: Decimal::from(needed),
            occurred_at: Utc::now(),
        })
    }

    fn run(
        d: &TestDispatcher,
        agg: AggregateId,
        expected: ExpectedVersion,
        cmd: InventoryCommand,
    ) -> Result<Dispatched<InventoryItem>, DispatchError> {
        d.dispatch(agg, ITEM_AGGREGATE_TYPE, expected, cmd, |id| {
            InventoryItem::empty(InventoryItemId::new(id))
        })
    }

    #[test]
    fn dispatch_returns_state_after_commit() {
        let d = dispatcher();
        let agg = create(&d, 8);

        let out = run(&d, agg, ExpectedVersion::Any, consume(agg, 12)).unwrap();

        assert_eq!(out.committed.len(), 1);
        assert_eq!(out.version(), 2);
        assert_eq!(out.aggregate.levels().stock, Quantity::ZERO);
        assert_eq!(out.aggregate.levels().pending_restock, Quantity::from_units(4));
    }

    #[test]
    fn stale_caller_version_is_a_conflict() {
        let d = dispatcher();
        let agg = create(&d, 8);
        run(&d, agg, ExpectedVersion::Exact(1), consume(agg, 1)).unwrap();

        let err = run(&d, agg, ExpectedVersion::Exact(1), consume(agg, 1)).unwrap_err();
        assert!(matches!(err, DispatchError::Concurrency(_)));
        assert_eq!(d.store().load_stream(agg).unwrap().len(), 2);
    }

    #[test]
    fn unknown_aggregate_maps_to_not_found() {
        let d = dispatcher();
        let agg = AggregateId::new();
        let err = run(&d, agg, ExpectedVersion::Any, consume(agg, 1)).unwrap_err();
        assert!(matches!(err, DispatchError::NotFound));
    }

    #[test]
    fn no_op_commands_append_nothing() {
        let d = dispatcher();
        let agg = create(&d, 8);
        let out = run(&d, agg, ExpectedVersion::Any, consume(agg, 0)).unwrap();
        assert!(out.committed.is_empty());
        assert_eq!(out.aggregate.version(), 1);
    }

    #[test]
    fn committed_events_are_published() {
        let store = Arc::new(InMemoryEventStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let d: TestDispatcher = CommandDispatcher::new(store, bus);

        let agg = create(&d, 1);

        let env = sub.try_recv().unwrap();
        assert_eq!(env.aggregate_id(), agg);
        assert_eq!(env.sequence_number(), 1);
        assert_eq!(env.aggregate_type(), ITEM_AGGREGATE_TYPE);
    }

    #[test]
    fn concurrent_consumers_never_lose_an_update() {
        let d = Arc::new(dispatcher());
        let agg = create(&d, 100);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let d = d.clone();
                std::thread::spawn(move || {
                    let mut ok = 0;
                    for _ in 0..10 {
                        if run(&d, agg, ExpectedVersion::Any, consume(agg, 1)).is_ok() {
                            ok += 1;
                        }
                    }
                    ok
                })
            })
            .collect();

        let succeeded: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        let mut item = InventoryItem::empty(InventoryItemId::new(agg));
        apply_history(&mut item, &d.store().load_stream(agg).unwrap()).unwrap();
        assert_eq!(item.levels().stock, Quantity::from_units(100 - succeeded));
    }
}
