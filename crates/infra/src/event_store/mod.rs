//! Append-only event store boundary.
//!
//! Streams are keyed by aggregate id. Storage engines stay behind the
//! [`EventStore`] trait; the in-memory store serves the single-process
//! deployment and tests.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
