use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::warn;

use teeforge_events::EventEnvelope;
use teeforge_inventory::{
    ITEM_AGGREGATE_TYPE, InventoryCategoryId, InventoryEvent, InventoryItemId, Quantity,
    StockLevels,
};

use crate::projections::cursor::{CursorCheck, ProjectionError, StreamCursors};
use crate::read_model::ReadModelStore;

/// Queryable inventory item row: details plus current levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItemReadModel {
    pub item_id: InventoryItemId,
    pub name: String,
    pub category_id: InventoryCategoryId,
    pub unit: String,
    pub stock: Quantity,
    pub pending_restock: Quantity,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Stream version this row reflects.
    pub version: u64,
}

impl InventoryItemReadModel {
    fn set_levels(&mut self, levels: StockLevels) {
        self.stock = levels.stock;
        self.pending_restock = levels.pending_restock;
    }
}

/// Inventory item projection.
///
/// Consumes published envelopes (JSON payloads) and keeps one row per live
/// item. Envelopes for other aggregate types are ignored, so the same bus
/// subscription can feed every projection.
#[derive(Debug)]
pub struct InventoryItemsProjection<S>
where
    S: ReadModelStore<InventoryItemId, InventoryItemReadModel>,
{
    store: S,
    cursors: RwLock<StreamCursors>,
}

impl<S> InventoryItemsProjection<S>
where
    S: ReadModelStore<InventoryItemId, InventoryItemReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(StreamCursors::new()),
        }
    }

    pub fn get(&self, item_id: &InventoryItemId) -> Option<InventoryItemReadModel> {
        self.store.get(item_id)
    }

    /// All live items, ordered by name then id.
    pub fn list(&self) -> Vec<InventoryItemReadModel> {
        let mut rows = self.store.list();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.item_id.cmp(&b.item_id)));
        rows
    }

    /// Apply a published envelope into the projection.
    ///
    /// - Enforces monotonic sequence per aggregate stream
    /// - Idempotent for at-least-once delivery (replays <= cursor are ignored)
    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != ITEM_AGGREGATE_TYPE {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let mut cursors = self
            .cursors
            .write()
            .map_err(|_| ProjectionError::LockPoisoned)?;
        if cursors.check(aggregate_id, seq)? == CursorCheck::Skip {
            return Ok(());
        }

        let event: InventoryEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let item_id = event.item_id();
        if item_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch {
                expected: aggregate_id,
                found: item_id.0,
            });
        }

        match event {
            InventoryEvent::ItemCreated(e) => {
                self.store.upsert(
                    item_id,
                    InventoryItemReadModel {
                        item_id,
                        name: e.details.name,
                        category_id: e.details.category_id,
                        unit: e.details.unit,
                        stock: e.levels.stock,
                        pending_restock: e.levels.pending_restock,
                        description: e.details.description,
                        created_at: e.occurred_at,
                        updated_at: e.occurred_at,
                        version: seq,
                    },
                );
            }
            InventoryEvent::ItemDeleted(_) => {
                self.store.remove(&item_id);
            }
            other => {
                let Some(mut row) = self.store.get(&item_id) else {
                    warn!(%item_id, seq, "item row missing; skipping update");
                    cursors.advance(aggregate_id, seq);
                    return Ok(());
                };
                match other {
                    InventoryEvent::ItemDetailsUpdated(e) => {
                        row.name = e.details.name;
                        row.category_id = e.details.category_id;
                        row.unit = e.details.unit;
                        row.description = e.details.description;
                        row.updated_at = e.occurred_at;
                    }
                    InventoryEvent::StockReceived(e) => {
                        row.set_levels(e.levels);
                        row.updated_at = e.occurred_at;
                    }
                    InventoryEvent::LevelsReplaced(e) => {
                        row.set_levels(e.levels);
                        row.updated_at = e.occurred_at;
                    }
                    InventoryEvent::StockConsumed(e) => {
                        row.set_levels(e.levels);
                        row.updated_at = e.occurred_at;
                    }
                    InventoryEvent::ItemCreated(_) | InventoryEvent::ItemDeleted(_) => {}
                }
                row.version = seq;
                self.store.upsert(item_id, row);
            }
        }

        cursors.advance(aggregate_id, seq);
        Ok(())
    }

    /// Rebuild the read model from scratch by replaying envelopes.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        self.cursors
            .write()
            .map_err(|_| ProjectionError::LockPoisoned)?
            .clear();
        self.store.clear();

        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by_key(|e| (e.aggregate_id(), e.sequence_number()));

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}
