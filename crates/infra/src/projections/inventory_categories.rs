use std::sync::RwLock;

use serde_json::Value as JsonValue;

use teeforge_events::EventEnvelope;
use teeforge_inventory::{CATEGORY_AGGREGATE_TYPE, CategoryEvent, CategoryKind, InventoryCategoryId};

use crate::projections::cursor::{CursorCheck, ProjectionError, StreamCursors};
use crate::read_model::ReadModelStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReadModel {
    pub category_id: InventoryCategoryId,
    pub name: String,
    pub kind: CategoryKind,
    pub description: Option<String>,
    pub version: u64,
}

/// Category lookup projection, used to resolve item category names.
#[derive(Debug)]
pub struct InventoryCategoriesProjection<S>
where
    S: ReadModelStore<InventoryCategoryId, CategoryReadModel>,
{
    store: S,
    cursors: RwLock<StreamCursors>,
}

impl<S> InventoryCategoriesProjection<S>
where
    S: ReadModelStore<InventoryCategoryId, CategoryReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(StreamCursors::new()),
        }
    }

    pub fn get(&self, category_id: &InventoryCategoryId) -> Option<CategoryReadModel> {
        self.store.get(category_id)
    }

    /// All live categories, ordered by name.
    pub fn list(&self) -> Vec<CategoryReadModel> {
        let mut rows = self.store.list();
        rows.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.category_id.cmp(&b.category_id))
        });
        rows
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != CATEGORY_AGGREGATE_TYPE {
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

        let event: CategoryEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let category_id = event.category_id();
        if category_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch {
                expected: aggregate_id,
                found: category_id.0,
            });
        }

        match event {
            CategoryEvent::CategoryCreated(e) => self.store.upsert(
                category_id,
                CategoryReadModel {
                    category_id,
                    name: e.name,
                    kind: e.kind,
                    description: e.description,
                    version: seq,
                },
            ),
            CategoryEvent::CategoryUpdated(e) => self.store.upsert(
                category_id,
                CategoryReadModel {
                    category_id,
                    name: e.name,
                    kind: e.kind,
                    description: e.description,
                    version: seq,
                },
            ),
            CategoryEvent::CategoryDeleted(_) => self.store.remove(&category_id),
        }

        cursors.advance(aggregate_id, seq);
        Ok(())
    }

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

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use uuid::Uuid;

    use teeforge_core::AggregateId;
    use teeforge_inventory::{CategoryCreated, CategoryDeleted, CategoryUpdated};

    use crate::read_model::InMemoryReadModelStore;

    type Store = InMemoryReadModelStore<InventoryCategoryId, CategoryReadModel>;

    fn envelope(id: InventoryCategoryId, seq: u64, event: CategoryEvent) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            id.0,
            CATEGORY_AGGREGATE_TYPE,
            seq,
            serde_json::to_value(&event).unwrap(),
        )
    }

    #[test]
    fn tracks_create_update_delete() {
        let p = InventoryCategoriesProjection::new(Store::new());
        let id = InventoryCategoryId::new(AggregateId::new());

        p.apply_envelope(&envelope(
            id,
            1,
            CategoryEvent::CategoryCreated(CategoryCreated {
                category_id: id,
                name: "Fabrics".to_string(),
                kind: CategoryKind::Fabric,
                description: None,
                occurred_at: Utc::now(),
            }),
        ))
        .unwrap();
        p.apply_envelope(&envelope(
            id,
            2,
            CategoryEvent::CategoryUpdated(CategoryUpdated {
                category_id: id,
                name: "Knits".to_string(),
                kind: CategoryKind::Fabric,
                description: Some("jersey, rib".to_string()),
                occurred_at: Utc::now(),
            }),
        ))
        .unwrap();

        let row = p.get(&id).unwrap();
        assert_eq!(row.name, "Knits");
        assert_eq!(row.version, 2);

        p.apply_envelope(&envelope(
            id,
            3,
            CategoryEvent::CategoryDeleted(CategoryDeleted {
                category_id: id,
                occurred_at: Utc::now(),
            }),
        ))
        .unwrap();
        assert!(p.list().is_empty());
    }

    #[test]
    fn item_envelopes_are_ignored() {
        let p = InventoryCategoriesProjection::new(Store::new());
        let env = EventEnvelope::new(
            Uuid::now_v7(),
            AggregateId::new(),
            teeforge_inventory::ITEM_AGGREGATE_TYPE,
            1,
            serde_json::json!({"not": "a category"}),
        );
        p.apply_envelope(&env).unwrap();
        assert!(p.list().is_empty());
    }

    #[test]
    fn poisoned_cursor_lock_surfaces_an_error() {
        let p = InventoryCategoriesProjection::new(Store::new());
        let id = InventoryCategoryId::new(AggregateId::new());
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = p.cursors.write().unwrap();
            panic!("writer died holding the cursor lock");
        }));

        let err = p
            .apply_envelope(&envelope(
                id,
                1,
                CategoryEvent::CategoryCreated(CategoryCreated {
                    category_id: id,
                    name: "Inks".to_string(),
                    kind: CategoryKind::Ink,
                    description: None,
                    occurred_at: Utc::now(),
                }),
            ))
            .unwrap_err();
        assert!(matches!(err, ProjectionError::LockPoisoned));
        assert!(p.get(&id).is_none());
    }
}
