//! Read-side joins over the item and category projections.

use std::sync::Arc;

use teeforge_inventory::{CategoryKind, InventoryCategoryId, InventoryItemId};

use crate::projections::inventory_categories::{CategoryReadModel, InventoryCategoriesProjection};
use crate::projections::inventory_items::{InventoryItemReadModel, InventoryItemsProjection};
use crate::read_model::ReadModelStore;

/// Category name shown for items whose category no longer exists.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// An item row joined with its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItemView {
    pub item: InventoryItemReadModel,
    pub category_name: String,
    /// `None` when the category reference dangles.
    pub category_kind: Option<CategoryKind>,
}

impl InventoryItemView {
    pub fn is_textile(&self) -> bool {
        self.category_kind.is_some_and(CategoryKind::is_textile)
    }
}

/// Query facade used by the HTTP layer.
#[derive(Debug)]
pub struct InventoryCatalog<IS, CS>
where
    IS: ReadModelStore<InventoryItemId, InventoryItemReadModel>,
    CS: ReadModelStore<InventoryCategoryId, CategoryReadModel>,
{
    items: Arc<InventoryItemsProjection<IS>>,
    categories: Arc<InventoryCategoriesProjection<CS>>,
}

impl<IS, CS> Clone for InventoryCatalog<IS, CS>
where
    IS: ReadModelStore<InventoryItemId, InventoryItemReadModel>,
    CS: ReadModelStore<InventoryCategoryId, CategoryReadModel>,
{
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            categories: Arc::clone(&self.categories),
        }
    }
}

impl<IS, CS> InventoryCatalog<IS, CS>
where
    IS: ReadModelStore<InventoryItemId, InventoryItemReadModel>,
    CS: ReadModelStore<InventoryCategoryId, CategoryReadModel>,
{
    pub fn new(
        items: Arc<InventoryItemsProjection<IS>>,
        categories: Arc<InventoryCategoriesProjection<CS>>,
    ) -> Self {
        Self { items, categories }
    }

    fn join(&self, item: InventoryItemReadModel) -> InventoryItemView {
        match self.categories.get(&item.category_id) {
            Some(category) => InventoryItemView {
                item,
                category_name: category.name,
                category_kind: Some(category.kind),
            },
            None => InventoryItemView {
                item,
                category_name: UNKNOWN_CATEGORY.to_string(),
                category_kind: None,
            },
        }
    }

    /// Every item with its category name, ordered by item name.
    pub fn items(&self) -> Vec<InventoryItemView> {
        self.items.list().into_iter().map(|i| self.join(i)).collect()
    }

    pub fn item(&self, item_id: &InventoryItemId) -> Option<InventoryItemView> {
        self.items.get(item_id).map(|i| self.join(i))
    }

    /// Items whose category holds fabric.
    pub fn textiles(&self) -> Vec<InventoryItemView> {
        self.items().into_iter().filter(InventoryItemView::is_textile).collect()
    }

    pub fn categories(&self) -> Vec<CategoryReadModel> {
        self.categories.list()
    }

    pub fn category(&self, category_id: &InventoryCategoryId) -> Option<CategoryReadModel> {
        self.categories.get(category_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use serde_json::Value as JsonValue;
    use uuid::Uuid;

    use teeforge_core::AggregateId;
    use teeforge_events::EventEnvelope;
    use teeforge_inventory::{
        CATEGORY_AGGREGATE_TYPE, CategoryCreated, CategoryEvent, ITEM_AGGREGATE_TYPE, InventoryEvent,
        ItemCreated, ItemDetails, Quantity, StockLevels,
    };

    use crate::read_model::InMemoryReadModelStore;

    type Items = InMemoryReadModelStore<InventoryItemId, InventoryItemReadModel>;
    type Categories = InMemoryReadModelStore<InventoryCategoryId, CategoryReadModel>;

    struct Fixture {
        items: Arc<InventoryItemsProjection<Items>>,
        categories: Arc<InventoryCategoriesProjection<Categories>>,
        catalog: InventoryCatalog<Items, Categories>,
    }

    fn fixture() -> Fixture {
        let items = Arc::new(InventoryItemsProjection::new(Items::new()));
        let categories = Arc::new(InventoryCategoriesProjection::new(Categories::new()));
        let catalog = InventoryCatalog::new(Arc::clone(&items), Arc::clone(&categories));
        Fixture {
            items,
            categories,
            catalog,
        }
    }

    fn category(f: &Fixture, name: &str, kind: CategoryKind) -> InventoryCategoryId {
        let id = InventoryCategoryId::new(AggregateId::new());
        let event = CategoryEvent::CategoryCreated(CategoryCreated {
            category_id: id,
            name: name.to_string(),
            kind,
            description: None,
            occurred_at: Utc::now(),
        });
        let env: EventEnvelope<JsonValue> = EventEnvelope::new(
            Uuid::now_v7(),
            id.0,
            CATEGORY_AGGREGATE_TYPE,
            1,
            serde_json::to_value(&event).unwrap(),
        );
        f.categories.apply_envelope(&env).unwrap();
        id
    }

    fn item(f: &Fixture, name: &str, category_id: InventoryCategoryId) -> InventoryItemId {
        let id = InventoryItemId::new(AggregateId::new());
        let event = InventoryEvent::ItemCreated(ItemCreated {
            item_id: id,
            details: ItemDetails {
                name: name.to_string(),
                category_id,
                unit: "pieces".to_string(),
                description: None,
            },
            levels: StockLevels::new(Quantity::from_units(1), Quantity::ZERO),
            occurred_at: Utc::now(),
        });
        let env = EventEnvelope::new(
            Uuid::now_v7(),
            id.0,
            ITEM_AGGREGATE_TYPE,
            1,
            serde_json::to_value(&event).unwrap(),
        );
        f.items.apply_envelope(&env).unwrap();
        id
    }

    #[test]
    fn dangling_category_reads_as_unknown() {
        let f = fixture();
        let id = item(&f, "Orphan", InventoryCategoryId::new(AggregateId::new()));

        let view = f.catalog.item(&id).unwrap();
        assert_eq!(view.category_name, UNKNOWN_CATEGORY);
        assert!(!view.is_textile());
    }

    #[test]
    fn textiles_are_selected_by_kind_not_name() {
        let f = fixture();
        let knits = category(&f, "Knits", CategoryKind::Fabric);
        let misnamed = category(&f, "fabric", CategoryKind::Trim);

        item(&f, "Jersey", knits);
        item(&f, "Zipper", misnamed);

        let textiles = f.catalog.textiles();
        assert_eq!(textiles.len(), 1);
        assert_eq!(textiles[0].item.name, "Jersey");
        assert_eq!(textiles[0].category_name, "Knits");
    }

    #[test]
    fn listing_twice_is_stable() {
        let f = fixture();
        let inks = category(&f, "Inks", CategoryKind::Ink);
        item(&f, "Plastisol white", inks);
        item(&f, "Discharge base", inks);

        let first = f.catalog.items();
        assert_eq!(first, f.catalog.items());
        assert_eq!(first[0].item.name, "Discharge base");
    }
}
