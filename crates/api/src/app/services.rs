use std::sync::Arc;

use serde_json::Value as JsonValue;

use teeforge_core::{AggregateId, ExpectedVersion};
use teeforge_events::{EventEnvelope, InMemoryEventBus};
use teeforge_infra::{
    command_dispatcher::{CommandDispatcher, DispatchError, Dispatched},
    event_store::InMemoryEventStore,
    projections::{
        CategoryReadModel, InventoryCatalog, InventoryCategoriesProjection, InventoryItemReadModel,
        InventoryItemsProjection,
    },
    read_model::InMemoryReadModelStore,
    workers::{ProjectionWorker, WorkerHandle},
};
use teeforge_inventory::{
    CATEGORY_AGGREGATE_TYPE, CategoryCommand, ITEM_AGGREGATE_TYPE, InventoryCategory,
    InventoryCategoryId, InventoryCommand, InventoryItem, InventoryItemId,
};

pub type EnvelopeBus = InMemoryEventBus<EventEnvelope<JsonValue>>;
type InMemoryDispatcher = CommandDispatcher<Arc<InMemoryEventStore>, Arc<EnvelopeBus>>;
type ItemStore = InMemoryReadModelStore<InventoryItemId, InventoryItemReadModel>;
type CategoryStore = InMemoryReadModelStore<InventoryCategoryId, CategoryReadModel>;
pub type Catalog = InventoryCatalog<ItemStore, CategoryStore>;

/// Infrastructure shared by all handlers: the command pipeline and the
/// read side it feeds.
#[derive(Debug)]
pub struct AppServices {
    dispatcher: InMemoryDispatcher,
    catalog: Catalog,
    _projection_worker: WorkerHandle,
}

/// In-memory wiring: store + bus + projections, with a background worker
/// applying every published envelope to both projections.
pub fn build_services() -> std::io::Result<AppServices> {
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Arc<EnvelopeBus> = Arc::new(InMemoryEventBus::new());

    let items = Arc::new(InventoryItemsProjection::new(ItemStore::new()));
    let categories = Arc::new(InventoryCategoriesProjection::new(CategoryStore::new()));

    let worker = {
        let items = Arc::clone(&items);
        let categories = Arc::clone(&categories);
        ProjectionWorker::spawn("inventory-projections", &*bus, move |env: EventEnvelope<JsonValue>| {
            match env.aggregate_type() {
                ITEM_AGGREGATE_TYPE => items.apply_envelope(&env),
                CATEGORY_AGGREGATE_TYPE => categories.apply_envelope(&env),
                _ => Ok(()),
            }
        })?
    };

    Ok(AppServices {
        dispatcher: CommandDispatcher::new(store, bus),
        catalog: InventoryCatalog::new(items, categories),
        _projection_worker: worker,
    })
}

impl AppServices {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn dispatch_item(
        &self,
        aggregate_id: AggregateId,
        expected: ExpectedVersion,
        command: InventoryCommand,
    ) -> Result<Dispatched<InventoryItem>, DispatchError> {
        self.dispatcher
            .dispatch(aggregate_id, ITEM_AGGREGATE_TYPE, expected, command, |id| {
                InventoryItem::empty(InventoryItemId::new(id))
            })
    }

    pub fn dispatch_category(
        &self,
        aggregate_id: AggregateId,
        expected: ExpectedVersion,
        command: CategoryCommand,
    ) -> Result<Dispatched<InventoryCategory>, DispatchError> {
        self.dispatcher
            .dispatch(aggregate_id, CATEGORY_AGGREGATE_TYPE, expected, command, |id| {
                InventoryCategory::empty(InventoryCategoryId::new(id))
            })
    }
}
