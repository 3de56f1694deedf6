use std::sync::Arc;

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use teeforge_core::{AggregateId, ExpectedVersion};
use teeforge_events::{EventEnvelope, InMemoryEventBus};
use teeforge_infra::command_dispatcher::CommandDispatcher;
use teeforge_infra::event_store::{EventStore, InMemoryEventStore};
use teeforge_infra::projections::{InventoryItemReadModel, InventoryItemsProjection};
use teeforge_infra::read_model::InMemoryReadModelStore;
use teeforge_inventory::{
    ConsumeForNeed, CreateItem, ITEM_AGGREGATE_TYPE, InventoryCategoryId, InventoryCommand,
    InventoryItem, InventoryItemId, ItemDetails, ReceiveStock,
};

type Dispatcher =
    CommandDispatcher<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

fn dispatcher() -> Dispatcher {
    CommandDispatcher::new(
        Arc::new(InMemoryEventStore::new()),
        Arc::new(InMemoryEventBus::new()),
    )
}

fn details(category_id: InventoryCategoryId) -> ItemDetails {
    ItemDetails {
        name: "Cotton Jersey".to_string(),
        category_id,
        unit: "yards".to_string(),
        description: None,
    }
}

fn run(d: &Dispatcher, id: InventoryItemId, cmd: InventoryCommand) {
    d.dispatch(id.0, ITEM_AGGREGATE_TYPE, ExpectedVersion::Any, cmd, |agg| {
        InventoryItem::empty(InventoryItemId::new(agg))
    })
    .unwrap();
}

fn create(d: &Dispatcher, category_id: InventoryCategoryId) -> InventoryItemId {
    let id = InventoryItemId::new(AggregateId::new());
    run(
        d,
        id,
        InventoryCommand::CreateItem(CreateItem {
            item_id: id,
            details: details(category_id),
            stock: Decimal::from(100),
            pending_restock: None,
            occurred_at: Utc::now(),
        }),
    );
    id
}

/// Alternate needs and receipts so both reconciliation branches run.
fn churn(d: &Dispatcher, id: InventoryItemId, category_id: InventoryCategoryId, i: u64) {
    let cmd = if i % 2 == 0 {
        InventoryCommand::ConsumeForNeed(ConsumeForNeed {
            item_id: id,
            needed_qty: Decimal::from(30 + i % 50),
            occurred_at: Utc::now(),
        })
    } else {
        InventoryCommand::ReceiveStock(ReceiveStock {
            item_id: id,
            details: details(category_id),
            amount_added: Decimal::from(25 + i % 40),
            occurred_at: Utc::now(),
        })
    };
    run(d, id, cmd);
}

fn bench_command_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_latency");

    group.bench_function("create_item", |b| {
        let d = dispatcher();
        let category_id = InventoryCategoryId::new(AggregateId::new());
        b.iter(|| black_box(create(&d, category_id)));
    });

    for history in [1u64, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("consume_with_history", history),
            &history,
            |b, &history| {
                let d = dispatcher();
                let category_id = InventoryCategoryId::new(AggregateId::new());
                let id = create(&d, category_id);
                for i in 1..history {
                    churn(&d, id, category_id, i);
                }
                let mut i = 0u64;
                b.iter(|| {
                    i += 1;
                    churn(&d, id, category_id, black_box(i));
                });
            },
        );
    }

    group.finish();
}

fn bench_projection_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection_rebuild");

    for event_count in [100u64, 1000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("rebuild_items", event_count),
            &event_count,
            |b, &count| {
                let d = dispatcher();
                let category_id = InventoryCategoryId::new(AggregateId::new());
                let items: Vec<_> = (0..10).map(|_| create(&d, category_id)).collect();
                for i in 0..count.saturating_sub(10) {
                    churn(&d, items[(i % 10) as usize], category_id, i);
                }

                let envelopes: Vec<_> = d
                    .store()
                    .load_all(ITEM_AGGREGATE_TYPE)
                    .unwrap()
                    .iter()
                    .map(|e| e.to_envelope())
                    .collect();
                let projection = InventoryItemsProjection::new(InMemoryReadModelStore::<
                    InventoryItemId,
                    InventoryItemReadModel,
                >::new());

                b.iter(|| {
                    projection
                        .rebuild_from_scratch(black_box(envelopes.clone()))
                        .unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_command_latency, bench_projection_rebuild);
criterion_main!(benches);
