//! Projection implementations (read model builders).
//!
//! Projections consume published envelopes and maintain query-optimized
//! read models. All projections are:
//! - **Rebuildable**: reconstructed from the event store on demand
//! - **Idempotent**: envelopes at or below the stream cursor are skipped

pub mod cursor;
pub mod inventory_catalog;
pub mod inventory_categories;
pub mod inventory_items;

pub use cursor::{CursorCheck, ProjectionError, StreamCursors};
pub use inventory_catalog::{InventoryCatalog, InventoryItemView, UNKNOWN_CATEGORY};
pub use inventory_categories::{CategoryReadModel, InventoryCategoriesProjection};
pub use inventory_items::{InventoryItemReadModel, InventoryItemsProjection};
