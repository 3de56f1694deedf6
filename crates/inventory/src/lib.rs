//! Inventory domain module (event-sourced).
//!
//! Business rules for inventory items and their categories, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage). The stock /
//! pending-restock reconciliation lives in [`levels`].

pub mod category;
pub mod item;
pub mod levels;
pub mod quantity;

pub use category::{
    CategoryCommand, CategoryCreated, CategoryDeleted, CategoryEvent, CategoryKind,
    CategoryUpdated, CreateCategory, DeleteCategory, InventoryCategory, InventoryCategoryId,
    UpdateCategory,
};
pub use item::{
    ConsumeForNeed, CreateItem, DeleteItem, InventoryCommand, InventoryEvent, InventoryItem,
    InventoryItemId, ItemCreated, ItemDeleted, ItemDetails, ItemDetailsUpdated, LevelsReplaced,
    ReceiveStock, ReplaceItem, StockConsumed, StockReceived,
};
pub use levels::StockLevels;
pub use quantity::Quantity;

/// Aggregate type name of inventory item streams.
pub const ITEM_AGGREGATE_TYPE: &str = "inventory.item";

/// Aggregate type name of inventory category streams.
pub const CATEGORY_AGGREGATE_TYPE: &str = "inventory.category";
