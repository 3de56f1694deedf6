use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use teeforge_infra::projections::{CategoryReadModel, InventoryItemView};
use teeforge_inventory::{CategoryKind, StockLevels};

// -------------------------
// Request DTOs
// -------------------------

/// Quantities accept JSON numbers or decimal strings.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub category_id: String,
    pub unit: String,
    pub stock: Decimal,
    pub pending_restock: Option<Decimal>,
    pub description: Option<String>,
}

/// Add-stock: `stock` is the amount received, not the new total.
#[derive(Debug, Deserialize)]
pub struct ReceiveStockRequest {
    pub name: String,
    pub category_id: String,
    pub unit: String,
    pub stock: Decimal,
    /// Accepted for compatibility with older clients; the stored backlog wins.
    pub pending_restock: Option<Decimal>,
    pub description: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceItemRequest {
    pub name: String,
    pub category_id: String,
    pub unit: String,
    pub stock: Decimal,
    pub pending_restock: Decimal,
    pub description: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    pub needed_qty: Decimal,
    pub expected_version: Option<u64>,
}

/// Query string of DELETE endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct VersionParams {
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub kind: CategoryKind,
    pub description: Option<String>,
    pub expected_version: Option<u64>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CommittedResponse {
    pub id: String,
    pub version: u64,
}

#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    pub id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub new_stock: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub new_pending: Decimal,
    pub version: u64,
}

impl ConsumeResponse {
    pub fn new(id: String, levels: StockLevels, version: u64) -> Self {
        Self {
            id,
            new_stock: levels.stock.value(),
            new_pending: levels.pending_restock.value(),
            version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub category_name: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub stock: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pending_restock: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl From<InventoryItemView> for ItemResponse {
    fn from(view: InventoryItemView) -> Self {
        let item = view.item;
        Self {
            id: item.item_id.to_string(),
            name: item.name,
            category_id: item.category_id.to_string(),
            category_name: view.category_name,
            unit: item.unit,
            stock: item.stock.value(),
            pending_restock: item.pending_restock.value(),
            description: item.description,
            created_at: item.created_at,
            updated_at: item.updated_at,
            version: item.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub kind: CategoryKind,
    pub description: Option<String>,
    pub version: u64,
}

impl From<CategoryReadModel> for CategoryResponse {
    fn from(rm: CategoryReadModel) -> Self {
        Self {
            id: rm.category_id.to_string(),
            name: rm.name,
            kind: rm.kind,
            description: rm.description,
            version: rm.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    #[test]
    fn quantities_accept_json_numbers() {
        let req: ConsumeRequest = serde_json::from_str(r#"{"needed_qty": 2.5}"#).unwrap();
        assert_eq!(req.needed_qty, Decimal::from_str("2.5").unwrap());
        assert_eq!(req.expected_version, None);
    }

    #[test]
    fn quantities_are_written_as_json_numbers() {
        let levels = StockLevels::new(
            teeforge_inventory::Quantity::new(Decimal::from_str("12.5").unwrap()).unwrap(),
            teeforge_inventory::Quantity::ZERO,
        );
        let json = serde_json::to_value(ConsumeResponse::new("x".to_string(), levels, 4)).unwrap();
        assert_eq!(json["new_stock"], serde_json::json!(12.5));
        assert_eq!(json["new_pending"], serde_json::json!(0.0));
        assert_eq!(json["version"], 4);
    }
}
