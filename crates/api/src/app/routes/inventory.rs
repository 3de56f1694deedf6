use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use tracing::{debug, info};

use teeforge_core::{AggregateId, ExpectedVersion};
use teeforge_inventory::{
    ConsumeForNeed, CreateItem, DeleteItem, InventoryCategoryId, InventoryCommand, InventoryItemId,
    ItemDetails, ReceiveStock, ReplaceItem,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item).put(replace_item).delete(delete_item))
        .route("/items/:id/receive", post(receive_stock))
        .route("/items/:id/consume", post(consume_for_need))
        .route("/textiles", get(list_textiles))
}

fn item_details(
    name: String,
    category_id: &str,
    unit: String,
    description: Option<String>,
) -> Result<ItemDetails, Response> {
    let category_id = InventoryCategoryId::new(errors::parse_id(category_id, "category")?);
    Ok(ItemDetails {
        name,
        category_id,
        unit,
        description,
    })
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateItemRequest>,
) -> Response {
    let details = match item_details(body.name, &body.category_id, body.unit, body.description) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let agg = AggregateId::new();
    let cmd = InventoryCommand::CreateItem(CreateItem {
        item_id: InventoryItemId::new(agg),
        details,
        stock: body.stock,
        pending_restock: body.pending_restock,
        occurred_at: Utc::now(),
    });

    match services.dispatch_item(agg, ExpectedVersion::Any, cmd) {
        Ok(done) => {
            info!(item_id = %agg, "inventory item created");
            (
                StatusCode::CREATED,
                Json(dto::CommittedResponse {
                    id: agg.to_string(),
                    version: done.version(),
                }),
            )
                .into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn list_items(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let items: Vec<dto::ItemResponse> = services
        .catalog()
        .items()
        .into_iter()
        .map(Into::into)
        .collect();
    Json(items).into_response()
}

pub async fn list_textiles(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let items: Vec<dto::ItemResponse> = services
        .catalog()
        .textiles()
        .into_iter()
        .map(Into::into)
        .collect();
    Json(items).into_response()
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let agg = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog().item(&InventoryItemId::new(agg)) {
        Some(view) => Json(dto::ItemResponse::from(view)).into_response(),
        None => errors::not_found("item"),
    }
}

/// Add-stock: details are replaced, `stock` is received against the backlog.
pub async fn receive_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveStockRequest>,
) -> Response {
    let agg = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let details = match item_details(body.name, &body.category_id, body.unit, body.description) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    if let Some(ignored) = body.pending_restock {
        debug!(item_id = %agg, %ignored, "pending_restock on receive is ignored");
    }

    let cmd = InventoryCommand::ReceiveStock(ReceiveStock {
        item_id: InventoryItemId::new(agg),
        details,
        amount_added: body.stock,
        occurred_at: Utc::now(),
    });

    match services.dispatch_item(agg, body.expected_version.into(), cmd) {
        Ok(done) => Json(dto::CommittedResponse {
            id: agg.to_string(),
            version: done.version(),
        })
        .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// Edit-replace: both levels are set to exactly what was sent.
pub async fn replace_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReplaceItemRequest>,
) -> Response {
    let agg = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let details = match item_details(body.name, &body.category_id, body.unit, body.description) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let cmd = InventoryCommand::ReplaceItem(ReplaceItem {
        item_id: InventoryItemId::new(agg),
        details,
        stock: body.stock,
        pending_restock: body.pending_restock,
        occurred_at: Utc::now(),
    });

    match services.dispatch_item(agg, body.expected_version.into(), cmd) {
        Ok(done) => Json(dto::CommittedResponse {
            id: agg.to_string(),
            version: done.version(),
        })
        .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn consume_for_need(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ConsumeRequest>,
) -> Response {
    let agg = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = InventoryCommand::ConsumeForNeed(ConsumeForNeed {
        item_id: InventoryItemId::new(agg),
        needed_qty: body.needed_qty,
        occurred_at: Utc::now(),
    });

    match services.dispatch_item(agg, body.expected_version.into(), cmd) {
        Ok(done) => {
            let levels = done.aggregate.levels();
            if levels.has_backlog() {
                info!(item_id = %agg, pending = %levels.pending_restock, "item has outstanding backlog");
            }
            Json(dto::ConsumeResponse::new(agg.to_string(), levels, done.version())).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<dto::VersionParams>,
) -> Response {
    let agg = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = InventoryCommand::DeleteItem(DeleteItem {
        item_id: InventoryItemId::new(agg),
        occurred_at: Utc::now(),
    });

    match services.dispatch_item(agg, params.expected_version.into(), cmd) {
        Ok(_) => {
            info!(item_id = %agg, "inventory item deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
