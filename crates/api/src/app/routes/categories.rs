use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use chrono::Utc;
use tracing::info;

use teeforge_core::{AggregateId, ExpectedVersion};
use teeforge_inventory::{
    CategoryCommand, CreateCategory, DeleteCategory, InventoryCategoryId, UpdateCategory,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
}

pub async fn list_categories(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let categories: Vec<dto::CategoryResponse> = services
        .catalog()
        .categories()
        .into_iter()
        .map(Into::into)
        .collect();
    Json(categories).into_response()
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CategoryRequest>,
) -> Response {
    let agg = AggregateId::new();
    let cmd = CategoryCommand::CreateCategory(CreateCategory {
        category_id: InventoryCategoryId::new(agg),
        name: body.name,
        kind: body.kind,
        description: body.description,
        occurred_at: Utc::now(),
    });

    match services.dispatch_category(agg, ExpectedVersion::Any, cmd) {
        Ok(done) => {
            info!(category_id = %agg, kind = body.kind.as_str(), "inventory category created");
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

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CategoryRequest>,
) -> Response {
    let agg = match errors::parse_id(&id, "category") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = CategoryCommand::UpdateCategory(UpdateCategory {
        category_id: InventoryCategoryId::new(agg),
        name: body.name,
        kind: body.kind,
        description: body.description,
        occurred_at: Utc::now(),
    });

    match services.dispatch_category(agg, body.expected_version.into(), cmd) {
        Ok(done) => Json(dto::CommittedResponse {
            id: agg.to_string(),
            version: done.version(),
        })
        .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// Items keep their dangling reference and read back as "Unknown".
pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<dto::VersionParams>,
) -> Response {
    let agg = match errors::parse_id(&id, "category") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = CategoryCommand::DeleteCategory(DeleteCategory {
        category_id: InventoryCategoryId::new(agg),
        occurred_at: Utc::now(),
    });

    match services.dispatch_category(agg, params.expected_version.into(), cmd) {
        Ok(_) => {
            info!(category_id = %agg, "inventory category deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
