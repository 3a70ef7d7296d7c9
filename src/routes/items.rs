use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde_json::Value;

use crate::{
    dto::items::{ConformanceReport, ItemList, RecentItemList},
    error::AppResult,
    models::ItemDetail,
    response::ApiResponse,
    routes::params::{ItemQuery, RecentQuery},
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items))
        .route("/recent", get(list_recent_items))
        .route("/conformance", post(check_conformance))
        .route("/{item_id}", get(get_item))
}

#[utoipa::path(
    get,
    path = "/api/items",
    params(ItemQuery),
    responses(
        (status = 200, description = "Paginated item summaries", body = ApiResponse<ItemList>),
        (status = 400, description = "Malformed filter"),
    ),
    tag = "Items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    let resp = catalog_service::list_items(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/items/recent",
    params(RecentQuery),
    responses(
        (status = 200, description = "Newest items with thumbnail", body = ApiResponse<RecentItemList>),
    ),
    tag = "Items"
)]
pub async fn list_recent_items(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<ApiResponse<RecentItemList>>> {
    let resp = catalog_service::list_recent_items(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/items/{item_id}",
    params(
        ("item_id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item detail", body = ApiResponse<ItemDetail>),
        (status = 404, description = "Item not found"),
    ),
    tag = "Items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> AppResult<Json<ApiResponse<ItemDetail>>> {
    let resp = catalog_service::get_item_detail(&state, item_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/items/conformance",
    request_body(content = ItemDetail, description = "Candidate item detail payload"),
    responses(
        (status = 200, description = "Payload has the item detail shape", body = ApiResponse<ConformanceReport>),
        (status = 422, description = "Payload does not have the item detail shape"),
    ),
    tag = "Items"
)]
pub async fn check_conformance(
    Json(payload): Json<Value>,
) -> AppResult<Json<ApiResponse<ConformanceReport>>> {
    let resp = catalog_service::check_conformance(payload)?;
    Ok(Json(resp))
}
