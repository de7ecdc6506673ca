use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use super::ApiResponse;
use crate::access::OwnerRef;
use crate::api::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::DocumentationItem;
use crate::services::documentation::{self, NewDocumentationItem, WidgetWithItems};
use crate::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ParentQuery {
    pub parent_type: Option<String>,
    pub parent_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub parent_type: Option<String>,
    pub parent_id: Option<i64>,
    pub widget_id: Option<i64>,
    #[serde(flatten)]
    pub item: NewDocumentationItem,
}

#[derive(Deserialize)]
pub struct ReplaceItemsRequest {
    pub parent_type: String,
    pub parent_id: i64,
    pub items: Vec<NewDocumentationItem>,
}

fn parse_owner(parent_type: &str, parent_id: i64) -> Result<OwnerRef, AppError> {
    OwnerRef::parse(parent_type, parent_id)
        .ok_or_else(|| AppError::BadRequest(format!("invalid parent_type: {parent_type}")))
}

fn require_parent(query: &ParentQuery) -> Result<OwnerRef, AppError> {
    match (&query.parent_type, query.parent_id) {
        (Some(kind), Some(id)) => parse_owner(kind, id),
        _ => Err(AppError::BadRequest(
            "parent_type and parent_id are required".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/documentation — the owner's widgets with their items embedded
pub async fn list_widgets(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ParentQuery>,
) -> Result<Json<ApiResponse<Vec<WidgetWithItems>>>, AppError> {
    let owner = require_parent(&query)?;
    let widgets = documentation::list_widgets(&state.db, user.id, owner).await?;

    Ok(Json(ApiResponse::ok(widgets)))
}

/// GET /api/documentation-items — the owner's items flattened into display
/// order
pub async fn list_items(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ParentQuery>,
) -> Result<Json<ApiResponse<Vec<DocumentationItem>>>, AppError> {
    let owner = require_parent(&query)?;
    let items = documentation::list_items(&state.db, user.id, owner).await?;

    Ok(Json(ApiResponse::ok(items)))
}

/// POST /api/documentation-items — attach one block, either by owner pair
/// (widget implied, created on first use) or by explicit widget id
pub async fn create_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateItemRequest>,
) -> Result<Json<ApiResponse<DocumentationItem>>, AppError> {
    let item = match (&body.parent_type, body.parent_id, body.widget_id) {
        (Some(kind), Some(id), _) => {
            let owner = parse_owner(kind, id)?;
            documentation::add_item(&state.db, user.id, owner, &body.item).await?
        }
        (_, _, Some(widget_id)) => {
            documentation::add_item_to_widget(&state.db, user.id, widget_id, &body.item).await?
        }
        _ => {
            return Err(AppError::BadRequest(
                "either parent_type/parent_id or widget_id is required".into(),
            ))
        }
    };

    Ok(Json(ApiResponse::ok(item)))
}

/// PUT /api/documentation-items/replace — full-replace of an owner's block
/// list; order is assigned from list position
pub async fn replace_items(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<ReplaceItemsRequest>,
) -> Result<Json<ApiResponse<Vec<DocumentationItem>>>, AppError> {
    let owner = parse_owner(&body.parent_type, body.parent_id)?;
    let items = documentation::replace_all(&state.db, user.id, owner, &body.items).await?;

    Ok(Json(ApiResponse::ok(items)))
}

/// DELETE /api/documentation-items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    documentation::delete_item(&state.db, user.id, id).await?;

    Ok(Json(ApiResponse::ok(())))
}
