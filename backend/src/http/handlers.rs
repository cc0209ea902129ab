//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for validation, ownership checks and persistence.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::dto::{
    ApiResponse, BoxEnvelope, CardBox, CardBoxDraft, CardBoxWithItems, HealthResponse,
    IssuedToken, Item, ItemDraft, ItemListQuery, ItemUpdateDraft, LoginDraft, MessageResponse,
    Page, PageQuery, Post, PostDraft, RegisterDraft, ReviewDraft, User,
};
use super::error::AppError;
use super::extract::{AuthUser, JsonBody};
use super::state::AppState;
use crate::api::{BoxId, ItemId, PostId};
use crate::db::repository::UserRepository;
use crate::services::{auth, boxes, items, posts};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Auth
// =============================================================================

/// POST /v1/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(draft): JsonBody<RegisterDraft>,
) -> CreatedResult<ApiResponse<IssuedToken>> {
    let issued = auth::register(state.repository.as_ref(), state.clock.as_ref(), draft).await?;
    info!(user_id = %issued.user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User registered successfully", issued)),
    ))
}

/// POST /v1/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(draft): JsonBody<LoginDraft>,
) -> HandlerResult<ApiResponse<IssuedToken>> {
    let issued = auth::login(state.repository.as_ref(), state.clock.as_ref(), draft).await?;
    info!(user_id = %issued.user.id, "user logged in");
    Ok(Json(ApiResponse::success("Login successful", issued)))
}

/// GET /v1/user
///
/// The authenticated user, unwrapped.
pub async fn current_user(AuthUser(user): AuthUser) -> HandlerResult<User> {
    Ok(Json(user))
}

// =============================================================================
// Posts
// =============================================================================

/// GET /v1/posts
pub async fn list_posts(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<PageQuery>,
) -> HandlerResult<ApiResponse<Page<Post>>> {
    let page = state.page(query.page, query.per_page);
    let posts = posts::list(state.repository.as_ref(), page).await?;
    Ok(Json(ApiResponse::data(posts)))
}

/// POST /v1/posts
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(draft): JsonBody<PostDraft>,
) -> CreatedResult<ApiResponse<Post>> {
    let post = posts::create(state.repository.as_ref(), state.clock.as_ref(), &user, draft).await?;
    info!(user_id = %user.id, post_id = %post.id, "post created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Post created successfully", post)),
    ))
}

/// GET /v1/posts/{id}
pub async fn show_post(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<i64>,
) -> HandlerResult<ApiResponse<Post>> {
    let post = posts::show(state.repository.as_ref(), PostId::new(id)).await?;
    Ok(Json(ApiResponse::data(post)))
}

/// PUT/PATCH /v1/posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    JsonBody(draft): JsonBody<PostDraft>,
) -> HandlerResult<ApiResponse<Post>> {
    let post = posts::update(
        state.repository.as_ref(),
        state.clock.as_ref(),
        &user,
        PostId::new(id),
        draft,
    )
    .await?;
    Ok(Json(ApiResponse::success("Post updated successfully", post)))
}

/// DELETE /v1/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    posts::delete(state.repository.as_ref(), &user, PostId::new(id)).await?;
    info!(user_id = %user.id, post_id = id, "post deleted");
    Ok(Json(MessageResponse::success("Post deleted successfully")))
}

// =============================================================================
// Boxes
// =============================================================================

/// GET /v1/boxes
///
/// The caller's boxes, paginated.
pub async fn list_boxes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> HandlerResult<ApiResponse<Page<CardBox>>> {
    let page = state.page(query.page, query.per_page);
    let boxes = boxes::list(state.repository.as_ref(), &user, page).await?;
    Ok(Json(ApiResponse::success("Boxes retrieved successfully", boxes)))
}

/// POST /v1/boxes
pub async fn create_box(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(draft): JsonBody<CardBoxDraft>,
) -> CreatedResult<ApiResponse<CardBox>> {
    let card_box =
        boxes::create(state.repository.as_ref(), state.clock.as_ref(), &user, draft).await?;
    info!(user_id = %user.id, box_id = %card_box.id, "box created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Box created successfully", card_box)),
    ))
}

/// GET /v1/boxes/{id}
///
/// The box with all of its items under `data.box`.
pub async fn show_box(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> HandlerResult<ApiResponse<BoxEnvelope<CardBoxWithItems>>> {
    let card_box = boxes::show(state.repository.as_ref(), &user, BoxId::new(id)).await?;
    Ok(Json(ApiResponse::success(
        "Box retrieved successfully",
        BoxEnvelope { card_box },
    )))
}

/// PUT/PATCH /v1/boxes/{id}
pub async fn update_box(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    JsonBody(draft): JsonBody<CardBoxDraft>,
) -> HandlerResult<ApiResponse<CardBox>> {
    let card_box = boxes::update(
        state.repository.as_ref(),
        state.clock.as_ref(),
        &user,
        BoxId::new(id),
        draft,
    )
    .await?;
    Ok(Json(ApiResponse::success("Box updated successfully", card_box)))
}

/// DELETE /v1/boxes/{id}
///
/// Removes the box and every item in it.
pub async fn delete_box(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    boxes::delete(state.repository.as_ref(), &user, BoxId::new(id)).await?;
    info!(user_id = %user.id, box_id = id, "box deleted");
    Ok(Json(MessageResponse::success("Box deleted successfully")))
}

// =============================================================================
// Items
// =============================================================================

/// GET /v1/items
///
/// The caller's items, soonest due first. `?box_id=` narrows to one box and
/// `?due=true` drops items that are not due yet.
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ItemListQuery>,
) -> HandlerResult<ApiResponse<Page<Item>>> {
    let page = state.page(query.page, query.per_page);
    let items = items::list(
        state.repository.as_ref(),
        state.clock.as_ref(),
        &user,
        query.box_id.map(BoxId::new),
        query.due.unwrap_or(false),
        page,
    )
    .await?;
    Ok(Json(ApiResponse::success("Items retrieved successfully", items)))
}

/// POST /v1/items
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(draft): JsonBody<ItemDraft>,
) -> CreatedResult<ApiResponse<Item>> {
    let item = items::create(state.repository.as_ref(), state.clock.as_ref(), &user, draft).await?;
    info!(user_id = %user.id, item_id = %item.id, box_id = %item.box_id, "item created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Item added successfully to the box", item)),
    ))
}

/// GET /v1/items/{id}
pub async fn show_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> HandlerResult<ApiResponse<Item>> {
    let item = items::show(state.repository.as_ref(), &user, ItemId::new(id)).await?;
    Ok(Json(ApiResponse::success("Item retrieved successfully", item)))
}

/// PUT/PATCH /v1/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    JsonBody(draft): JsonBody<ItemUpdateDraft>,
) -> HandlerResult<ApiResponse<Item>> {
    let item = items::update(
        state.repository.as_ref(),
        state.clock.as_ref(),
        &user,
        ItemId::new(id),
        draft,
    )
    .await?;
    Ok(Json(ApiResponse::success("Item updated successfully", item)))
}

/// DELETE /v1/items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> HandlerResult<MessageResponse> {
    items::delete(state.repository.as_ref(), &user, ItemId::new(id)).await?;
    info!(user_id = %user.id, item_id = id, "item deleted");
    Ok(Json(MessageResponse::success("Item deleted successfully")))
}

/// POST /v1/items/{id}/level
///
/// Record a review (`{"is_true": bool}`) and move the item along the level table.
pub async fn record_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    JsonBody(draft): JsonBody<ReviewDraft>,
) -> HandlerResult<ApiResponse<Item>> {
    let item = items::record_review(
        state.repository.as_ref(),
        &state.scheduler,
        state.clock.as_ref(),
        &user,
        ItemId::new(id),
        draft,
    )
    .await?;
    info!(item_id = id, level = item.level, show_date = %item.show_date, "item reviewed");
    Ok(Json(ApiResponse::success("Item level updated successfully", item)))
}
