use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::Redirect,
    routing::{get, patch, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, require_auth, AuthUser},
    db::Pagination,
    error::{ApiError, ApiResult},
    images::{self, discard_image, presign_image, read_image_field, replace_image},
    state::AppState,
};

use super::dto::{CreateBlogRequest, BlogResponse, UpdateBlogRequest};
use super::services::{validate_create, validate_update};

const COLLECTION: &str = "blogs";
const NOT_FOUND: &str = "Blog not found";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs))
        .route("/blogs/:id", get(get_blog))
        .route("/blogs/:id/image", get(get_blog_image))
}

/// Write routes sit behind the auth gate.
pub fn write_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/blogs", post(create_blog))
        .route("/blogs/:id", patch(update_blog).delete(delete_blog))
        .route(
            "/blogs/:id/image",
            put(upload_blog_image)
                .layer(DefaultBodyLimit::max(images::services::MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[instrument(skip(state))]
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<Vec<BlogResponse>>> {
    let (limit, offset) = p.bounds();
    let rows = state.blogs.list(limit, offset).await?;
    Ok(Json(rows.into_iter().map(BlogResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BlogResponse>> {
    let blog = state
        .blogs
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    Ok(Json(blog.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_blog(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateBlogRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BlogResponse>)> {
    let Json(payload) = payload?;
    let new = validate_create(payload)?;
    let blog = state.blogs.create(new).await?;
    info!(blog_id = %blog.id, "blog created");
    Ok((StatusCode::CREATED, Json(blog.into())))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_blog(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateBlogRequest>, JsonRejection>,
) -> ApiResult<Json<BlogResponse>> {
    let Json(payload) = payload?;
    let patch = validate_update(payload)?;
    let blog = state
        .blogs
        .update(id, patch)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    info!(blog_id = %blog.id, "blog updated");
    Ok(Json(blog.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_blog(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let blog = state
        .blogs
        .delete(id)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    if let Some(key) = blog.image_key.as_deref() {
        discard_image(state.storage.as_ref(), key).await;
    }
    info!(blog_id = %id, "blog deleted");
    Ok(Json(MessageResponse {
        message: "Blog deleted",
    }))
}

#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn upload_blog_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> ApiResult<Json<BlogResponse>> {
    // Cheap existence check so we don't upload for a missing blog.
    if state.blogs.get(id).await?.is_none() {
        return Err(ApiError::NotFound(NOT_FOUND));
    }
    let item = read_image_field(mp).await?;
    let store = state.blogs.clone();
    let blog = replace_image(state.storage.as_ref(), COLLECTION, id, item, |key, ct| async move {
        store
            .set_image(id, &key, &ct)
            .await
            .map(|swap| swap.map(|s| (s.blog, s.previous_image_key)))
    })
    .await?
    .ok_or(ApiError::NotFound(NOT_FOUND))?;
    Ok(Json(blog.into()))
}

/// 307 to a short-lived presigned URL.
#[instrument(skip(state))]
pub async fn get_blog_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Redirect> {
    let key = state
        .blogs
        .get(id)
        .await?
        .and_then(|p| p.image_key)
        .ok_or(ApiError::NotFound("Image not found"))?;
    let url = presign_image(state.storage.as_ref(), &key).await?;
    Ok(Redirect::temporary(&url))
}
