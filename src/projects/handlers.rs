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

use super::dto::{CreateProjectRequest, ProjectResponse, UpdateProjectRequest};
use super::services::{validate_create, validate_update};

const COLLECTION: &str = "projects";
const NOT_FOUND: &str = "Project not found";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id/image", get(get_project_image))
}

/// Write routes sit behind the auth gate.
pub fn write_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project))
        .route("/projects/:id", patch(update_project).delete(delete_project))
        .route(
            "/projects/:id/image",
            put(upload_project_image)
                .layer(DefaultBodyLimit::max(images::services::MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let (limit, offset) = p.bounds();
    let rows = state.projects.list(limit, offset).await?;
    Ok(Json(rows.into_iter().map(ProjectResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = state
        .projects
        .get(id)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    Ok(Json(project.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let Json(payload) = payload?;
    let new = validate_create(payload)?;
    let project = state.projects.create(new).await?;
    info!(project_id = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(project.into())))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> ApiResult<Json<ProjectResponse>> {
    let Json(payload) = payload?;
    let patch = validate_update(payload)?;
    let project = state
        .projects
        .update(id, patch)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    info!(project_id = %project.id, "project updated");
    Ok(Json(project.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let project = state
        .projects
        .delete(id)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    if let Some(key) = project.image_key.as_deref() {
        discard_image(state.storage.as_ref(), key).await;
    }
    info!(project_id = %id, "project deleted");
    Ok(Json(MessageResponse {
        message: "Project deleted",
    }))
}

#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn upload_project_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> ApiResult<Json<ProjectResponse>> {
    // Cheap existence check so we don't upload for a missing project.
    if state.projects.get(id).await?.is_none() {
        return Err(ApiError::NotFound(NOT_FOUND));
    }
    let item = read_image_field(mp).await?;
    let store = state.projects.clone();
    let project = replace_image(state.storage.as_ref(), COLLECTION, id, item, |key, ct| async move {
        store
            .set_image(id, &key, &ct)
            .await
            .map(|swap| swap.map(|s| (s.project, s.previous_image_key)))
    })
    .await?
    .ok_or(ApiError::NotFound(NOT_FOUND))?;
    Ok(Json(project.into()))
}

/// 307 to a short-lived presigned URL.
#[instrument(skip(state))]
pub async fn get_project_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Redirect> {
    let key = state
        .projects
        .get(id)
        .await?
        .and_then(|p| p.image_key)
        .ok_or(ApiError::NotFound("Image not found"))?;
    let url = presign_image(state.storage.as_ref(), &key).await?;
    Ok(Redirect::temporary(&url))
}
