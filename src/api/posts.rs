//! Post API endpoints.

use axum::extract::{Path, Query, State};

use super::{error, success, success_with_warnings, ApiResult, Json};
use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::{CurrentUser, Post, PostFilter, PostRequest, Released};
use crate::promotion;
use crate::AppState;

/// GET /api/posts - List posts, newest first.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> ApiResult<Vec<Post>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_posts(&filter).await {
        Ok(posts) => success(posts, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/posts/:id - Get a single post.
pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Post> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_post(&id).await {
        Ok(Some(post)) => success(post, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Post {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/posts - Propose a new version.
pub async fn create_post(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<PostRequest>,
) -> ApiResult<Post> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_post(&request, &user).await {
        Ok(post) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(post, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Load a post and check that `user` may change it.
async fn owned_post(state: &AppState, id: &str, user: &CurrentUser) -> Result<Post, AppError> {
    let post = state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    if !user.can_modify(&post.created_by) {
        return Err(AppError::Forbidden(
            "Only the author or an admin can change this post".to_string(),
        ));
    }
    Ok(post)
}

/// PUT /api/posts/:id - Edit a post (author or admin).
pub async fn update_post(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PostRequest>,
) -> ApiResult<Post> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = owned_post(&state, &id, &user).await {
        return error(e, revision_id);
    }

    match state.repo.update_post(&id, &request).await {
        Ok(post) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(post, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/posts/:id - Delete a post and its reactions (author or admin).
pub async fn delete_post(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = owned_post(&state, &id, &user).await {
        return error(e, revision_id);
    }

    match state.repo.delete_post(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/posts/:id/release - Promote a post into the catalog.
pub async fn release_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Released> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match promotion::promote(&state.repo, &id, &admin).await {
        Ok(promotion) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success_with_warnings(promotion.released, new_revision, promotion.warnings)
        }
        Err(e) => error(e, revision_id),
    }
}
