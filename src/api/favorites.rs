//! Favorites of the signed-in user.

use axum::extract::{Path, State};

use super::{error, success, ApiResult, Json};
use crate::models::{CurrentUser, Favorite, FavoriteRequest, FavoriteToggle};
use crate::AppState;

/// GET /api/me/favorites - The caller's raw favorite set.
pub async fn list_favorites(
    user: CurrentUser,
    State(state): State<AppState>,
) -> ApiResult<Vec<Favorite>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_favorites(&user.id).await {
        Ok(favorites) => success(favorites, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/me/favorites - Toggle one (game, version) pair.
pub async fn toggle_favorite(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<FavoriteRequest>,
) -> ApiResult<FavoriteToggle> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .repo
        .toggle_favorite(&user.id, &request.game_id, &request.version_id)
        .await
    {
        Ok(toggle) => success(toggle, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/me/favorites - Clear the caller's favorites.
pub async fn clear_favorites(user: CurrentUser, State(state): State<AppState>) -> ApiResult<u64> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.clear_favorites(&user.id).await {
        Ok(removed) => success(removed, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/me/favorites/:game_id/:version_id - Remove one favorite.
///
/// Removing a favorite that is not there still succeeds.
pub async fn remove_favorite(
    user: CurrentUser,
    State(state): State<AppState>,
    Path((game_id, version_id)): Path<(String, String)>,
) -> ApiResult<FavoriteToggle> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .repo
        .remove_favorite(&user.id, &game_id, &version_id)
        .await
    {
        Ok(_) => success(FavoriteToggle { favorited: false }, revision_id),
        Err(e) => error(e, revision_id),
    }
}
