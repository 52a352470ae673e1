//! Game catalog API endpoints.

use axum::extract::{Path, Query, State};

use super::{error, success, success_with_warnings, ApiResult, Json};
use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::{
    CurrentUser, Game, GameNameQuery, GameRequest, RemovedVersion, UpsertVersionRequest,
    VersionSubmission,
};
use crate::AppState;

/// GET /api/games - List all games with their versions.
pub async fn list_games(State(state): State<AppState>) -> ApiResult<Vec<Game>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_games().await {
        Ok(games) => success(games, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/games/by-name?name= - Case-insensitive lookup by name.
pub async fn find_game_by_name(
    State(state): State<AppState>,
    Query(query): Query<GameNameQuery>,
) -> ApiResult<Game> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let Some(name) = query.name.filter(|n| !n.trim().is_empty()) else {
        return error(AppError::validation("name", "Name is required"), revision_id);
    };

    match state.repo.find_game_by_name(&name).await {
        Ok(Some(game)) => success(game, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Game named \"{}\" not found", name.trim())),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/games/:id - Get a single game.
pub async fn get_game(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Game> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_game(&id).await {
        Ok(Some(game)) => success(game, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Game {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/games - Create a game with its initial versions.
pub async fn create_game(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(request): Json<GameRequest>,
) -> ApiResult<Game> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_game(&request, &admin).await {
        Ok(saved) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success_with_warnings(saved.game, new_revision, saved.warnings)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/games/:id - Replace a game's name and version list.
pub async fn put_game(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<GameRequest>,
) -> ApiResult<Game> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.put_game(&id, &request, &admin).await {
        Ok(saved) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success_with_warnings(saved.game, new_revision, saved.warnings)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/games/:id - Delete a game and all of its versions.
pub async fn delete_game(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_game(&id).await {
        Ok(()) => {
            tracing::info!("Game {} deleted by {}", id, admin.id);
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/games/upsert - Add a version to the named game, creating it if needed.
pub async fn upsert_game(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<UpsertVersionRequest>,
) -> ApiResult<Game> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.upsert_by_name(&request, &user).await {
        Ok(game) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(game, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/games/:id/versions - Add a version to an existing game.
pub async fn add_version(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(submission): Json<VersionSubmission>,
) -> ApiResult<Game> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.add_version(&game_id, &submission, &user).await {
        Ok(game) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(game, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/games/:id/versions/:version_id - Replace one version in place.
pub async fn replace_version(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path((game_id, version_id)): Path<(String, String)>,
    Json(submission): Json<VersionSubmission>,
) -> ApiResult<Game> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .repo
        .replace_version(&game_id, &version_id, &submission, &admin)
        .await
    {
        Ok(game) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(game, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/games/:id/versions/:version_id - Remove one version.
///
/// Removing the last version deletes the game as well.
pub async fn remove_version(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path((game_id, version_id)): Path<(String, String)>,
) -> ApiResult<RemovedVersion> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.remove_version(&game_id, &version_id).await {
        Ok(outcome) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(outcome, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
