//! Reaction API endpoints.

use axum::extract::{Path, State};

use super::{error, success, ApiResult, Json};
use crate::auth::MaybeUser;
use crate::errors::AppError;
use crate::models::{CurrentUser, ReactRequest, ReactionCounts, ReactionStat, ReactionType};
use crate::AppState;

/// GET /api/posts/:id/reactions - Counts, plus the caller's vote if signed in.
pub async fn get_reactions(
    MaybeUser(user): MaybeUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<ReactionCounts> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let caller = user.as_ref().map(|u| u.id.as_str());

    match state.repo.reaction_counts(&post_id, caller).await {
        Ok(counts) => success(counts, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/posts/:id/reactions - Toggle a like or dislike.
pub async fn react(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(request): Json<ReactRequest>,
) -> ApiResult<ReactionCounts> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let Some(reaction_type) = ReactionType::parse(request.reaction_type.trim()) else {
        return error(
            AppError::validation("reactionType", "Reaction type must be \"like\" or \"dislike\""),
            revision_id,
        );
    };

    match state.repo.react(&post_id, &user.id, reaction_type).await {
        Ok(counts) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(counts, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/posts/:id/reactions/stats - Per-type counts with voters.
pub async fn get_reaction_stats(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Vec<ReactionStat>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.reaction_stats(&post_id).await {
        Ok(stats) => success(stats, revision_id),
        Err(e) => error(e, revision_id),
    }
}
