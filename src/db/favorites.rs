//! Favorite set: per-user toggle membership of (game, version) pairs.

use std::collections::BTreeSet;

use sqlx::Row;

use super::repository::{timestamp, Repository};
use crate::errors::{AppError, FieldError};
use crate::models::{Favorite, FavoriteToggle, PruneReport};

impl Repository {
    /// Add the pair if absent, remove it if present.
    pub async fn toggle_favorite(
        &self,
        user_id: &str,
        game_id: &str,
        version_id: &str,
    ) -> Result<FavoriteToggle, AppError> {
        require_ids(game_id, version_id)?;

        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM favorites WHERE user_id = ? AND game_id = ? AND version_id = ?",
        )
        .bind(user_id)
        .bind(game_id)
        .bind(version_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            sqlx::query(
                "INSERT INTO favorites (user_id, game_id, version_id, created_at) VALUES (?, ?, ?, ?) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(game_id)
            .bind(version_id)
            .bind(timestamp())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(FavoriteToggle {
            favorited: removed == 0,
        })
    }

    /// The user's raw favorite set, oldest first. Entries may be stale.
    pub async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, AppError> {
        let rows = sqlx::query(
            "SELECT game_id, version_id, created_at FROM favorites WHERE user_id = ? ORDER BY created_at, game_id, version_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Favorite {
                game_id: row.get("game_id"),
                version_id: row.get("version_id"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Remove one pair. Returns whether it was present.
    pub async fn remove_favorite(
        &self,
        user_id: &str,
        game_id: &str,
        version_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM favorites WHERE user_id = ? AND game_id = ? AND version_id = ?",
        )
        .bind(user_id)
        .bind(game_id)
        .bind(version_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every favorite of a user. Returns how many were removed.
    pub async fn clear_favorites(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Maintenance pass: drop favorites whose game or version no longer exists.
    pub async fn prune_favorites(&self) -> Result<PruneReport, AppError> {
        let rows = sqlx::query(
            r#"DELETE FROM favorites
            WHERE NOT EXISTS (
                SELECT 1 FROM versions v
                WHERE v.id = favorites.version_id AND v.game_id = favorites.game_id
            )
            RETURNING user_id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let users: BTreeSet<String> = rows.iter().map(|row| row.get("user_id")).collect();
        let report = PruneReport {
            users_touched: users.len() as u64,
            removed: rows.len() as u64,
        };

        tracing::info!(
            "Pruned {} stale favorite(s) for {} user(s)",
            report.removed,
            report.users_touched
        );
        Ok(report)
    }
}

fn require_ids(game_id: &str, version_id: &str) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if game_id.trim().is_empty() {
        errors.push(FieldError::new("gameID", "Game ID is required"));
    }
    if version_id.trim().is_empty() {
        errors.push(FieldError::new("versionID", "Version ID is required"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
