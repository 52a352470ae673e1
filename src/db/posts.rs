//! Post lifecycle: proposals that live outside the catalog until released.

use super::repository::{bump_revision, languages_json, new_id, post_from_row, timestamp, Repository};
use crate::errors::AppError;
use crate::models::{CurrentUser, Post, PostFilter, PostRequest};
use crate::normalize::normalize_post;

const POST_COLUMNS: &str =
    "id, created_by, game_name, platform, code, voice_languages, subtitles_languages, date";

impl Repository {
    /// List posts, newest first, optionally only those by one author.
    pub async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, AppError> {
        let rows = match &filter.created_by {
            Some(author) => {
                sqlx::query(&format!(
                    "SELECT {} FROM posts WHERE created_by = ? ORDER BY date DESC, id",
                    POST_COLUMNS
                ))
                .bind(author)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM posts ORDER BY date DESC, id",
                    POST_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(post_from_row).collect()
    }

    /// Get a post by ID.
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    /// Create a new post authored by `author`.
    pub async fn create_post(
        &self,
        request: &PostRequest,
        author: &CurrentUser,
    ) -> Result<Post, AppError> {
        let (game_name, fields) = normalize_post(request).map_err(AppError::Validation)?;
        let id = new_id();
        let now = timestamp();

        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        sqlx::query(
            "INSERT INTO posts (id, created_by, game_name, platform, code, voice_languages, subtitles_languages, date) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&author.id)
        .bind(&game_name)
        .bind(fields.platform.as_str())
        .bind(&fields.code)
        .bind(languages_json(&fields.voice_languages)?)
        .bind(languages_json(&fields.subtitles_languages)?)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Post {
            id,
            created_by: author.id.clone(),
            game_name,
            platform: fields.platform,
            code: fields.code,
            voice_languages: fields.voice_languages,
            subtitles_languages: fields.subtitles_languages,
            date: now,
        })
    }

    /// Replace a post's content. Author and date are kept.
    ///
    /// Who may do this is decided by the caller.
    pub async fn update_post(&self, id: &str, request: &PostRequest) -> Result<Post, AppError> {
        let (game_name, fields) = normalize_post(request).map_err(AppError::Validation)?;

        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        let result = sqlx::query(
            "UPDATE posts SET game_name = ?, platform = ?, code = ?, voice_languages = ?, subtitles_languages = ? WHERE id = ?",
        )
        .bind(&game_name)
        .bind(fields.platform.as_str())
        .bind(&fields.code)
        .bind(languages_json(&fields.voice_languages)?)
        .bind(languages_json(&fields.subtitles_languages)?)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(post_not_found(id));
        }

        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let post = post_from_row(&row)?;

        tx.commit().await?;
        Ok(post)
    }

    /// Delete a post together with every reaction pointing at it.
    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        let reactions = sqlx::query("DELETE FROM reactions WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(post_not_found(id));
        }

        tx.commit().await?;
        tracing::debug!("Deleted post {} and {} reaction(s)", id, reactions);
        Ok(())
    }
}

pub(super) fn post_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Post {} not found", id))
}
