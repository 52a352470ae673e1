//! Database repository shared state and row helpers.
//!
//! Every mutating operation runs in one transaction whose first statement is
//! a write, so SQLite hands out the write lock before anything is read and
//! racing writers queue on the busy timeout instead of failing mid-way.

use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::{Language, Platform, Post, RevisionInfo, Version};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }
}

/// Increment the revision ID inside the caller's transaction.
pub(super) async fn bump_revision(conn: &mut SqliteConnection) -> Result<(), AppError> {
    let now = timestamp();
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(&now)
        .execute(conn)
        .await?;
    Ok(())
}

/// Fixed-width UTC timestamp, so stored values sort chronologically as text.
pub(super) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Store-level constraint a failed statement tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Constraint {
    GameName,
    VersionCode,
    ForeignKey,
    OtherUnique,
}

pub(super) fn violated_constraint(err: &sqlx::Error) -> Option<Constraint> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };

    if db_err.is_foreign_key_violation() {
        return Some(Constraint::ForeignKey);
    }
    if db_err.is_unique_violation() {
        let message = db_err.message();
        return Some(if message.contains("games.name_key") {
            Constraint::GameName
        } else if message.contains("versions.code") {
            Constraint::VersionCode
        } else {
            Constraint::OtherUnique
        });
    }
    None
}

pub(super) fn duplicate_code(code: &str) -> AppError {
    AppError::conflict("code", format!("A version with code {} already exists", code))
}

pub(super) fn duplicate_name(name: &str) -> AppError {
    AppError::conflict("name", format!("A game named \"{}\" already exists", name))
}

pub(super) fn languages_json(languages: &[Language]) -> Result<String, AppError> {
    serde_json::to_string(languages)
        .map_err(|e| AppError::Internal(format!("Could not encode language list: {}", e)))
}

/// Stored lists were validated on the way in, so an unreadable or empty
/// one means the row was damaged outside the API.
fn parse_languages(row: &SqliteRow, column: &str) -> Result<Vec<Language>, AppError> {
    let raw: String = row.get(column);
    match serde_json::from_str::<Vec<Language>>(&raw) {
        Ok(languages) if !languages.is_empty() => Ok(languages),
        Ok(_) => Err(AppError::Internal(format!("Stored {} is empty", column))),
        Err(e) => Err(AppError::Internal(format!(
            "Stored {} is not a language list: {}",
            column, e
        ))),
    }
}

fn platform_from_row(row: &SqliteRow) -> Result<Platform, AppError> {
    let raw: String = row.get("platform");
    Platform::parse(&raw)
        .ok_or_else(|| AppError::Internal(format!("Stored platform {} is not recognized", raw)))
}

// Helper functions for row conversion

pub(super) fn version_from_row(row: &SqliteRow) -> Result<Version, AppError> {
    let is_official: i32 = row.get("is_official");
    Ok(Version {
        id: row.get("id"),
        created_by: row.get("created_by"),
        platform: platform_from_row(row)?,
        code: row.get("code"),
        voice_languages: parse_languages(row, "voice_languages")?,
        subtitles_languages: parse_languages(row, "subtitles_languages")?,
        is_official: is_official != 0,
    })
}

pub(super) fn post_from_row(row: &SqliteRow) -> Result<Post, AppError> {
    Ok(Post {
        id: row.get("id"),
        created_by: row.get("created_by"),
        game_name: row.get("game_name"),
        platform: platform_from_row(row)?,
        code: row.get("code"),
        voice_languages: parse_languages(row, "voice_languages")?,
        subtitles_languages: parse_languages(row, "subtitles_languages")?,
        date: row.get("date"),
    })
}
