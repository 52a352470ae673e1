//! Game catalog store.
//!
//! Games are keyed by a case-folded name and own their versions through
//! `versions.game_id`. Version codes are unique across the whole catalog.

use std::collections::HashMap;

use sqlx::{Row, SqliteConnection};

use super::repository::{
    bump_revision, duplicate_code, duplicate_name, languages_json, new_id, timestamp,
    version_from_row, violated_constraint, Constraint, Repository,
};
use crate::errors::AppError;
use crate::models::{
    CurrentUser, Game, GameRequest, NewVersion, RemovedVersion, SavedGame, UpsertVersionRequest,
    Version, VersionSubmission,
};
use crate::normalize::{
    dedupe_by_code, name_key, normalize_game, normalize_name, normalize_version, stamp,
};

const VERSION_COLUMNS: &str = "id, game_id, created_by, platform, code, voice_languages, subtitles_languages, is_official";

impl Repository {
    /// List all games sorted by name, each with versions sorted by code.
    pub async fn list_games(&self) -> Result<Vec<Game>, AppError> {
        // One read transaction so both queries see the same snapshot.
        let mut tx = self.pool.begin().await?;

        let game_rows = sqlx::query("SELECT id, name FROM games ORDER BY name, id")
            .fetch_all(&mut *tx)
            .await?;
        let version_rows = sqlx::query(&format!(
            "SELECT {} FROM versions ORDER BY code",
            VERSION_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut versions_by_game: HashMap<String, Vec<Version>> = HashMap::new();
        for row in &version_rows {
            let game_id: String = row.get("game_id");
            versions_by_game
                .entry(game_id)
                .or_default()
                .push(version_from_row(row)?);
        }

        Ok(game_rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                let versions = versions_by_game.remove(&id).unwrap_or_default();
                Game {
                    id,
                    name: row.get("name"),
                    versions,
                }
            })
            .collect())
    }

    /// Get a game by ID.
    pub async fn get_game(&self, id: &str) -> Result<Option<Game>, AppError> {
        let mut tx = self.pool.begin().await?;
        let game = load_game(&mut tx, GameKey::Id(id)).await?;
        tx.commit().await?;
        Ok(game)
    }

    /// Find a game by name, ignoring case.
    pub async fn find_game_by_name(&self, name: &str) -> Result<Option<Game>, AppError> {
        let key = name_key(name);
        let mut tx = self.pool.begin().await?;
        let game = load_game(&mut tx, GameKey::NameKey(&key)).await?;
        tx.commit().await?;
        Ok(game)
    }

    /// Create a game with an initial batch of versions.
    ///
    /// Later entries repeating an earlier code are dropped with a warning.
    pub async fn create_game(
        &self,
        request: &GameRequest,
        submitter: &CurrentUser,
    ) -> Result<SavedGame, AppError> {
        let (name, versions) = normalize_game(request).map_err(AppError::Validation)?;
        let (versions, warnings) = dedupe_by_code(versions);
        for warning in &warnings {
            tracing::warn!("createGame {}: {}", name, warning);
        }

        let id = new_id();
        let now = timestamp();

        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        sqlx::query("INSERT INTO games (id, name, name_key, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&name)
            .bind(name_key(&name))
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| game_write_error(e, &name))?;

        for fields in versions {
            insert_version(&mut tx, &id, &new_version_id(), &stamp(fields, submitter)).await?;
        }

        let game = load_game(&mut tx, GameKey::Id(&id))
            .await?
            .ok_or_else(|| AppError::Internal(format!("Game {} vanished during create", id)))?;
        tx.commit().await?;

        tracing::info!("Created game {} ({}) with {} version(s)", game.name, game.id, game.versions.len());
        Ok(SavedGame { game, warnings })
    }

    /// Replace a game's name and full version list.
    ///
    /// Versions whose code is unchanged keep their ID so favorites still resolve.
    pub async fn put_game(
        &self,
        id: &str,
        request: &GameRequest,
        submitter: &CurrentUser,
    ) -> Result<SavedGame, AppError> {
        let (name, versions) = normalize_game(request).map_err(AppError::Validation)?;
        let (versions, warnings) = dedupe_by_code(versions);
        for warning in &warnings {
            tracing::warn!("putGame {}: {}", id, warning);
        }

        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        let result = sqlx::query("UPDATE games SET name = ?, name_key = ? WHERE id = ?")
            .bind(&name)
            .bind(name_key(&name))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| game_write_error(e, &name))?;

        if result.rows_affected() == 0 {
            return Err(game_not_found(id));
        }

        let existing_ids: HashMap<String, String> =
            sqlx::query("SELECT id, code FROM versions WHERE game_id = ?")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?
                .iter()
                .map(|row| (row.get("code"), row.get("id")))
                .collect();

        sqlx::query("DELETE FROM versions WHERE game_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for fields in versions {
            let version_id = existing_ids
                .get(&fields.code)
                .cloned()
                .unwrap_or_else(new_version_id);
            insert_version(&mut tx, id, &version_id, &stamp(fields, submitter)).await?;
        }

        let game = load_game(&mut tx, GameKey::Id(id))
            .await?
            .ok_or_else(|| game_not_found(id))?;
        tx.commit().await?;

        Ok(SavedGame { game, warnings })
    }

    /// Delete a game and every version it owns.
    pub async fn delete_game(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        sqlx::query("DELETE FROM versions WHERE game_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM games WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(game_not_found(id));
        }

        tx.commit().await?;
        tracing::info!("Deleted game {}", id);
        Ok(())
    }

    /// Append a version to an existing game.
    pub async fn add_version(
        &self,
        game_id: &str,
        submission: &VersionSubmission,
        submitter: &CurrentUser,
    ) -> Result<Game, AppError> {
        let fields = normalize_version(submission).map_err(AppError::Validation)?;

        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        insert_version(&mut tx, game_id, &new_version_id(), &stamp(fields, submitter)).await?;

        let game = load_game(&mut tx, GameKey::Id(game_id))
            .await?
            .ok_or_else(|| game_not_found(game_id))?;
        tx.commit().await?;

        Ok(game)
    }

    /// Fully replace one version of a game.
    pub async fn replace_version(
        &self,
        game_id: &str,
        version_id: &str,
        submission: &VersionSubmission,
        submitter: &CurrentUser,
    ) -> Result<Game, AppError> {
        let fields = normalize_version(submission).map_err(AppError::Validation)?;
        let version = stamp(fields, submitter);

        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        let result = sqlx::query(
            r#"UPDATE versions SET
                created_by = ?, platform = ?, code = ?, voice_languages = ?,
                subtitles_languages = ?, is_official = ?
            WHERE id = ? AND game_id = ?"#,
        )
        .bind(&version.created_by)
        .bind(version.fields.platform.as_str())
        .bind(&version.fields.code)
        .bind(languages_json(&version.fields.voice_languages)?)
        .bind(languages_json(&version.fields.subtitles_languages)?)
        .bind(version.is_official as i32)
        .bind(version_id)
        .bind(game_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| version_write_error(e, &version.fields.code, game_id))?;

        if result.rows_affected() == 0 {
            return Err(version_not_found(game_id, version_id));
        }

        let game = load_game(&mut tx, GameKey::Id(game_id))
            .await?
            .ok_or_else(|| game_not_found(game_id))?;
        tx.commit().await?;

        Ok(game)
    }

    /// Remove one version; removing the last one deletes the game as well.
    pub async fn remove_version(
        &self,
        game_id: &str,
        version_id: &str,
    ) -> Result<RemovedVersion, AppError> {
        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        let result = sqlx::query("DELETE FROM versions WHERE id = ? AND game_id = ?")
            .bind(version_id)
            .bind(game_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(version_not_found(game_id, version_id));
        }

        let emptied = sqlx::query(
            "DELETE FROM games WHERE id = ? AND NOT EXISTS (SELECT 1 FROM versions WHERE game_id = ?)",
        )
        .bind(game_id)
        .bind(game_id)
        .execute(&mut *tx)
        .await?;

        let outcome = if emptied.rows_affected() > 0 {
            tracing::info!("Last version of game {} removed, game deleted", game_id);
            RemovedVersion::GameDeleted {
                game_id: game_id.to_string(),
            }
        } else {
            let game = load_game(&mut tx, GameKey::Id(game_id))
                .await?
                .ok_or_else(|| game_not_found(game_id))?;
            RemovedVersion::Updated { game }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Merge-on-submit: add the version to the game with this name, creating
    /// the game first if no game matches (ignoring case).
    pub async fn upsert_by_name(
        &self,
        request: &UpsertVersionRequest,
        submitter: &CurrentUser,
    ) -> Result<Game, AppError> {
        let mut errors = Vec::new();
        let name = normalize_name("name", &request.name).map_err(|e| errors.push(e));
        let fields = normalize_version(&request.version).map_err(|e| errors.extend(e));
        let (name, fields) = match (name, fields) {
            (Ok(name), Ok(fields)) => (name, fields),
            _ => return Err(AppError::Validation(errors)),
        };

        self.upsert_new_version(&name, &stamp(fields, submitter)).await
    }

    pub(crate) async fn upsert_new_version(
        &self,
        name: &str,
        version: &NewVersion,
    ) -> Result<Game, AppError> {
        let key = name_key(name);

        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        // Find-or-create is a single statement against the unique name_key.
        let created = sqlx::query(
            "INSERT INTO games (id, name, name_key, created_at) VALUES (?, ?, ?, ?) ON CONFLICT(name_key) DO NOTHING",
        )
        .bind(new_id())
        .bind(name)
        .bind(&key)
        .bind(timestamp())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        let game_id: String = sqlx::query("SELECT id FROM games WHERE name_key = ?")
            .bind(&key)
            .fetch_one(&mut *tx)
            .await?
            .get("id");

        // A duplicate code rolls back the whole transaction, including a
        // freshly created game, so no game is ever left without versions.
        insert_version(&mut tx, &game_id, &new_version_id(), version).await?;

        let game = load_game(&mut tx, GameKey::Id(&game_id))
            .await?
            .ok_or_else(|| game_not_found(&game_id))?;
        tx.commit().await?;

        if created {
            tracing::info!("Created game {} ({}) on submit", game.name, game.id);
        } else {
            tracing::debug!("Merged version {} into game {}", version.fields.code, game.name);
        }
        Ok(game)
    }
}

/// Lookup key for loading a single game.
enum GameKey<'a> {
    Id(&'a str),
    NameKey(&'a str),
}

async fn load_game(conn: &mut SqliteConnection, key: GameKey<'_>) -> Result<Option<Game>, AppError> {
    let (sql, value) = match key {
        GameKey::Id(id) => ("SELECT id, name FROM games WHERE id = ?", id),
        GameKey::NameKey(k) => ("SELECT id, name FROM games WHERE name_key = ?", k),
    };

    let Some(row) = sqlx::query(sql).bind(value).fetch_optional(&mut *conn).await? else {
        return Ok(None);
    };
    let id: String = row.get("id");

    let versions = sqlx::query(&format!(
        "SELECT {} FROM versions WHERE game_id = ? ORDER BY code",
        VERSION_COLUMNS
    ))
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(version_from_row)
    .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Game {
        id,
        name: row.get("name"),
        versions,
    }))
}

async fn insert_version(
    conn: &mut SqliteConnection,
    game_id: &str,
    version_id: &str,
    version: &NewVersion,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO versions
            (id, game_id, created_by, platform, code, voice_languages, subtitles_languages, is_official, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(version_id)
    .bind(game_id)
    .bind(&version.created_by)
    .bind(version.fields.platform.as_str())
    .bind(&version.fields.code)
    .bind(languages_json(&version.fields.voice_languages)?)
    .bind(languages_json(&version.fields.subtitles_languages)?)
    .bind(version.is_official as i32)
    .bind(timestamp())
    .execute(conn)
    .await
    .map_err(|e| version_write_error(e, &version.fields.code, game_id))?;
    Ok(())
}

fn new_version_id() -> String {
    new_id()
}

fn game_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Game {} not found", id))
}

fn version_not_found(game_id: &str, version_id: &str) -> AppError {
    AppError::NotFound(format!(
        "Version {} not found in game {}",
        version_id, game_id
    ))
}

fn game_write_error(err: sqlx::Error, name: &str) -> AppError {
    match violated_constraint(&err) {
        Some(Constraint::GameName) => duplicate_name(name),
        _ => err.into(),
    }
}

fn version_write_error(err: sqlx::Error, code: &str, game_id: &str) -> AppError {
    match violated_constraint(&err) {
        Some(Constraint::VersionCode) => duplicate_code(code),
        Some(Constraint::ForeignKey) => game_not_found(game_id),
        _ => err.into(),
    }
}
