//! Reaction ledger: at most one like/dislike per user per post.

use std::collections::BTreeMap;

use sqlx::{Row, SqliteConnection};

use super::posts::post_not_found;
use super::repository::{bump_revision, timestamp, violated_constraint, Constraint, Repository};
use crate::errors::AppError;
use crate::models::{ReactionCounts, ReactionStat, ReactionType};

impl Repository {
    /// Toggle a vote and return the recomputed counts.
    ///
    /// No reaction: create it. Same type: remove it. Other type: switch it.
    pub async fn react(
        &self,
        post_id: &str,
        user_id: &str,
        reaction_type: ReactionType,
    ) -> Result<ReactionCounts, AppError> {
        let mut tx = self.pool.begin().await?;
        bump_revision(&mut tx).await?;

        let removed = sqlx::query(
            "DELETE FROM reactions WHERE post_id = ? AND user_id = ? AND reaction_type = ?",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(reaction_type.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            // The (post_id, user_id) key makes a racing second vote update
            // the same row instead of adding another.
            let now = timestamp();
            sqlx::query(
                r#"INSERT INTO reactions (post_id, user_id, reaction_type, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(post_id, user_id) DO UPDATE SET
                    reaction_type = excluded.reaction_type,
                    updated_at = excluded.updated_at"#,
            )
            .bind(post_id)
            .bind(user_id)
            .bind(reaction_type.as_str())
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| match violated_constraint(&e) {
                Some(Constraint::ForeignKey) => post_not_found(post_id),
                _ => e.into(),
            })?;
        }

        let counts = count_reactions(&mut tx, post_id, Some(user_id)).await?;
        tx.commit().await?;
        Ok(counts)
    }

    /// Current counts for a post, plus the caller's own vote when known.
    pub async fn reaction_counts(
        &self,
        post_id: &str,
        caller_id: Option<&str>,
    ) -> Result<ReactionCounts, AppError> {
        let mut conn = self.pool.acquire().await?;
        count_reactions(&mut conn, post_id, caller_id).await
    }

    /// Per-type counts with the users behind them.
    pub async fn reaction_stats(&self, post_id: &str) -> Result<Vec<ReactionStat>, AppError> {
        let rows = sqlx::query(
            "SELECT user_id, reaction_type FROM reactions WHERE post_id = ? ORDER BY created_at, user_id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_type: BTreeMap<&'static str, ReactionStat> = BTreeMap::new();
        for row in &rows {
            let raw: String = row.get("reaction_type");
            let Some(reaction_type) = ReactionType::parse(&raw) else {
                continue;
            };
            let stat = by_type
                .entry(reaction_type.as_str())
                .or_insert_with(|| ReactionStat {
                    reaction_type,
                    count: 0,
                    users: Vec::new(),
                });
            stat.count += 1;
            stat.users.push(row.get("user_id"));
        }

        Ok(by_type.into_values().collect())
    }
}

/// Group-count by type; never cached, so it cannot drift.
async fn count_reactions(
    conn: &mut SqliteConnection,
    post_id: &str,
    caller_id: Option<&str>,
) -> Result<ReactionCounts, AppError> {
    let rows = sqlx::query(
        "SELECT reaction_type, COUNT(*) AS count FROM reactions WHERE post_id = ? GROUP BY reaction_type",
    )
    .bind(post_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut counts = ReactionCounts::default();
    for row in &rows {
        let raw: String = row.get("reaction_type");
        let count: i64 = row.get("count");
        match ReactionType::parse(&raw) {
            Some(ReactionType::Like) => counts.likes = count,
            Some(ReactionType::Dislike) => counts.dislikes = count,
            None => {}
        }
    }

    if let Some(caller_id) = caller_id {
        let row = sqlx::query("SELECT reaction_type FROM reactions WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(caller_id)
            .fetch_optional(&mut *conn)
            .await?;
        counts.user_reaction = row.and_then(|r| {
            let raw: String = r.get("reaction_type");
            ReactionType::parse(&raw)
        });
    }

    Ok(counts)
}
