//! Releasing a post into the catalog.
//!
//! The catalog write commits first. Removing the post afterwards is
//! best-effort: a failure there is reported as a warning and never undoes the
//! released version.

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{CurrentUser, Post, Released, VersionFields, VersionSubmission};
use crate::normalize::{normalize_name, normalize_version, stamp};

/// A completed release plus any secondary failures worth telling the caller about.
#[derive(Debug, Clone)]
pub struct Promotion {
    pub released: Released,
    pub warnings: Vec<String>,
}

/// Move a post from proposed to released.
///
/// The new version is attributed to `admin`; the post author is only logged.
pub async fn promote(
    repo: &Repository,
    post_id: &str,
    admin: &CurrentUser,
) -> Result<Promotion, AppError> {
    let post = repo
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    let (name, fields) = renormalize(&post)?;
    let code = fields.code.clone();

    let game = repo
        .upsert_new_version(&name, &stamp(fields, admin))
        .await?;
    let version_id = game
        .versions
        .iter()
        .find(|v| v.code == code)
        .map(|v| v.id.clone())
        .ok_or_else(|| AppError::Internal(format!("Released version {} is missing", code)))?;

    tracing::info!(
        "Released post {} by {} as version {} of {} (approved by {})",
        post.id,
        post.created_by,
        code,
        game.name,
        admin.id
    );

    let mut warnings = Vec::new();
    match repo.delete_post(&post.id).await {
        Ok(()) | Err(AppError::NotFound(_)) => {}
        Err(e) => {
            tracing::warn!("Post {} was released but could not be removed: {}", post.id, e);
            warnings.push(format!(
                "Version was released but post {} could not be removed: {}",
                post.id, e
            ));
        }
    }

    Ok(Promotion {
        released: Released {
            game,
            version_id,
            post_id: post.id,
        },
        warnings,
    })
}

/// Run the stored post back through the normalizer so the catalog only ever
/// receives canonical fields.
fn renormalize(post: &Post) -> Result<(String, VersionFields), AppError> {
    let mut errors = Vec::new();

    let name = normalize_name("gameName", &post.game_name).map_err(|e| errors.push(e));
    let submission = VersionSubmission::from(&VersionFields {
        platform: post.platform,
        code: post.code.clone(),
        voice_languages: post.voice_languages.clone(),
        subtitles_languages: post.subtitles_languages.clone(),
    });
    let fields = normalize_version(&submission).map_err(|e| errors.extend(e));

    match (name, fields) {
        (Ok(name), Ok(fields)) => Ok((name, fields)),
        _ => Err(AppError::Validation(errors)),
    }
}
