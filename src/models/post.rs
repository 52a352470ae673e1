//! Post model: a user-submitted proposal for a catalog version.

use serde::{Deserialize, Serialize};

use super::{Game, Language, Platform};

/// A draft version proposal, independent of the catalog until released.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub created_by: String,
    pub game_name: String,
    pub platform: Platform,
    pub code: String,
    pub voice_languages: Vec<Language>,
    pub subtitles_languages: Vec<Language>,
    pub date: String,
}

/// Request body for creating or editing a post.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub voice_languages: Vec<String>,
    #[serde(default)]
    pub subtitles_languages: Vec<String>,
}

/// Optional filter for listing posts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Result of releasing a post into the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Released {
    pub game: Game,
    pub version_id: String,
    pub post_id: String,
}
