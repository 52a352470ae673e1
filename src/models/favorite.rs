//! Favorite model: a user's bookmark of a (game, version) pair.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    #[serde(rename = "gameID")]
    pub game_id: String,
    #[serde(rename = "versionID")]
    pub version_id: String,
    pub created_at: String,
}

/// Request body for toggling a favorite.
#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteRequest {
    #[serde(rename = "gameID", default)]
    pub game_id: String,
    #[serde(rename = "versionID", default)]
    pub version_id: String,
}

/// Membership after a toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggle {
    pub favorited: bool,
}

/// Outcome of the stale-favorite maintenance pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub users_touched: u64,
    pub removed: u64,
}
