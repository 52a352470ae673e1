//! Game model: the canonical catalog aggregate.

use serde::{Deserialize, Serialize};

use super::{Version, VersionSubmission};

/// A game and every known localized version of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub name: String,
    /// Always sorted by code.
    pub versions: Vec<Version>,
}

impl Game {
    pub fn version(&self, version_id: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == version_id)
    }
}

/// Request body for creating a game or replacing one wholesale.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub versions: Vec<VersionSubmission>,
}

/// Request body for the merge-on-submit operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertVersionRequest {
    #[serde(default)]
    pub name: String,
    pub version: VersionSubmission,
}

/// Query string for case-insensitive name lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct GameNameQuery {
    pub name: Option<String>,
}

/// A stored game plus any non-fatal notes produced while saving it.
#[derive(Debug, Clone)]
pub struct SavedGame {
    pub game: Game,
    pub warnings: Vec<String>,
}

/// Result of removing a single version.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RemovedVersion {
    /// The game still has versions left.
    Updated { game: Game },
    /// The removed version was the last one, so the game is gone too.
    GameDeleted {
        #[serde(rename = "gameId")]
        game_id: String,
    },
}
