//! Reaction model: one like/dislike vote per user per post.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Dislike,
}

impl ReactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Dislike => "dislike",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(ReactionType::Like),
            "dislike" => Some(ReactionType::Dislike),
            _ => None,
        }
    }
}

/// Request body for casting a vote.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    #[serde(default)]
    pub reaction_type: String,
}

/// Aggregate counts for a post, recomputed on every read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
    pub user_reaction: Option<ReactionType>,
}

/// Per-type breakdown including who voted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionStat {
    #[serde(rename = "type")]
    pub reaction_type: ReactionType,
    pub count: i64,
    pub users: Vec<String>,
}
