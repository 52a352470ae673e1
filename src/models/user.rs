//! The caller identity resolved from a bearer credential.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub is_admin: bool,
}

impl CurrentUser {
    /// Whether this user may edit or delete something created by `owner_id`.
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.is_admin || self.id == owner_id
    }
}
