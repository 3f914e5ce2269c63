//! Identity carried by an access token

use serde::{Deserialize, Serialize};

/// The authenticated caller, as decoded from a valid access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    pub id: i64,
    pub user_role: Option<String>,
}

impl CurrentUser {
    pub fn new(username: impl Into<String>, id: i64, user_role: Option<String>) -> Self {
        Self {
            username: username.into(),
            id,
            user_role,
        }
    }

    /// Whether the token carried the given role
    pub fn has_role(&self, role: &str) -> bool {
        self.user_role.as_deref() == Some(role)
    }
}
