//! Client-related types shared between the dashboard crates
//!
//! Response bodies of the auth endpoints consumed by the client.

use serde::{Deserialize, Serialize};

use crate::models::RoleSummary;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Current user profile (`GET auth/profile/`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_superuser: Option<bool>,
    #[serde(default)]
    pub role: Option<RoleSummary>,
}

impl UserProfile {
    /// Whether this user bypasses the permission matrix.
    ///
    /// Either signal is sufficient: the superuser flag, or a role named
    /// exactly [`SUPERADMIN_ROLE`](crate::models::SUPERADMIN_ROLE).
    pub fn is_superadmin(&self) -> bool {
        self.is_superuser == Some(true) || self.role.as_ref().is_some_and(RoleSummary::is_superadmin)
    }

    /// Display name, falling back the way the sidebar does.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
    }

    pub fn role_name(&self) -> &str {
        self.role
            .as_ref()
            .map(|r| r.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
    }
}
