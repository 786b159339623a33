//! Role Model

use serde::{Deserialize, Serialize};

use crate::permission::ActionSet;

/// Role name that bypasses the permission matrix.
///
/// Compared case-sensitively, exactly as the backend stores it.
pub const SUPERADMIN_ROLE: &str = "Superadmin";

/// Role attached to a user profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleSummary {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Role-level permissions, before user overrides are applied
    #[serde(default)]
    pub permissions: Vec<PagePermission>,
}

impl RoleSummary {
    pub fn is_superadmin(&self) -> bool {
        self.name == SUPERADMIN_ROLE
    }
}

/// One row of a role's permission table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagePermission {
    #[serde(default)]
    pub id: Option<i64>,
    pub page: String,
    #[serde(flatten)]
    pub actions: ActionSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Action;

    #[test]
    fn test_superadmin_name_is_case_sensitive() {
        let role = RoleSummary {
            name: "Superadmin".into(),
            ..Default::default()
        };
        assert!(role.is_superadmin());

        let role = RoleSummary {
            name: "superadmin".into(),
            ..Default::default()
        };
        assert!(!role.is_superadmin());
    }

    #[test]
    fn test_page_permission_flattens_flags() {
        let perm: PagePermission = serde_json::from_str(
            r#"{"id": 4, "role": 2, "page": "quotation", "can_view": true, "can_edit": true}"#,
        )
        .unwrap();

        assert_eq!(perm.page, "quotation");
        assert!(perm.actions.allows(Action::Edit));
        assert!(!perm.actions.allows(Action::Delete));
    }
}
