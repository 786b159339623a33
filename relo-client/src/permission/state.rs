//! Per-session permission state

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{Action, EffectivePermissions};

/// Error surfaced to screens when a load fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load permissions. Some features may be restricted.";

/// Snapshot of what the gate knows about the current session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionPermissionState {
    pub effective_permissions: EffectivePermissions,
    /// Bypasses the matrix entirely.
    pub is_superadmin: bool,
    pub is_loading: bool,
    /// Last load failure, non-fatal.
    pub error: Option<String>,
    /// When the current matrix was received.
    pub loaded_at: Option<DateTime<Utc>>,
}

impl SessionPermissionState {
    /// State of a freshly mounted gate: nothing known yet, loading.
    pub fn loading() -> Self {
        Self {
            effective_permissions: EffectivePermissions::new(),
            is_superadmin: false,
            is_loading: true,
            error: None,
            loaded_at: None,
        }
    }

    /// State with no session: every check denies.
    pub fn anonymous() -> Self {
        Self {
            is_loading: false,
            ..Self::loading()
        }
    }

    /// Permission predicate.
    ///
    /// Superadmin wins over everything, a loading state denies everything,
    /// and otherwise only an explicit `true` in the matrix allows.
    pub fn check(&self, resource: &str, action: Action) -> bool {
        if self.is_superadmin {
            return true;
        }
        if self.is_loading {
            return false;
        }
        self.effective_permissions.allows(resource, action)
    }
}

impl Default for SessionPermissionState {
    fn default() -> Self {
        Self::loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ActionSet;

    fn booking_viewer() -> EffectivePermissions {
        [(
            "booking",
            ActionSet {
                can_view: true,
                ..ActionSet::NONE
            },
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_loading_denies_everything() {
        let state = SessionPermissionState {
            effective_permissions: booking_viewer(),
            ..SessionPermissionState::loading()
        };
        for action in Action::ALL {
            assert!(!state.check("booking", action));
        }
    }

    #[test]
    fn test_superadmin_allows_even_while_loading() {
        let state = SessionPermissionState {
            is_superadmin: true,
            ..SessionPermissionState::loading()
        };
        assert!(state.check("anything", Action::Delete));
    }

    #[test]
    fn test_matrix_lookup() {
        let state = SessionPermissionState {
            effective_permissions: booking_viewer(),
            ..SessionPermissionState::anonymous()
        };
        assert!(state.check("booking", Action::View));
        assert!(!state.check("booking", Action::Add));
        assert!(!state.check("booking", Action::Delete));
        assert!(!state.check("pricing", Action::View));
    }

    #[test]
    fn test_anonymous_denies() {
        let state = SessionPermissionState::anonymous();
        assert!(!state.is_loading);
        assert!(!state.check("booking", Action::View));
    }
}
