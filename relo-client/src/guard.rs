//! Route guard
//!
//! Decides what a protected route renders: a loading placeholder while
//! permissions are in flight, the page itself, or a redirect home.

use serde::Serialize;
use shared::Action;

use crate::permission::PermissionGate;

/// Permission a route requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequirement {
    /// Resource checked; `None` admits any loaded session.
    pub page: Option<String>,
    pub action: Action,
}

impl RouteRequirement {
    /// Require `view` on `page`
    pub fn page(page: impl Into<String>) -> Self {
        Self {
            page: Some(page.into()),
            action: Action::View,
        }
    }

    /// No resource requirement
    pub fn open() -> Self {
        Self {
            page: None,
            action: Action::View,
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAccess {
    /// Permissions still loading; show a placeholder.
    Loading,
    Granted,
    /// Redirect to [`RouteAccess::REDIRECT_TO`].
    Denied,
}

impl RouteAccess {
    pub const REDIRECT_TO: &'static str = "/";
}

/// Evaluate a route requirement against the gate.
pub fn evaluate(gate: &PermissionGate, requirement: &RouteRequirement) -> RouteAccess {
    let state = gate.snapshot();
    if state.is_loading {
        return RouteAccess::Loading;
    }

    let granted = state.is_superadmin
        || requirement
            .page
            .as_deref()
            .is_none_or(|page| state.check(page, requirement.action));

    if granted {
        RouteAccess::Granted
    } else {
        tracing::debug!(page = ?requirement.page, action = %requirement.action, "Route denied");
        RouteAccess::Denied
    }
}
