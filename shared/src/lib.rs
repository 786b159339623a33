//! Shared types for the Relo dashboard
//!
//! Wire and domain types used by every client crate: the permission
//! matrix, the user profile, and the catalogue of resource names.

pub mod client;
pub mod models;
pub mod permission;
pub mod resources;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use client::UserProfile;
pub use models::{PagePermission, RoleSummary};
pub use permission::{Action, ActionSet, EffectivePermissions, ParseActionError};
