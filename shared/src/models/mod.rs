//! Data models shared across the dashboard crates

pub mod role;

pub use role::{PagePermission, RoleSummary, SUPERADMIN_ROLE};
