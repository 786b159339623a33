//! Relo Client - permission-aware client for the dashboard backend
//!
//! Fetches the signed-in user's effective permissions and answers
//! "may this user do X on Y?" synchronously for every screen.

pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod logger;
pub mod menu;
pub mod permission;
pub mod token;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, GateError};
pub use http::HttpClient;
pub use permission::{
    PermissionGate, PermissionProvider, PermissionSource, ScreenContext, SessionPermissionState,
    WindowEvent,
};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};

// Re-export shared types for convenience
pub use shared::{Action, ActionSet, EffectivePermissions, UserProfile};
