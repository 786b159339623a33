//! Client-side permission gating
//!
//! - [`PermissionGate`]: cached effective permissions with a synchronous check
//! - [`PermissionProvider`]: mount/unmount lifecycle and refresh-on-focus
//! - [`ScreenContext`]: what screens receive to reach the gate
//! - [`PermissionSource`]: the backend reads the gate depends on

pub mod gate;
pub mod provider;
pub mod source;
pub mod state;

pub use gate::PermissionGate;
pub use provider::{PermissionProvider, ScreenContext, WindowEvent};
pub use source::PermissionSource;
pub use state::{LOAD_FAILED_MESSAGE, SessionPermissionState};
