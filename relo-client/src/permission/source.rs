//! Where the gate gets its data from.

use async_trait::async_trait;
use shared::{EffectivePermissions, UserProfile};

use crate::{ClientResult, HttpClient};

/// Backend reads the permission gate depends on.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Current user's profile.
    async fn fetch_profile(&self, token: &str) -> ClientResult<UserProfile>;

    /// Effective-permissions matrix, already merged server-side.
    async fn fetch_effective_permissions(&self, token: &str) -> ClientResult<EffectivePermissions>;
}

#[async_trait]
impl PermissionSource for HttpClient {
    async fn fetch_profile(&self, token: &str) -> ClientResult<UserProfile> {
        self.profile(token).await
    }

    async fn fetch_effective_permissions(&self, token: &str) -> ClientResult<EffectivePermissions> {
        self.effective_permissions(token).await
    }
}
