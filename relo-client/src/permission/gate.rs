//! Permission gate
//!
//! Fetches the current user's profile and effective-permissions matrix and
//! answers permission checks synchronously from the cached result.
//!
//! # Ordering
//!
//! Every fetch takes a sequence number. A matrix response is applied only
//! while its request is still the newest one issued, so a slow response
//! can never overwrite the result of a later request. Profile responses
//! are ordered separately against full loads only: a matrix refresh never
//! invalidates the superadmin flag of a load still in flight. Once the
//! gate is torn down no response is applied at all.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use shared::{Action, EffectivePermissions};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::source::PermissionSource;
use super::state::{LOAD_FAILED_MESSAGE, SessionPermissionState};
use crate::token::{ACCESS_TOKEN_KEY, FileTokenStore, MemoryTokenStore, TokenStore};
use crate::{ClientConfig, ClientError, ClientResult};

/// Cached permission state for one session, shared by every screen.
pub struct PermissionGate {
    source: Arc<dyn PermissionSource>,
    tokens: Arc<dyn TokenStore>,
    token_key: String,
    state: watch::Sender<SessionPermissionState>,
    sequence: AtomicU64,
    /// Full loads only; orders profile responses
    load_sequence: AtomicU64,
    shutdown: CancellationToken,
}

impl PermissionGate {
    /// Create a gate in the loading state. Nothing is fetched until [`load`](Self::load).
    pub fn new(source: Arc<dyn PermissionSource>, tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionPermissionState::loading());
        Self {
            source,
            tokens,
            token_key: ACCESS_TOKEN_KEY.to_string(),
            state,
            sequence: AtomicU64::new(0),
            load_sequence: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    /// Read the access token from a different store key
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Build a gate backed by the HTTP API and the configured token store
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let http = config.build_http_client()?;
        let tokens: Arc<dyn TokenStore> = match &config.token_file {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::new()),
        };
        Ok(Self::new(Arc::new(http), tokens).with_token_key(config.token_key.clone()))
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    // ========== Checks ==========

    /// Whether the current user may perform `action` on `resource`.
    ///
    /// Never blocks on the network; safe to call on every render.
    pub fn has_permission(&self, resource: &str, action: Action) -> bool {
        self.state.borrow().check(resource, action)
    }

    /// String form of [`has_permission`](Self::has_permission). Unknown actions are denied.
    pub fn check(&self, resource: &str, action: &str) -> bool {
        match action.parse::<Action>() {
            Ok(action) => self.has_permission(resource, action),
            Err(e) => {
                tracing::debug!(resource = %resource, error = %e, "Denying unknown action");
                false
            }
        }
    }

    pub fn is_superadmin(&self) -> bool {
        self.state.borrow().is_superadmin
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn effective_permissions(&self) -> EffectivePermissions {
        self.state.borrow().effective_permissions.clone()
    }

    pub fn snapshot(&self) -> SessionPermissionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionPermissionState> {
        self.state.subscribe()
    }

    /// Wait until no load is in flight
    pub async fn wait_until_loaded(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|state| !state.is_loading).await;
    }

    // ========== Loading ==========

    /// Full load: profile (superadmin flag) followed by the matrix.
    ///
    /// Without an access token the session is treated as anonymous and
    /// nothing is fetched. Failures are absorbed: the matrix is emptied
    /// and `error` is set, but nothing is returned to the caller.
    pub async fn load(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let Some(token) = self.tokens.token(&self.token_key) else {
            self.reset_anonymous();
            return;
        };

        let load_seq = self.load_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let seq = self.begin(true);
        tracing::debug!(seq, load_seq, "Loading permissions");

        let profile = match self.guarded(self.source.fetch_profile(&token)).await {
            Some(Ok(profile)) => profile,
            Some(Err(e)) => return self.fail(seq, e),
            None => return,
        };

        let is_superadmin = profile.is_superadmin();
        self.apply_profile(load_seq, is_superadmin);

        match self.guarded(self.source.fetch_effective_permissions(&token)).await {
            Some(Ok(matrix)) => self.succeed(seq, matrix),
            Some(Err(e)) => self.fail(seq, e),
            None => {}
        }
    }

    /// Matrix-only reload, used after permission overrides change.
    ///
    /// The superadmin flag is left as it is.
    pub async fn refresh_permissions(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let Some(token) = self.tokens.token(&self.token_key) else {
            self.reset_anonymous();
            return;
        };

        let seq = self.begin(false);
        tracing::debug!(seq, "Refreshing permissions");

        match self.guarded(self.source.fetch_effective_permissions(&token)).await {
            Some(Ok(matrix)) => self.succeed(seq, matrix),
            Some(Err(e)) => self.fail(seq, e),
            None => {}
        }
    }

    /// Discard all state and stop applying responses.
    ///
    /// In-flight fetches are cancelled; later `load`/`refresh` calls do nothing.
    pub fn teardown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        self.sequence.fetch_add(1, Ordering::SeqCst);
        self.load_sequence.fetch_add(1, Ordering::SeqCst);
        self.state
            .send_modify(|state| *state = SessionPermissionState::anonymous());
        tracing::info!("Permission gate torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    // ========== Sequencing ==========

    fn begin(&self, clear_error: bool) -> u64 {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.is_loading = true;
            if clear_error {
                state.error = None;
            }
        });
        seq
    }

    fn is_current(&self, seq: u64) -> bool {
        !self.shutdown.is_cancelled() && self.sequence.load(Ordering::SeqCst) == seq
    }

    /// Apply the superadmin flag unless a newer full load (or a reset) was issued.
    fn apply_profile(&self, load_seq: u64, is_superadmin: bool) {
        let applied = self.state.send_if_modified(|state| {
            if self.shutdown.is_cancelled() || self.load_sequence.load(Ordering::SeqCst) != load_seq {
                return false;
            }
            state.is_superadmin = is_superadmin;
            true
        });
        if !applied {
            tracing::debug!(load_seq, "Discarding stale profile response");
        }
    }

    /// Apply `f` if `seq` is still the newest request. Returns whether it was applied.
    fn update(&self, seq: u64, f: impl FnOnce(&mut SessionPermissionState)) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if !self.is_current(seq) {
                return false;
            }
            f(state);
            true
        });
        if !applied {
            tracing::debug!(seq, "Discarding stale permission response");
        }
        applied
    }

    fn reset_anonymous(&self) {
        self.load_sequence.fetch_add(1, Ordering::SeqCst);
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("No access token, skipping permission fetch");
        self.update(seq, |state| *state = SessionPermissionState::anonymous());
    }

    fn succeed(&self, seq: u64, matrix: EffectivePermissions) {
        let resources = matrix.len();
        if self.update(seq, |state| {
            state.effective_permissions = matrix;
            state.error = None;
            state.loaded_at = Some(Utc::now());
            state.is_loading = false;
        }) {
            tracing::info!(seq, resources, "Permissions loaded");
        }
    }

    fn fail(&self, seq: u64, error: ClientError) {
        tracing::error!(seq, error = %error, "Failed to load effective permissions");
        self.update(seq, |state| {
            state.effective_permissions = EffectivePermissions::new();
            state.error = Some(LOAD_FAILED_MESSAGE.to_string());
            state.loaded_at = None;
            state.is_loading = false;
        });
    }

    async fn guarded<T>(&self, fetch: impl Future<Output = ClientResult<T>>) -> Option<ClientResult<T>> {
        tokio::select! {
            _ = self.shutdown.cancelled() => None,
            result = fetch => Some(result),
        }
    }
}

impl fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGate")
            .field("token_key", &self.token_key)
            .field("state", &*self.state.borrow())
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("load_sequence", &self.load_sequence.load(Ordering::SeqCst))
            .field("torn_down", &self.shutdown.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use serde_json::json;
    use shared::UserProfile;
    use tokio::sync::oneshot;

    type Reply<T> = ClientResult<T>;

    /// Source answering from queued replies; a queued receiver holds the reply back
    /// until the test releases it.
    #[derive(Default)]
    struct ScriptedSource {
        profiles: Mutex<VecDeque<oneshot::Receiver<Reply<UserProfile>>>>,
        matrices: Mutex<VecDeque<oneshot::Receiver<Reply<EffectivePermissions>>>>,
        profile_calls: AtomicUsize,
        matrix_calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn profile(&self, value: serde_json::Value) {
            let (tx, rx) = oneshot::channel();
            tx.send(Ok(serde_json::from_value(value).unwrap())).unwrap();
            self.profiles.lock().unwrap().push_back(rx);
        }

        fn profile_error(&self) {
            let (tx, rx) = oneshot::channel();
            tx.send(Err(ClientError::Internal("boom".into()))).unwrap();
            self.profiles.lock().unwrap().push_back(rx);
        }

        fn deferred_profile(&self) -> oneshot::Sender<Reply<UserProfile>> {
            let (tx, rx) = oneshot::channel();
            self.profiles.lock().unwrap().push_back(rx);
            tx
        }

        fn matrix(&self, value: serde_json::Value) {
            let (tx, rx) = oneshot::channel();
            tx.send(Ok(serde_json::from_value(value).unwrap())).unwrap();
            self.matrices.lock().unwrap().push_back(rx);
        }

        fn matrix_error(&self) {
            let (tx, rx) = oneshot::channel();
            tx.send(Err(ClientError::Unauthorized)).unwrap();
            self.matrices.lock().unwrap().push_back(rx);
        }

        fn deferred_matrix(&self) -> oneshot::Sender<Reply<EffectivePermissions>> {
            let (tx, rx) = oneshot::channel();
            self.matrices.lock().unwrap().push_back(rx);
            tx
        }

        fn calls(&self) -> (usize, usize) {
            (
                self.profile_calls.load(Ordering::SeqCst),
                self.matrix_calls.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait]
    impl PermissionSource for ScriptedSource {
        async fn fetch_profile(&self, _token: &str) -> ClientResult<UserProfile> {
            self.profile_calls.fetch_add(1, Ordering::SeqCst);
            let rx = self.profiles.lock().unwrap().pop_front();
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ClientError::Internal("reply dropped".into()))),
                None => Err(ClientError::Internal("no scripted profile".into())),
            }
        }

        async fn fetch_effective_permissions(&self, _token: &str) -> ClientResult<EffectivePermissions> {
            self.matrix_calls.fetch_add(1, Ordering::SeqCst);
            let rx = self.matrices.lock().unwrap().pop_front();
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ClientError::Internal("reply dropped".into()))),
                None => Err(ClientError::Internal("no scripted matrix".into())),
            }
        }
    }

    fn gate_with(source: &Arc<ScriptedSource>, token: Option<&str>) -> PermissionGate {
        let tokens = match token {
            Some(t) => MemoryTokenStore::with_access_token(t),
            None => MemoryTokenStore::new(),
        };
        PermissionGate::new(source.clone(), Arc::new(tokens))
    }

    fn booking_agent() -> serde_json::Value {
        json!({"booking": {"can_view": true, "can_add": true, "can_edit": false, "can_delete": false}})
    }

    #[tokio::test]
    async fn test_starts_loading_and_fail_closed() {
        let source = Arc::new(ScriptedSource::default());
        let gate = gate_with(&source, Some("t"));
        assert!(gate.is_loading());
        assert!(!gate.has_permission("booking", Action::View));
    }

    #[tokio::test]
    async fn test_no_token_skips_network() {
        let source = Arc::new(ScriptedSource::default());
        let gate = gate_with(&source, None);

        gate.load().await;

        assert!(!gate.is_loading());
        assert!(gate.error().is_none());
        assert!(!gate.has_permission("booking", Action::View));
        assert_eq!(source.calls(), (0, 0));
    }

    #[tokio::test]
    async fn test_superuser_with_empty_matrix() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({"is_superuser": true}));
        source.matrix(json!({}));
        let gate = gate_with(&source, Some("t"));

        gate.load().await;

        assert!(gate.is_superadmin());
        assert!(gate.has_permission("anything", Action::Delete));
        assert_eq!(source.calls(), (1, 1));
    }

    #[tokio::test]
    async fn test_agent_matrix() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({"role": {"name": "Agent"}}));
        source.matrix(booking_agent());
        let gate = gate_with(&source, Some("t"));

        gate.load().await;

        assert!(!gate.is_superadmin());
        assert!(gate.has_permission("booking", Action::View));
        assert!(!gate.has_permission("booking", Action::Edit));
        assert!(!gate.has_permission("pricing", Action::View));
        assert!(gate.check("booking", "add"));
        assert!(!gate.check("booking", "approve"));
        assert!(gate.snapshot().loaded_at.is_some());
    }

    #[tokio::test]
    async fn test_failure_keeps_superadmin() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({"is_superuser": true}));
        source.matrix(json!({"booking": {"can_view": true}}));
        source.profile_error();
        let gate = gate_with(&source, Some("t"));

        gate.load().await;
        gate.load().await;

        let state = gate.snapshot();
        assert!(state.is_superadmin);
        assert!(!state.is_loading);
        assert!(state.effective_permissions.is_empty());
        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_profile_failure_denies_all() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({"role": {"name": "Agent"}}));
        source.matrix(booking_agent());
        source.profile_error();
        let gate = gate_with(&source, Some("t"));

        gate.load().await;
        assert!(gate.has_permission("booking", Action::View));

        gate.load().await;
        assert!(!gate.has_permission("booking", Action::View));
        assert!(gate.error().is_some());
        assert!(!gate.is_loading());
        // matrix never requested on the failed load
        assert_eq!(source.calls(), (2, 1));
    }

    #[tokio::test]
    async fn test_refresh_replaces_wholesale() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({"role": {"name": "Agent"}}));
        source.matrix(booking_agent());
        source.matrix(json!({"inventory": {"can_view": true}}));
        let gate = gate_with(&source, Some("t"));

        gate.load().await;
        gate.refresh_permissions().await;

        assert!(!gate.has_permission("booking", Action::View));
        assert!(gate.has_permission("inventory", Action::View));
        assert_eq!(gate.effective_permissions().len(), 1);
        // refresh does not refetch the profile
        assert_eq!(source.calls(), (1, 2));
    }

    #[tokio::test]
    async fn test_refresh_clears_previous_error() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({}));
        source.matrix_error();
        source.matrix(booking_agent());
        let gate = gate_with(&source, Some("t"));

        gate.load().await;
        assert!(gate.error().is_some());

        gate.refresh_permissions().await;
        assert!(gate.error().is_none());
        assert!(gate.has_permission("booking", Action::Add));
    }

    #[tokio::test]
    async fn test_refresh_is_loading_while_in_flight() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({}));
        source.matrix(booking_agent());
        let pending = source.deferred_matrix();
        let gate = Arc::new(gate_with(&source, Some("t")));
        gate.load().await;

        let task = tokio::spawn({
            let gate = gate.clone();
            async move { gate.refresh_permissions().await }
        });
        let mut rx = gate.subscribe();
        rx.wait_for(|s| s.is_loading).await.unwrap();
        assert!(!gate.has_permission("booking", Action::View));

        pending.send(Ok(EffectivePermissions::new())).unwrap();
        task.await.unwrap();
        assert!(!gate.is_loading());
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let source = Arc::new(ScriptedSource::default());
        let slow = source.deferred_matrix();
        let fast = source.deferred_matrix();
        let gate = Arc::new(gate_with(&source, Some("t")));

        let first = tokio::spawn({
            let gate = gate.clone();
            async move { gate.refresh_permissions().await }
        });
        while source.calls().1 < 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let gate = gate.clone();
            async move { gate.refresh_permissions().await }
        });
        while source.calls().1 < 2 {
            tokio::task::yield_now().await;
        }

        // newest request resolves first, the older one afterwards
        fast.send(Ok(serde_json::from_value(json!({"tax": {"can_view": true}})).unwrap()))
            .unwrap();
        second.await.unwrap();
        slow.send(Ok(serde_json::from_value(booking_agent()).unwrap()))
            .unwrap();
        first.await.unwrap();

        assert!(gate.has_permission("tax", Action::View));
        assert!(!gate.has_permission("booking", Action::View));
        assert!(!gate.is_loading());
    }

    #[tokio::test]
    async fn test_refresh_during_load_keeps_superuser_profile() {
        let source = Arc::new(ScriptedSource::default());
        let profile = source.deferred_profile();
        // first matrix goes to the refresh, the second to the load
        source.matrix(booking_agent());
        source.matrix(json!({}));
        let gate = Arc::new(gate_with(&source, Some("t")));

        let load = tokio::spawn({
            let gate = gate.clone();
            async move { gate.load().await }
        });
        while source.calls().0 < 1 {
            tokio::task::yield_now().await;
        }

        gate.refresh_permissions().await;
        assert!(!gate.is_superadmin());

        profile
            .send(Ok(serde_json::from_value(json!({"is_superuser": true})).unwrap()))
            .unwrap();
        load.await.unwrap();

        assert!(gate.is_superadmin());
        assert!(gate.has_permission("anything", Action::Delete));
        assert!(!gate.is_loading());
        // the load's older matrix response lost to the refresh
        assert!(gate.has_permission("booking", Action::View));
        assert_eq!(gate.effective_permissions().len(), 1);
        assert_eq!(source.calls(), (1, 2));
    }

    #[tokio::test]
    async fn test_newer_load_wins_profile() {
        let source = Arc::new(ScriptedSource::default());
        let slow = source.deferred_profile();
        source.profile(json!({"role": {"name": "Agent"}}));
        source.matrix(booking_agent());
        source.matrix(json!({}));
        let gate = Arc::new(gate_with(&source, Some("t")));

        let first = tokio::spawn({
            let gate = gate.clone();
            async move { gate.load().await }
        });
        while source.calls().0 < 1 {
            tokio::task::yield_now().await;
        }
        gate.load().await;

        slow.send(Ok(serde_json::from_value(json!({"is_superuser": true})).unwrap()))
            .unwrap();
        first.await.unwrap();

        assert!(!gate.is_superadmin());
        assert!(gate.has_permission("booking", Action::View));
    }

    #[tokio::test]
    async fn test_token_removed_resets_to_anonymous() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({"is_superuser": true}));
        source.matrix(json!({}));
        let gate = gate_with(&source, Some("t"));
        gate.load().await;
        assert!(gate.is_superadmin());

        gate.tokens().remove(ACCESS_TOKEN_KEY).unwrap();
        gate.load().await;

        assert!(!gate.is_superadmin());
        assert!(!gate.has_permission("booking", Action::View));
        assert_eq!(source.calls(), (1, 1));
    }

    #[tokio::test]
    async fn test_teardown_ignores_late_response() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({"role": {"name": "Agent"}}));
        let pending = source.deferred_matrix();
        let gate = Arc::new(gate_with(&source, Some("t")));

        let task = tokio::spawn({
            let gate = gate.clone();
            async move { gate.load().await }
        });
        while source.calls().1 < 1 {
            tokio::task::yield_now().await;
        }

        gate.teardown();
        task.await.unwrap();
        let _ = pending.send(Ok(serde_json::from_value(booking_agent()).unwrap()));

        assert!(gate.is_torn_down());
        assert!(!gate.is_loading());
        assert!(!gate.has_permission("booking", Action::View));

        gate.load().await;
        assert_eq!(source.calls(), (1, 1));
    }

    #[tokio::test]
    async fn test_custom_token_key() {
        let source = Arc::new(ScriptedSource::default());
        source.profile(json!({"is_superuser": true}));
        source.matrix(json!({}));
        let tokens = MemoryTokenStore::new();
        tokens.set("jwt", "t").unwrap();
        let gate = PermissionGate::new(source.clone(), Arc::new(tokens)).with_token_key("jwt");

        gate.load().await;
        assert!(gate.is_superadmin());
    }
}
