//! Provider lifecycle and the screen-side accessor
//!
//! A [`PermissionProvider`] owns the gate for the lifetime of a logged-in
//! session: it starts the initial load, reloads when the window regains
//! focus, and tears everything down on unmount. Screens never reach for
//! the gate globally; they receive a [`ScreenContext`].

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::gate::PermissionGate;
use crate::ClientConfig;
use crate::error::GateError;

/// Window lifecycle events fed to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Focus,
    Blur,
}

/// Mounted permission gate plus its focus listener
#[derive(Debug)]
pub struct PermissionProvider {
    gate: Arc<PermissionGate>,
    listener: Option<JoinHandle<()>>,
}

impl PermissionProvider {
    /// Mount the provider: start the initial load in the background and,
    /// when `window_events` is given, reload on every focus event.
    ///
    /// Must be called inside a tokio runtime.
    pub fn mount(gate: Arc<PermissionGate>, window_events: Option<broadcast::Receiver<WindowEvent>>) -> Self {
        tokio::spawn({
            let gate = gate.clone();
            async move { gate.load().await }
        });

        let listener = window_events.map(|events| {
            tokio::spawn(listen_for_focus(gate.clone(), events, gate.shutdown_token()))
        });

        tracing::debug!(refresh_on_focus = listener.is_some(), "Permission provider mounted");
        Self { gate, listener }
    }

    /// Like [`mount`](Self::mount), ignoring window events when
    /// `refresh_on_focus` is disabled in `config`.
    pub fn mount_with_config(
        gate: Arc<PermissionGate>,
        config: &ClientConfig,
        window_events: Option<broadcast::Receiver<WindowEvent>>,
    ) -> Self {
        Self::mount(gate, window_events.filter(|_| config.refresh_on_focus))
    }

    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.gate
    }

    /// Context handed to screens rendered under this provider
    pub fn context(&self) -> ScreenContext {
        ScreenContext::with_permissions(self.gate.clone())
    }

    /// Wait for the initial (or current) load to settle
    pub async fn ready(&self) {
        self.gate.wait_until_loaded().await;
    }

    /// Tear down the gate and deregister the focus listener
    pub async fn unmount(mut self) {
        self.gate.teardown();
        if let Some(listener) = self.listener.take() {
            // The listener exits on the cancelled token; a join error means it panicked.
            if let Err(e) = listener.await {
                tracing::warn!(error = %e, "Focus listener ended abnormally");
            }
        }
    }
}

impl Drop for PermissionProvider {
    fn drop(&mut self) {
        self.gate.teardown();
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

async fn listen_for_focus(
    gate: Arc<PermissionGate>,
    mut events: broadcast::Receiver<WindowEvent>,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Ok(WindowEvent::Focus) => spawn_reload(&gate),
            Ok(WindowEvent::Blur) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Missed events may have included a focus; reload once.
                tracing::debug!(skipped, "Focus listener lagged");
                spawn_reload(&gate);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::debug!("Focus listener stopped");
}

fn spawn_reload(gate: &Arc<PermissionGate>) {
    let gate = gate.clone();
    tokio::spawn(async move { gate.load().await });
}

/// Dependencies handed to a screen.
#[derive(Debug, Clone, Default)]
pub struct ScreenContext {
    permissions: Option<Arc<PermissionGate>>,
}

impl ScreenContext {
    /// Context without a provider. Only useful for screens that never check permissions.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permissions(gate: Arc<PermissionGate>) -> Self {
        Self {
            permissions: Some(gate),
        }
    }

    /// The permission gate, or [`GateError::MissingProvider`] when the
    /// screen was built outside a provider.
    pub fn permissions(&self) -> Result<&Arc<PermissionGate>, GateError> {
        self.permissions.as_ref().ok_or_else(|| {
            tracing::error!("Permissions accessed outside a PermissionProvider");
            GateError::MissingProvider
        })
    }
}
