//! Shared application state
//!
//! Thread-safe state shared by every request handler: the session store,
//! per-session checkout phase, gallery state, and the event broadcaster.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use eg_common::events::EgEvent;

use crate::config::Config;
use crate::gallery::GalleryState;
use crate::notify::OrderNotifier;
use crate::session::SessionStore;

// Re-export CheckoutPhase from eg-common so handlers and the checkout
// orchestrator share one definition
pub use eg_common::events::CheckoutPhase;

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access with rare writes
pub struct SharedState {
    /// Service configuration
    pub config: Config,

    /// Transient per-session storage
    pub sessions: SessionStore,

    /// Checkout phase per session
    pub checkout_phases: RwLock<HashMap<Uuid, CheckoutPhase>>,

    /// Gallery playback and filter state
    pub gallery: RwLock<GalleryState>,

    /// Form-relay notification client
    pub notifier: OrderNotifier,

    /// Event broadcaster for SSE events
    pub event_tx: broadcast::Sender<EgEvent>,
}

impl SharedState {
    /// Create new shared state from configuration
    pub fn new(config: Config) -> Self {
        let (event_tx, _) = broadcast::channel(100); // Buffer up to 100 events
        let ttl = Duration::from_secs(config.session_ttl_secs);
        let notifier = OrderNotifier::new(config.notify_endpoint.clone());
        Self {
            sessions: SessionStore::new(ttl),
            checkout_phases: RwLock::new(HashMap::new()),
            gallery: RwLock::new(GalleryState::new()),
            notifier,
            event_tx,
            config,
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: EgEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<EgEvent> {
        self.event_tx.subscribe()
    }

    /// Get the checkout phase for a session (Loading before first view)
    pub async fn checkout_phase(&self, session_id: Uuid) -> CheckoutPhase {
        self.checkout_phases
            .read()
            .await
            .get(&session_id)
            .copied()
            .unwrap_or(CheckoutPhase::Loading)
    }

    /// Atomically enter the Submitting phase
    ///
    /// Returns false when the session is already Submitting, so a second
    /// submit cannot slip in between check and set.
    pub async fn try_begin_submit(&self, session_id: Uuid) -> bool {
        {
            let mut phases = self.checkout_phases.write().await;
            if phases.get(&session_id) == Some(&CheckoutPhase::Submitting) {
                return false;
            }
            phases.insert(session_id, CheckoutPhase::Submitting);
        }
        self.broadcast_event(EgEvent::CheckoutPhaseChanged {
            phase: CheckoutPhase::Submitting,
            timestamp: chrono::Utc::now(),
        });
        true
    }

    /// Set the checkout phase for a session and broadcast the change
    pub async fn set_checkout_phase(&self, session_id: Uuid, phase: CheckoutPhase) {
        let previous = self
            .checkout_phases
            .write()
            .await
            .insert(session_id, phase);
        if previous != Some(phase) {
            self.broadcast_event(EgEvent::CheckoutPhaseChanged {
                phase,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}
