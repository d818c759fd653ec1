use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::model::SimulationResult;

/// Observable state of the simulation client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    /// Last successful result, shared read-only with views.
    pub result: Option<Arc<SimulationResult>>,
    /// A run is in flight.
    pub is_loading: bool,
    /// Message of the last failure, cleared when a run starts.
    pub error: Option<String>,
}

/// Coarse phase derived from [`ClientState`], convenient for views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet, or reset.
    Idle,
    /// A run is in flight.
    Loading,
    /// A result is available.
    Ready,
    /// The last run failed.
    Failed,
}

impl ClientState {
    /// Derives the display phase. Loading takes precedence over a stale result.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.result.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }
}

struct Slot {
    state: ClientState,
    latest_token: u64,
}

/// Single mutable cell holding the state; every write is broadcast to subscribers.
pub(crate) struct StateCell {
    slot: RwLock<Slot>,
    sender: broadcast::Sender<ClientState>,
}

impl StateCell {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            slot: RwLock::new(Slot {
                state: ClientState::default(),
                latest_token: 0,
            }),
            sender,
        }
    }

    pub(crate) fn snapshot(&self) -> ClientState {
        self.slot.read().state.clone()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ClientState> {
        self.sender.subscribe()
    }

    /// Issues the next run token and applies the run-start transition.
    pub(crate) fn begin(&self) -> (u64, ClientState) {
        let mut slot = self.slot.write();
        slot.latest_token += 1;
        slot.state.is_loading = true;
        slot.state.error = None;
        let published = slot.state.clone();
        let _ = self.sender.send(published.clone());
        (slot.latest_token, published)
    }

    /// Applies `apply` unless `guard_token` names a run that is no longer the latest.
    pub(crate) fn settle<F>(&self, guard_token: Option<u64>, apply: F) -> Option<ClientState>
    where
        F: FnOnce(&mut ClientState),
    {
        let mut slot = self.slot.write();
        if guard_token.is_some_and(|token| token != slot.latest_token) {
            return None;
        }
        apply(&mut slot.state);
        let published = slot.state.clone();
        let _ = self.sender.send(published.clone());
        Some(published)
    }

    /// Unconditionally writes the initial state. Run tokens are left untouched.
    pub(crate) fn reset(&self) -> ClientState {
        let mut slot = self.slot.write();
        slot.state = ClientState::default();
        let _ = self.sender.send(slot.state.clone());
        slot.state.clone()
    }
}
