//! Decides when the displayed content needs another initialization pass.

use crate::config::QuizConfig;
use bus::TriggerEvent;

/// What the observer sees of the displayed content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentSnapshot {
    pub location: String,
    pub block_count: usize,
}

/// Detects content changes between polls. A native mutation mechanism can stand in for
/// [`PollingObserver`] without touching the pipeline.
pub trait ContentChangeObserver {
    /// Records `snapshot`; returns `true` if it differs from the previous observation.
    fn observe(&mut self, snapshot: &ContentSnapshot) -> bool;
}

/// Compares location and exercise block count with the previous observation.
#[derive(Debug, Default)]
pub struct PollingObserver {
    last: Option<ContentSnapshot>,
}

impl PollingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentChangeObserver for PollingObserver {
    fn observe(&mut self, snapshot: &ContentSnapshot) -> bool {
        if self.last.as_ref() == Some(snapshot) {
            return false;
        }
        self.last = Some(snapshot.clone());
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerAction {
    ReinitializeNow,
    ReinitializeAfter { delay_ms: u64 },
    /// Reinitialize only if the observer reports a change.
    CheckForChanges,
}

pub fn action_for(event: &TriggerEvent, config: &QuizConfig) -> TriggerAction {
    match event {
        TriggerEvent::DocumentReady | TriggerEvent::ContentSwapped { .. } => {
            TriggerAction::ReinitializeNow
        }
        TriggerEvent::LinkActivated { .. } => TriggerAction::ReinitializeAfter {
            delay_ms: config.link_reinit_delay_ms,
        },
        TriggerEvent::PollTick => TriggerAction::CheckForChanges,
    }
}
