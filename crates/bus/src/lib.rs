use core_types::TimestampMs;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Host -> engine: reasons to run the re-initialization pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Initial document ready.
    DocumentReady,
    /// The host swapped the displayed content (single-page navigation).
    ContentSwapped { location: String },
    /// A link was activated; new content is expected to mount shortly.
    LinkActivated { href: String },
    /// Periodic poll for content changes.
    PollTick,
}

/// Engine -> host: things the host should surface or may want to observe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Blocking user-facing prompt (e.g. submit without a selected alternative).
    Prompt { exercise: String, message: String },
    /// A re-initialization pass completed.
    Reinitialized {
        at: TimestampMs,
        blocks: usize,
        newly_bound: usize,
    },
    /// A persisted record was written.
    Persisted { key: String, submitted: bool },
}

pub struct Bus {
    pub trigger_tx: Sender<TriggerEvent>,
    pub trigger_rx: Receiver<TriggerEvent>,
    pub notice_tx: Sender<Notice>,
    pub notice_rx: Receiver<Notice>,
}

impl Bus {
    pub fn new() -> Self {
        let (trigger_tx, trigger_rx) = channel();
        let (notice_tx, notice_rx) = channel();
        Self {
            trigger_tx,
            trigger_rx,
            notice_tx,
            notice_rx,
        }
    }

    /// Handle the host keeps to deliver trigger events from its own callbacks.
    pub fn trigger_sender(&self) -> Sender<TriggerEvent> {
        self.trigger_tx.clone()
    }

    pub fn notify(&self, notice: Notice) {
        // The receiver lives in the same struct, so sending cannot fail while `self` is alive.
        let _ = self.notice_tx.send(notice);
    }

    pub fn pending_triggers(&self) -> Vec<TriggerEvent> {
        self.trigger_rx.try_iter().collect()
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        self.notice_rx.try_iter().collect()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_from_cloned_senders_arrive_in_order() {
        let bus = Bus::new();
        let tx = bus.trigger_sender();
        tx.send(TriggerEvent::DocumentReady).unwrap();
        tx.send(TriggerEvent::PollTick).unwrap();
        assert_eq!(
            bus.pending_triggers(),
            vec![TriggerEvent::DocumentReady, TriggerEvent::PollTick]
        );
        assert!(bus.pending_triggers().is_empty());
    }

    #[test]
    fn notices_are_drained_once() {
        let bus = Bus::new();
        bus.notify(Notice::Persisted {
            key: "/a::choice_1".to_string(),
            submitted: true,
        });
        assert_eq!(bus.drain_notices().len(), 1);
        assert!(bus.drain_notices().is_empty());
    }
}
