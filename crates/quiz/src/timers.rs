use core_types::TimestampMs;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerTask {
    /// Debounced save of a text answer, captured when the input happened.
    Autosave { key: String, text: String },
    /// Re-initialization after a link activation, with the link's resolved location.
    LinkReinit { location: String },
    /// Periodic content-change check.
    Poll,
}

#[derive(Debug)]
struct Timer {
    id: TimerId,
    due: TimestampMs,
    task: TimerTask,
}

/// Pending one-shot timers, fired in deadline order by the session.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: TimestampMs, task: TimerTask) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push(Timer { id, due, task });
        id
    }

    /// Returns `false` if the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Removes and returns every timer due at `now`, earliest first (ties in scheduling order).
    pub fn take_due(&mut self, now: TimestampMs) -> Vec<(TimerId, TimerTask)> {
        let (mut due, pending): (Vec<Timer>, Vec<Timer>) =
            self.timers.drain(..).partition(|t| t.due <= now);
        self.timers = pending;
        due.sort_by_key(|t| (t.due, t.id));
        due.into_iter().map(|t| (t.id, t.task)).collect()
    }

    pub fn next_due(&self) -> Option<TimestampMs> {
        self.timers.iter().map(|t| t.due).min()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
