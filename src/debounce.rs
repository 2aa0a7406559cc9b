use std::sync::atomic::{AtomicU64, Ordering};

/// Which physical push-button an edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Up,
    Down,
}

/// Logical event produced from a debounced edge. Transient: produced here,
/// consumed once by the state machine, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Edge suppressed (bounce), nothing to do.
    None,
    Up,
    Down,
}

/// Sentinel for "no edge accepted on this line yet".
const NEVER: u64 = u64::MAX;

/// Suppresses contact bounce on the two button lines.
///
/// `on_edge` runs on the interrupt threads, so everything here is atomic,
/// allocation-free and non-blocking. Each line's last-accepted timestamp is
/// written only from that line's own interrupt thread; the atomics exist so
/// the stores are well-defined, not to arbitrate writers.
pub struct EdgeDebouncer {
    interval_ms: u64,
    last_up_ms: AtomicU64,
    last_down_ms: AtomicU64,
}

impl EdgeDebouncer {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_up_ms: AtomicU64::new(NEVER),
            last_down_ms: AtomicU64::new(NEVER),
        }
    }

    /// Classify a raw edge. Returns `Event::None` when the edge falls inside
    /// the debounce window; otherwise moves the window forward and returns
    /// the button's logical event. The first edge on a line is always
    /// accepted. Edges exactly one interval apart are both accepted.
    pub fn on_edge(&self, button: ButtonId, timestamp_ms: u64) -> Event {
        let window = match button {
            ButtonId::Up => &self.last_up_ms,
            ButtonId::Down => &self.last_down_ms,
        };

        let last = window.load(Ordering::Acquire);
        if last != NEVER && timestamp_ms.saturating_sub(last) < self.interval_ms {
            return Event::None;
        }

        // Updated only at acceptance time, never rolled back.
        window.store(timestamp_ms, Ordering::Release);
        match button {
            ButtonId::Up => Event::Up,
            ButtonId::Down => Event::Down,
        }
    }
}
