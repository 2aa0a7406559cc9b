use crate::debounce::Event;

/// Coarse LED state, always derived from the brightness level:
/// `Off` iff level == 0, `Max` iff level == max_level, `On` otherwise.
/// Never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Off,
    On,
    Max,
}

impl LedState {
    pub fn for_level(level: u32, max_level: u32) -> Self {
        if level == 0 {
            LedState::Off
        } else if level >= max_level {
            LedState::Max
        } else {
            LedState::On
        }
    }
}

/// State machine mapping button events to a bounded brightness level.
///
/// Transition table (state x event):
///
/// |       | None  | Up    | Down  |
/// |-------|-------|-------|-------|
/// | Off   | no-op | +1    | no-op |
/// | On    | no-op | +1    | -1    |
/// | Max   | no-op | no-op | -1    |
///
/// `apply` is a pure function of (state, event, level): no hidden inputs,
/// so any event sequence can be replayed in a test.
pub struct BrightnessFsm {
    level: u32,
    max_level: u32,
    state: LedState,
}

impl BrightnessFsm {
    pub fn new(max_level: u32) -> Self {
        Self::with_level(max_level, 0)
    }

    /// Start at an arbitrary level (clamped into range).
    pub fn with_level(max_level: u32, level: u32) -> Self {
        let level = level.min(max_level);
        Self {
            level,
            max_level,
            state: LedState::for_level(level, max_level),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn state(&self) -> LedState {
        self.state
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Run one transition and return the new level.
    ///
    /// The table already rules out moving past either bound (`Up` at `Max`
    /// and `Down` at `Off` are no-ops); the saturating/min arithmetic is a
    /// second line of defense, not the mechanism.
    pub fn apply(&mut self, event: Event) -> u32 {
        self.level = match (self.state, event) {
            (_, Event::None) => self.level,
            (LedState::Off | LedState::On, Event::Up) => {
                self.level.saturating_add(1).min(self.max_level)
            }
            (LedState::Max, Event::Up) => self.level,
            (LedState::On | LedState::Max, Event::Down) => self.level.saturating_sub(1),
            (LedState::Off, Event::Down) => self.level,
        };
        // Recomputed together with the level; there is no window where the
        // two disagree.
        self.state = LedState::for_level(self.level, self.max_level);
        self.level
    }
}
