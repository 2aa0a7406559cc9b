// This file is only compiled during tests.
//
// Mirrors the slice of the rppal GPIO API the crate uses. State lives in a
// process-wide registry (tests share one process, and the PWM timer and
// brightness worker threads need to see the same pins), so tests must use
// disjoint pin numbers.

use std::collections::{HashMap, HashSet};
use std::sync::{LazyLock, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)] // mirrors the rppal enum; only FallingEdge is exercised
pub enum Trigger {
    RisingEdge,
    FallingEdge,
    Both,
}

/// What rppal hands to an async interrupt callback.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub timestamp: Duration,
    #[allow(dead_code)]
    pub trigger: Trigger,
}

type Callback = Box<dyn FnMut(Event) + Send>;

#[derive(Default)]
struct MockState {
    levels: HashMap<u8, Level>,
    taken: HashSet<u8>,
    unavailable: HashSet<u8>,
    callbacks: HashMap<u8, Callback>,
}

static STATE: LazyLock<Mutex<MockState>> = LazyLock::new(Mutex::default);

fn state() -> MutexGuard<'static, MockState> {
    STATE.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct Gpio;

impl Gpio {
    pub fn new() -> Result<Self, Error> {
        Ok(Gpio)
    }

    pub fn get(&self, pin: u8) -> Result<Pin, Error> {
        let mut st = state();
        if st.unavailable.contains(&pin) || !st.taken.insert(pin) {
            return Err(Error::PinAcquisitionFailed {
                pin,
                reason: "pin is in use".into(),
            });
        }
        Ok(Pin { pin })
    }
}

pub struct Pin {
    pin: u8,
}

impl Pin {
    pub fn into_input_pullup(self) -> InputPin {
        state().levels
            .insert(self.pin, Level::High);
        InputPin { pin: self.pin }
    }

    pub fn into_output_low(self) -> OutputPin {
        state().levels
            .insert(self.pin, Level::Low);
        OutputPin { pin: self.pin }
    }
}

pub struct InputPin {
    pin: u8,
}

impl InputPin {
    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn set_async_interrupt<C>(
        &mut self,
        _trigger: Trigger,
        _debounce: Option<Duration>,
        callback: C,
    ) -> Result<(), Error>
    where
        C: FnMut(Event) + Send + 'static,
    {
        state().callbacks.insert(self.pin, Box::new(callback));
        Ok(())
    }

    pub fn clear_async_interrupt(&mut self) -> Result<(), Error> {
        state().callbacks.remove(&self.pin);
        Ok(())
    }
}

impl Drop for InputPin {
    fn drop(&mut self) {
        let mut st = state();
        st.callbacks.remove(&self.pin);
        st.taken.remove(&self.pin);
    }
}

pub struct OutputPin {
    pin: u8,
}

impl OutputPin {
    pub fn set_high(&mut self) {
        state().levels
            .insert(self.pin, Level::High);
    }

    pub fn set_low(&mut self) {
        state().levels.insert(self.pin, Level::Low);
    }
}

impl Drop for OutputPin {
    fn drop(&mut self) {
        // The last driven level stays observable after release.
        state().taken.remove(&self.pin);
    }
}

// ** TEST HELPERS ** //

/// Simulate a button edge: invokes the registered interrupt callback with
/// the given monotonic timestamp. No-op if no interrupt is registered.
pub fn fire_edge(pin: u8, timestamp: Duration) {
    let mut st = state();
    if let Some(callback) = st.callbacks.get_mut(&pin) {
        callback(Event {
            timestamp,
            trigger: Trigger::FallingEdge,
        });
    }
}

/// Current electrical level of a pin (default High, the pulled-up idle).
pub fn pin_level(pin: u8) -> Level {
    *state()
        .levels
        .get(&pin)
        .unwrap_or(&Level::High)
}

/// Make `Gpio::get` fail for a pin, to exercise acquisition errors.
pub fn set_unavailable(pin: u8, unavailable: bool) {
    let mut st = state();
    if unavailable {
        st.unavailable.insert(pin);
    } else {
        st.unavailable.remove(&pin);
    }
}

/// Forget everything the mock knows about the given pins.
pub fn reset_pins(pins: &[u8]) {
    let mut st = state();
    for pin in pins {
        st.levels.remove(pin);
        st.taken.remove(pin);
        st.unavailable.remove(pin);
        st.callbacks.remove(pin);
    }
}

/// Hand out an output pin directly, bypassing acquisition bookkeeping.
pub fn output_pin_for_test(pin: u8) -> OutputPin {
    state().levels.insert(pin, Level::Low);
    OutputPin { pin }
}
