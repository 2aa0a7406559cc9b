use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

// Use rppal in production
#[cfg(not(test))]
use rppal::gpio::OutputPin;

#[cfg(test)]
use crate::mocks::mock_gpio::OutputPin;

/// Software PWM: a timer thread slices each period into a HIGH segment of
/// `period * level / max_level` followed by a LOW remainder.
///
/// The timer thread only ever *reads* the level, through an atomic, so it
/// can never observe a torn value; reprogramming is a single store from the
/// brightness worker.
pub struct SoftPwm {
    level: Arc<AtomicU32>,
    stop: Arc<AtomicBool>,
    timer: Option<JoinHandle<()>>,
}

impl SoftPwm {
    /// Take ownership of the output pin and start the timer thread, armed
    /// at level 0 (pin held LOW).
    pub fn start(pin: OutputPin, period: Duration, max_level: u32) -> Self {
        let level = Arc::new(AtomicU32::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let timer = {
            let level = Arc::clone(&level);
            let stop = Arc::clone(&stop);
            thread::spawn(move || run_timer(pin, period, max_level, level, stop))
        };

        Self {
            level,
            stop,
            timer: Some(timer),
        }
    }

    /// Publish a new level; the next period picks it up.
    pub fn reprogram(&self, level: u32) {
        self.level.store(level, Ordering::Release);
    }
}

impl Drop for SoftPwm {
    fn drop(&mut self) {
        // Synchronous cancellation: the pin (and whatever it aliases) must
        // not be touched again once we return.
        self.stop.store(true, Ordering::Release);
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
    }
}

fn run_timer(
    mut pin: OutputPin,
    period: Duration,
    max_level: u32,
    level: Arc<AtomicU32>,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::Acquire) {
        let high = high_duration(period, level.load(Ordering::Acquire), max_level);

        // At level 0 the HIGH arm is skipped entirely: the output stays LOW
        // for the whole period with a single wake-up.
        if !high.is_zero() {
            pin.set_high();
            thread::sleep(high);
        }

        let low = period.saturating_sub(high);
        if !low.is_zero() {
            pin.set_low();
            thread::sleep(low);
        }
    }
    pin.set_low();
}

/// HIGH segment length for one period: `period * level / max_level`,
/// multiplied before dividing (in u128) so the fraction is never truncated
/// to zero for a small nonzero level and never overflows for large periods.
fn high_duration(period: Duration, level: u32, max_level: u32) -> Duration {
    if level == 0 || max_level == 0 {
        return Duration::ZERO;
    }
    let level = level.min(max_level);
    let nanos = period.as_nanos() * u128::from(level) / u128::from(max_level);
    Duration::from_nanos(nanos as u64)
}
