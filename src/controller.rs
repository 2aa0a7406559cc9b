use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};

// Use rppal in production
#[cfg(not(test))]
use rppal::gpio::{Event as GpioEvent, Gpio, InputPin, Trigger};

#[cfg(test)]
use crate::mocks::mock_gpio::{Event as GpioEvent, Gpio, InputPin, Trigger};

use crate::config::{Config, GPIO_PIN_MAX};
use crate::debounce::{ButtonId, EdgeDebouncer, Event};
use crate::engine::PwmEngine;
use crate::error::{Error, Result};
use crate::fsm::{BrightnessFsm, LedState};

/// Glues the debouncer, the state machine and the PWM engine together and
/// owns the startup/shutdown ordering.
///
/// Concurrency discipline: button interrupts only debounce and hand off
/// through a single-slot mailbox; one worker thread is the sole mutator of
/// the state machine and the engine. A button edge arriving while an update
/// is still pending is dropped, so rapid double-presses coalesce instead of
/// queuing up behind each other.
pub struct Controller {
    level: Arc<AtomicU32>,
    max_level: u32,
    tx: Option<SyncSender<Event>>,
    worker: Option<JoinHandle<()>>,
    button_up: InputPin,
    button_down: InputPin,
}

impl Controller {
    /// Bring the whole stack up: button pins, then the engine's output
    /// resources (pin or mapped registers, clock, timers), then the worker,
    /// then interrupts. A failure at any step releases everything acquired
    /// before it and reports that single error; the system never runs
    /// partially configured.
    pub fn new(config: Config) -> Result<Self> {
        let config = config.clamped();

        let gpio = Gpio::new().map_err(|e| Error::RegisterMapFailed(e.to_string()))?;
        let button_up = acquire_button(&gpio, config.button_up_pin)?;
        let button_down = acquire_button(&gpio, config.button_down_pin)?;

        let engine = PwmEngine::new(&gpio, &config)?;

        let level = Arc::new(AtomicU32::new(0));
        let (tx, rx) = sync_channel::<Event>(1);
        let worker = spawn_worker(rx, engine, config.max_level, Arc::clone(&level));

        let mut controller = Self {
            level,
            max_level: config.max_level,
            tx: Some(tx.clone()),
            worker: Some(worker),
            button_up,
            button_down,
        };

        // Interrupts go live last, once everything they feed exists. If
        // registration fails midway the usual shutdown path unwinds the
        // worker, the engine and the first button's interrupt.
        if let Err(e) = controller.enable_interrupts(tx, config.debounce_interval_ms) {
            controller.shutdown();
            return Err(e);
        }

        Ok(controller)
    }

    fn enable_interrupts(&mut self, tx: SyncSender<Event>, interval_ms: u64) -> Result<()> {
        let debouncer = Arc::new(EdgeDebouncer::new(interval_ms));

        let buttons = [
            (&mut self.button_up, ButtonId::Up),
            (&mut self.button_down, ButtonId::Down),
        ];
        for (pin, button) in buttons {
            let debouncer = Arc::clone(&debouncer);
            let tx = tx.clone();
            let number = pin.pin();
            pin.set_async_interrupt(Trigger::FallingEdge, None, move |edge: GpioEvent| {
                // Interrupt context: debounce, stamp, hand off. No register
                // access, no blocking, no allocation.
                handoff(&debouncer, &tx, button, edge.timestamp.as_millis() as u64);
            })
            .map_err(|e| Error::InterruptRegistrationFailed {
                pin: number,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Current brightness level, readable from any thread.
    pub fn level(&self) -> u32 {
        self.level.load(Ordering::Acquire)
    }

    /// LED state derived from the current level, so it can never disagree
    /// with it.
    pub fn led_state(&self) -> LedState {
        LedState::for_level(self.level(), self.max_level)
    }

    /// Tear down in the exact reverse of startup: interrupts off, mailbox
    /// closed, worker drained and joined (which tears down the engine:
    /// timers joined, peripheral deconfigured, registers unmapped), button
    /// pins released when `self` drops. Idempotent.
    pub fn shutdown(&mut self) {
        let _ = self.button_up.clear_async_interrupt();
        let _ = self.button_down.clear_async_interrupt();

        // Closing the last sender lets the worker drain any pending event
        // and exit; joining guarantees nothing touches the engine's state
        // after this returns.
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::error!("brightness worker panicked during shutdown");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Interrupt-side handoff: classify the raw edge and, if it survives the
/// debouncer, try to post it to the worker. A full mailbox means an update
/// is already pending; the edge is dropped, not queued, so a burst of
/// presses collapses to a single update.
fn handoff(debouncer: &EdgeDebouncer, tx: &SyncSender<Event>, button: ButtonId, timestamp_ms: u64) {
    match debouncer.on_edge(button, timestamp_ms) {
        Event::None => {}
        event => {
            let _ = tx.try_send(event);
        }
    }
}

fn acquire_button(gpio: &Gpio, pin: u8) -> Result<InputPin> {
    if pin > GPIO_PIN_MAX {
        return Err(Error::InvalidPin(pin));
    }
    Ok(gpio
        .get(pin)
        .map_err(|e| Error::PinAcquisitionFailed {
            pin,
            reason: e.to_string(),
        })?
        .into_input_pullup())
}

/// The deferred context: the only place the state machine advances and the
/// engine gets reprogrammed.
fn spawn_worker(
    rx: Receiver<Event>,
    mut engine: PwmEngine,
    max_level: u32,
    level: Arc<AtomicU32>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut fsm = BrightnessFsm::new(max_level);
        while let Ok(event) = rx.recv() {
            let new_level = fsm.apply(event);
            if new_level > max_level {
                // State-model corruption, not something to clamp away.
                log::error!("brightness level {new_level} outside 0..={max_level}");
                debug_assert!(new_level <= max_level);
            }
            level.store(new_level, Ordering::Release);
            engine.reprogram(new_level);
            log::debug!("brightness {new_level}/{max_level} ({:?})", fsm.state());
        }
        // Mailbox closed: engine drops here, before shutdown() returns.
    })
}
