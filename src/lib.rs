pub mod config;
pub mod controller;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod fsm;
pub mod hwpwm;
pub mod registers;
pub mod softpwm;

// Re-export commonly used types
pub use config::{Config, Strategy};
pub use controller::Controller;
pub use debounce::{ButtonId, EdgeDebouncer, Event};
pub use error::{Error, Result};
pub use fsm::{BrightnessFsm, LedState};

#[cfg(test)]
pub(crate) mod mocks;
