use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while bringing the dimmer up.
///
/// All of these are startup errors. The hot paths (interrupt callbacks, the
/// PWM timer thread, the brightness worker) have no recoverable failures;
/// anything going wrong there is a defect and is logged, not returned.
#[derive(Debug, Error)]
pub enum Error {
    /// Pin identifier outside the BCM header range.
    #[error("invalid GPIO pin {0}")]
    InvalidPin(u8),

    /// The pin exists but could not be acquired (in use or unavailable).
    #[error("failed to acquire GPIO pin {pin}: {reason}")]
    PinAcquisitionFailed { pin: u8, reason: String },

    /// Edge interrupt could not be registered on a button pin.
    #[error("failed to register interrupt on GPIO pin {pin}: {reason}")]
    InterruptRegistrationFailed { pin: u8, reason: String },

    /// A peripheral register window could not be made addressable.
    #[error("failed to map peripheral registers: {0}")]
    RegisterMapFailed(String),
}
