use std::time::Duration;

// ** GPIO CONFIGURATION ** //

/// GPIO pin assignments for the two momentary push-buttons.
pub const GPIO_BUTTON_UP: u8 = 23;
pub const GPIO_BUTTON_DOWN: u8 = 24;

/// GPIO pin driving the LED.
/// Hardware PWM is available on:
/// - GPIO 12 (PWM0)
/// - GPIO 13 (PWM1)
/// - GPIO 18 (PWM0) - Most commonly used
/// - GPIO 19 (PWM1)
pub const GPIO_LED: u8 = 18;

/// Highest BCM pin number exposed on the 40-pin header.
pub const GPIO_PIN_MAX: u8 = 27;

/// Two edges on the same button closer together than this are a bounce;
/// only the first is accepted.
pub const DEBOUNCE_INTERVAL_MS: u64 = 200;

// ** PWM CONFIGURATION ** //

/// Software PWM period. 10 ms (100 Hz) is fast enough to be flicker-free
/// while keeping the timer thread's wake-up rate modest.
pub const SOFT_PWM_PERIOD: Duration = Duration::from_millis(10);

/// Default brightness resolution for the PWM-capable engines.
pub const MAX_LEVEL: u32 = 32;

/// Brightness resolution when the output is plain on/off.
pub const DIRECT_BINARY_MAX_LEVEL: u32 = 2;

/// Value programmed into the PWM range register; the duty register is set
/// to `range * level / max_level`.
pub const PWM_RANGE: u32 = 1024;

/// The 19.2 MHz oscillator is divided by this (integer part, plus a
/// fractional part in 1/4096 steps) to clock the PWM generator.
pub const CLOCK_DIVISOR_INT: u32 = 64;
pub const CLOCK_DIVISOR_FRAC: u32 = 0;

/// Physical address of the peripheral window (BCM2837, Pi 2/3).
pub const PERIPHERAL_BASE: usize = 0x3f00_0000;

/// How the brightness level is turned into an electrical waveform.
/// Chosen once at startup, never switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Pin fully on or off depending on level > 0.
    DirectBinary,
    /// Timer-thread-driven toggling of a plain digital output.
    SoftwarePwm,
    /// Direct register programming of the PWM peripheral.
    HardwarePwm,
}

/// Fixed startup parameters. Read once when the controller is built;
/// nothing here changes at runtime.
#[derive(Debug, Clone)]
pub struct Config {
    pub strategy: Strategy,
    pub button_up_pin: u8,
    pub button_down_pin: u8,
    pub led_pin: u8,
    pub max_level: u32,
    pub debounce_interval_ms: u64,
    pub soft_pwm_period: Duration,
    pub pwm_range: u32,
    pub clock_divisor: (u32, u32),
    pub peripheral_base: usize,
}

impl Config {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            button_up_pin: GPIO_BUTTON_UP,
            button_down_pin: GPIO_BUTTON_DOWN,
            led_pin: GPIO_LED,
            max_level: MAX_LEVEL,
            debounce_interval_ms: DEBOUNCE_INTERVAL_MS,
            soft_pwm_period: SOFT_PWM_PERIOD,
            pwm_range: PWM_RANGE,
            clock_divisor: (CLOCK_DIVISOR_INT, CLOCK_DIVISOR_FRAC),
            peripheral_base: PERIPHERAL_BASE,
        }
    }

    /// Clamp `max_level` into the usable range of the selected engine.
    pub fn clamped(mut self) -> Self {
        let ceiling = match self.strategy {
            Strategy::DirectBinary => DIRECT_BINARY_MAX_LEVEL,
            Strategy::SoftwarePwm | Strategy::HardwarePwm => MAX_LEVEL,
        };
        self.max_level = self.max_level.min(ceiling);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Strategy::SoftwarePwm)
    }
}
