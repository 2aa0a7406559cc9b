// Use rppal in production
#[cfg(not(test))]
use rppal::gpio::{Gpio, OutputPin};

#[cfg(test)]
use crate::mocks::mock_gpio::{Gpio, OutputPin};

use crate::config::{Config, GPIO_PIN_MAX, Strategy};
use crate::error::{Error, Result};
use crate::hwpwm::HardwarePwm;
use crate::registers::MemRegisters;
use crate::softpwm::SoftPwm;

/// Converts a brightness level into an electrical waveform, by one of three
/// strategies. The controller picks a variant at startup and never switches.
pub enum PwmEngine {
    /// No timing component: pin on iff level > 0.
    DirectBinary { pin: OutputPin },
    Software(SoftPwm),
    Hardware(HardwarePwm),
}

impl PwmEngine {
    /// Acquire the output resources for the configured strategy: the LED
    /// pin for the binary and software engines, the mapped register blocks
    /// (plus clock bring-up and channel enable) for the hardware engine.
    pub fn new(gpio: &Gpio, config: &Config) -> Result<Self> {
        match config.strategy {
            Strategy::DirectBinary => Ok(PwmEngine::DirectBinary {
                pin: acquire_output(gpio, config.led_pin)?,
            }),
            Strategy::SoftwarePwm => {
                let pin = acquire_output(gpio, config.led_pin)?;
                Ok(PwmEngine::Software(SoftPwm::start(
                    pin,
                    config.soft_pwm_period,
                    config.max_level,
                )))
            }
            Strategy::HardwarePwm => {
                let regs = MemRegisters::map(config.peripheral_base)?;
                Ok(PwmEngine::Hardware(HardwarePwm::new(
                    Box::new(regs),
                    config.led_pin,
                    config.clock_divisor,
                    config.pwm_range,
                    config.max_level,
                )?))
            }
        }
    }

    /// Make the output waveform match `level`. Called only from the
    /// serialized brightness worker.
    pub fn reprogram(&mut self, level: u32) {
        match self {
            PwmEngine::DirectBinary { pin } => {
                if level > 0 {
                    pin.set_high();
                } else {
                    pin.set_low();
                }
            }
            PwmEngine::Software(pwm) => pwm.reprogram(level),
            PwmEngine::Hardware(pwm) => pwm.reprogram(level),
        }
    }
}

fn acquire_output(gpio: &Gpio, pin: u8) -> Result<OutputPin> {
    if pin > GPIO_PIN_MAX {
        return Err(Error::InvalidPin(pin));
    }
    Ok(gpio
        .get(pin)
        .map_err(|e| Error::PinAcquisitionFailed {
            pin,
            reason: e.to_string(),
        })?
        .into_output_low())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::mock_gpio::{self, Level};

    #[test]
    fn direct_binary_tracks_level_sign() {
        mock_gpio::reset_pins(&[11]);
        let gpio = Gpio::new().unwrap();
        let mut config = Config::new(Strategy::DirectBinary);
        config.led_pin = 11;
        let mut engine = PwmEngine::new(&gpio, &config).unwrap();

        assert_eq!(mock_gpio::pin_level(11), Level::Low);
        engine.reprogram(1);
        assert_eq!(mock_gpio::pin_level(11), Level::High);
        engine.reprogram(2);
        assert_eq!(mock_gpio::pin_level(11), Level::High);
        engine.reprogram(0);
        assert_eq!(mock_gpio::pin_level(11), Level::Low);
    }

    #[test]
    fn output_pin_out_of_range_is_invalid() {
        let gpio = Gpio::new().unwrap();
        let mut config = Config::new(Strategy::DirectBinary);
        config.led_pin = 99;
        let Err(err) = PwmEngine::new(&gpio, &config) else {
            panic!("expected InvalidPin");
        };
        assert!(matches!(err, Error::InvalidPin(99)));
    }
}
