use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::registers::{Region, RegisterIo};

// Clock manager: PWM clock control and divisor, within the mapped block.
const CM_PWMCTL: usize = 0xa0;
const CM_PWMDIV: usize = 0xa4;
/// Every clock-manager write must carry this password in the top byte.
const CM_PASSWD: u32 = 0x5a << 24;
const CM_CTL_SRC_OSC: u32 = 0x1;
const CM_CTL_ENAB: u32 = 1 << 4;
const CM_CTL_KILL: u32 = 1 << 5;
const CM_CTL_BUSY: u32 = 1 << 7;

// PWM controller registers.
const PWM_CTL: usize = 0x00;
const PWM_RNG1: usize = 0x10;
const PWM_DAT1: usize = 0x14;
const PWM_RNG2: usize = 0x20;
const PWM_DAT2: usize = 0x24;
const CTL_PWEN1: u32 = 1 << 0;
const CTL_MSEN1: u32 = 1 << 7;
const CTL_PWEN2: u32 = 1 << 8;
const CTL_MSEN2: u32 = 1 << 15;

/// The PWM block runs far slower than the bus; back-to-back accesses read
/// stale values on real hardware without a pause in between.
const SETTLE: Duration = Duration::from_micros(10);

/// Bounded wait for the clock generator to report idle after a kill.
const BUSY_WAIT_TRIES: u32 = 100;

/// The two channels of the PWM block, named as the pinout does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Pwm0,
    Pwm1,
}

impl Channel {
    fn rng_offset(self) -> usize {
        match self {
            Channel::Pwm0 => PWM_RNG1,
            Channel::Pwm1 => PWM_RNG2,
        }
    }

    fn dat_offset(self) -> usize {
        match self {
            Channel::Pwm0 => PWM_DAT1,
            Channel::Pwm1 => PWM_DAT2,
        }
    }

    fn ctl_bits(self) -> u32 {
        match self {
            Channel::Pwm0 => CTL_PWEN1 | CTL_MSEN1,
            Channel::Pwm1 => CTL_PWEN2 | CTL_MSEN2,
        }
    }
}

/// Channel and alternate function for a PWM-capable pin.
fn channel_for_pin(pin: u8) -> Result<(Channel, u32)> {
    // Function-select field values: ALT0 = 0b100, ALT5 = 0b010.
    match pin {
        12 => Ok((Channel::Pwm0, 0b100)),
        18 => Ok((Channel::Pwm0, 0b010)),
        13 => Ok((Channel::Pwm1, 0b100)),
        19 => Ok((Channel::Pwm1, 0b010)),
        _ => Err(Error::InvalidPin(pin)),
    }
}

fn fsel_offset(pin: u8) -> usize {
    (pin as usize / 10) * 4
}

fn fsel_shift(pin: u8) -> u32 {
    u32::from(pin % 10) * 3
}

/// Drives the PWM peripheral through its registers.
///
/// Construction runs the full clock + pin + channel bring-up; dropping it
/// runs the exact reverse. The ordering on both sides is structural: the
/// channel is live only while the pin is routed to it, so the pin's
/// function-select is changed last on the way up and restored last on the
/// way down.
pub struct HardwarePwm {
    regs: Box<dyn RegisterIo>,
    pin: u8,
    channel: Channel,
    saved_fsel: u32,
    range: u32,
    max_level: u32,
}

impl HardwarePwm {
    pub fn new(
        regs: Box<dyn RegisterIo>,
        pin: u8,
        divisor: (u32, u32),
        range: u32,
        max_level: u32,
    ) -> Result<Self> {
        let (channel, alt_fsel) = channel_for_pin(pin)?;
        let mut this = Self {
            regs,
            pin,
            channel,
            saved_fsel: 0,
            range,
            max_level,
        };
        this.setup(divisor, alt_fsel);
        Ok(this)
    }

    /// One-time bring-up. Each step is a precondition for the next.
    fn setup(&mut self, (divi, divf): (u32, u32), alt_fsel: u32) {
        // Reset the clock control and divisor registers, then force the
        // generator off before touching the divisor.
        self.write(Region::Clock, CM_PWMCTL, CM_PASSWD);
        self.write(Region::Clock, CM_PWMDIV, CM_PASSWD);
        self.write(Region::Clock, CM_PWMCTL, CM_PASSWD | CM_CTL_KILL);
        self.wait_clock_idle();

        // Divisor, then enable from the oscillator.
        self.write(
            Region::Clock,
            CM_PWMDIV,
            CM_PASSWD | (divi & 0xfff) << 12 | (divf & 0xfff),
        );
        self.write(
            Region::Clock,
            CM_PWMCTL,
            CM_PASSWD | CM_CTL_ENAB | CM_CTL_SRC_OSC,
        );

        // Route the pin to the PWM block, saving its function for teardown.
        let fsel = self.regs.read(Region::Gpio, fsel_offset(self.pin));
        settle();
        let shift = fsel_shift(self.pin);
        self.saved_fsel = (fsel >> shift) & 0b111;
        self.write(
            Region::Gpio,
            fsel_offset(self.pin),
            (fsel & !(0b111 << shift)) | (alt_fsel << shift),
        );

        // Program the range and enable the channel in mark-space mode.
        self.write(Region::Pwm, self.channel.rng_offset(), self.range);
        self.write(Region::Pwm, self.channel.dat_offset(), 0);
        let ctl = self.regs.read(Region::Pwm, PWM_CTL);
        settle();
        self.write(Region::Pwm, PWM_CTL, ctl | self.channel.ctl_bits());
    }

    /// Steady-state update: one duty-register write, no channel re-enable.
    pub fn reprogram(&mut self, level: u32) {
        let duty = scaled_duty(self.range, level, self.max_level);
        self.write(Region::Pwm, self.channel.dat_offset(), duty);
    }

    /// Effective duty register value, for observation.
    pub fn duty(&self) -> u32 {
        let duty = self.regs.read(Region::Pwm, self.channel.dat_offset());
        settle();
        duty
    }

    fn wait_clock_idle(&self) {
        for _ in 0..BUSY_WAIT_TRIES {
            let ctl = self.regs.read(Region::Clock, CM_PWMCTL);
            settle();
            if ctl & CM_CTL_BUSY == 0 {
                return;
            }
        }
        log::warn!("PWM clock still busy after kill");
    }

    fn write(&mut self, region: Region, offset: usize, value: u32) {
        self.regs.write(region, offset, value);
        settle();
    }
}

impl Drop for HardwarePwm {
    fn drop(&mut self) {
        // Reverse of setup. Restoring the pin function while the channel is
        // still enabled would let the generator glitch the pin after we
        // believe we have relinquished it, so the channel goes first.
        let ctl = self.regs.read(Region::Pwm, PWM_CTL);
        settle();
        self.write(Region::Pwm, PWM_CTL, ctl & !self.channel.ctl_bits());

        self.write(Region::Clock, CM_PWMCTL, CM_PASSWD | CM_CTL_KILL);
        self.write(Region::Clock, CM_PWMDIV, CM_PASSWD);

        let fsel = self.regs.read(Region::Gpio, fsel_offset(self.pin));
        settle();
        let shift = fsel_shift(self.pin);
        self.write(
            Region::Gpio,
            fsel_offset(self.pin),
            (fsel & !(0b111 << shift)) | (self.saved_fsel << shift),
        );
        // The register mappings are released when `regs` drops, after this.
    }
}

/// Duty register value for a level: `range * level / max_level`, truncating.
fn scaled_duty(range: u32, level: u32, max_level: u32) -> u32 {
    if max_level == 0 {
        return 0;
    }
    let level = level.min(max_level);
    (u64::from(range) * u64::from(level) / u64::from(max_level)) as u32
}

fn settle() {
    thread::sleep(SETTLE);
}
