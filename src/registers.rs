use std::io;
use std::ptr;

use crate::error::{Error, Result};

/// Peripheral register blocks touched by the hardware PWM path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// GPIO controller (function-select registers).
    Gpio,
    /// Clock manager (PWM clock control and divisor).
    Clock,
    /// PWM controller (control, range and duty registers).
    Pwm,
}

/// Narrow interface to memory-mapped peripheral registers.
///
/// Production uses [`MemRegisters`] over `/dev/mem`; tests substitute an
/// in-memory implementation. Offsets are byte offsets within the block and
/// must be word-aligned.
pub trait RegisterIo: Send {
    fn read(&self, region: Region, offset: usize) -> u32;
    fn write(&mut self, region: Region, offset: usize, value: u32);
}

// Block offsets from the peripheral base, and the length we map per block.
const GPIO_OFFSET: usize = 0x20_0000;
const CLOCK_OFFSET: usize = 0x10_1000;
const PWM_OFFSET: usize = 0x20_c000;
const BLOCK_LEN: usize = 4096;

/// `/dev/mem` mappings of the three register blocks.
pub struct MemRegisters {
    gpio: *mut u32,
    clock: *mut u32,
    pwm: *mut u32,
}

// Raw pointers into shared mappings; the serialization discipline in the
// controller guarantees a single register-writing context.
unsafe impl Send for MemRegisters {}

impl MemRegisters {
    /// Map the GPIO, clock-manager and PWM blocks at `peripheral_base`.
    /// Requires read/write access to `/dev/mem` (i.e. root).
    pub fn map(peripheral_base: usize) -> Result<Self> {
        let fd = unsafe {
            libc::open(
                c"/dev/mem".as_ptr(),
                libc::O_RDWR | libc::O_SYNC | libc::O_CLOEXEC,
            )
        };
        if fd < 0 {
            return Err(map_failed("open /dev/mem"));
        }

        let result = (|| {
            let gpio = map_block(fd, peripheral_base + GPIO_OFFSET)?;
            let clock = match map_block(fd, peripheral_base + CLOCK_OFFSET) {
                Ok(ptr) => ptr,
                Err(e) => {
                    unmap(gpio);
                    return Err(e);
                }
            };
            let pwm = match map_block(fd, peripheral_base + PWM_OFFSET) {
                Ok(ptr) => ptr,
                Err(e) => {
                    unmap(gpio);
                    unmap(clock);
                    return Err(e);
                }
            };
            Ok(Self { gpio, clock, pwm })
        })();

        // The mappings stay valid after the fd is closed.
        unsafe { libc::close(fd) };
        result
    }

    fn base(&self, region: Region) -> *mut u32 {
        match region {
            Region::Gpio => self.gpio,
            Region::Clock => self.clock,
            Region::Pwm => self.pwm,
        }
    }
}

impl RegisterIo for MemRegisters {
    fn read(&self, region: Region, offset: usize) -> u32 {
        debug_assert!(offset % 4 == 0 && offset < BLOCK_LEN);
        unsafe { self.base(region).add(offset / 4).read_volatile() }
    }

    fn write(&mut self, region: Region, offset: usize, value: u32) {
        debug_assert!(offset % 4 == 0 && offset < BLOCK_LEN);
        unsafe { self.base(region).add(offset / 4).write_volatile(value) }
    }
}

impl Drop for MemRegisters {
    fn drop(&mut self) {
        unmap(self.gpio);
        unmap(self.clock);
        unmap(self.pwm);
    }
}

fn map_block(fd: libc::c_int, addr: usize) -> Result<*mut u32> {
    let ptr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            BLOCK_LEN,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd,
            addr as libc::off_t,
        )
    };
    if ptr == libc::MAP_FAILED {
        Err(map_failed("mmap register block"))
    } else {
        Ok(ptr as *mut u32)
    }
}

fn unmap(ptr: *mut u32) {
    unsafe {
        libc::munmap(ptr as *mut libc::c_void, BLOCK_LEN);
    }
}

fn map_failed(what: &str) -> Error {
    Error::RegisterMapFailed(format!("{what}: {}", io::Error::last_os_error()))
}
