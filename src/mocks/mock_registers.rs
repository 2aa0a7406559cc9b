// This file is only compiled during tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::registers::{Region, RegisterIo};

/// In-memory register file. Clones share the same backing store, so a test
/// can keep a handle for inspection after moving one into the engine.
#[derive(Clone, Default)]
pub struct MockRegisters {
    regs: Arc<Mutex<HashMap<(Region, usize), u32>>>,
}

impl MockRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a register without going through the trait (test inspection).
    pub fn get(&self, region: Region, offset: usize) -> u32 {
        *self
            .regs
            .lock()
            .unwrap()
            .get(&(region, offset))
            .unwrap_or(&0)
    }

    /// Preset a register, e.g. a pin's function-select before acquisition.
    pub fn set(&self, region: Region, offset: usize, value: u32) {
        self.regs.lock().unwrap().insert((region, offset), value);
    }

    /// Independent deep copy of the current register file, for
    /// snapshot-compare tests around setup/teardown.
    pub fn snapshot(&self) -> Self {
        Self {
            regs: Arc::new(Mutex::new(self.regs.lock().unwrap().clone())),
        }
    }
}

impl RegisterIo for MockRegisters {
    fn read(&self, region: Region, offset: usize) -> u32 {
        self.get(region, offset)
    }

    fn write(&mut self, region: Region, offset: usize, value: u32) {
        self.set(region, offset, value);
    }
}
