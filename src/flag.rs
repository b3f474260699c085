//! Event flags — 32 independent signal bits with wait-any / wait-all
//!
//! Any context may `set` or `clear` bits, including interrupt handlers.
//! A waiter that matches consumes the bits it matched unless `no_clear`
//! is passed; match and clear happen in one critical section, so a bit
//! set by a producer in between is never lost.

use core::cell::Cell;

use critical_section::Mutex;

use crate::pt::{Pt, Step};
use crate::sem::WaitResult;

/// Shared event-flag word
pub struct EventFlag {
    bits: Mutex<Cell<u32>>,
}

impl EventFlag {
    /// All bits clear
    pub const fn new() -> Self {
        Self {
            bits: Mutex::new(Cell::new(0)),
        }
    }

    /// Snapshot of the current bits
    pub fn bits(&self) -> u32 {
        critical_section::with(|cs| self.bits.borrow(cs).get())
    }

    /// Set every bit in `mask`
    pub fn set(&self, mask: u32) {
        critical_section::with(|cs| {
            let bits = self.bits.borrow(cs);
            bits.set(bits.get() | mask);
        });
    }

    /// Clear every bit in `mask`
    pub fn clear(&self, mask: u32) {
        critical_section::with(|cs| {
            let bits = self.bits.borrow(cs);
            bits.set(bits.get() & !mask);
        });
    }

    /// Match any bit of `mask`; returns the matched bits.
    pub fn take_any(&self, mask: u32, no_clear: bool) -> Option<u32> {
        critical_section::with(|cs| {
            let bits = self.bits.borrow(cs);
            let matched = bits.get() & mask;
            if matched == 0 {
                return None;
            }
            if !no_clear {
                bits.set(bits.get() & !matched);
            }
            Some(matched)
        })
    }

    /// Match every bit of `mask`; returns `mask`.
    pub fn take_all(&self, mask: u32, no_clear: bool) -> Option<u32> {
        critical_section::with(|cs| {
            let bits = self.bits.borrow(cs);
            if bits.get() & mask != mask {
                return None;
            }
            if !no_clear {
                bits.set(bits.get() & !mask);
            }
            Some(mask)
        })
    }
}

impl Default for EventFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl Pt {
    /// Wait up to `timeout` invocations for any bit of `mask`.
    ///
    /// Succeeds with the matched bits (`flag & mask`), not the whole mask.
    /// `timeout <= 0` polls once without blocking.
    pub fn flag_wait_any(
        &mut self,
        flag: &EventFlag,
        mask: u32,
        no_clear: bool,
        timeout: i32,
    ) -> Step<WaitResult<u32>> {
        self.timed_wait(timeout, || flag.take_any(mask, no_clear))
    }

    /// Wait up to `timeout` invocations for every bit of `mask`.
    ///
    /// Succeeds with `mask`. An empty mask matches immediately.
    pub fn flag_wait_all(
        &mut self,
        flag: &EventFlag,
        mask: u32,
        no_clear: bool,
        timeout: i32,
    ) -> Step<WaitResult<u32>> {
        self.timed_wait(timeout, || flag.take_all(mask, no_clear))
    }
}
