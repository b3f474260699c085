//! Counting semaphore with bounded wait
//!
//! Acquisition is two-step: [`Pt::sem_wait`] only observes that a unit is
//! available, [`Semaphore::release`] consumes it. With several waiters on
//! one unit, every waiter that observes it proceeds until someone releases.
//!
//! `signal` and `release` are single critical sections, so producers may
//! call them from interrupt context.

use core::cell::Cell;
use core::ops::ControlFlow;

use critical_section::Mutex;
use log::trace;

use crate::pt::{Pt, Status, Step, TaskState};

/// Result of a semaphore or event-flag wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult<T = ()> {
    /// Non-blocking call (`timeout <= 0`) and the condition was false
    NoWait,
    /// Blocked, then the timeout expired first
    TimedOut,
    /// Condition met; carries the matched value
    Ready(T),
}

impl<T> WaitResult<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitResult::Ready(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, WaitResult::TimedOut)
    }

    /// The matched value, if the wait succeeded
    pub fn ready(self) -> Option<T> {
        match self {
            WaitResult::Ready(v) => Some(v),
            _ => None,
        }
    }
}

impl WaitResult<()> {
    /// Classic integer encoding: 0 no-wait, -1 timeout, 1 success
    pub fn raw(self) -> i32 {
        match self {
            WaitResult::NoWait => 0,
            WaitResult::TimedOut => -1,
            WaitResult::Ready(()) => 1,
        }
    }
}

impl WaitResult<u32> {
    /// Classic integer encoding: 0 no-wait, -1 timeout, matched bits on
    /// success (reinterpreted as `i32`)
    pub fn raw(self) -> i32 {
        match self {
            WaitResult::NoWait => 0,
            WaitResult::TimedOut => -1,
            WaitResult::Ready(bits) => bits as i32,
        }
    }
}

/// Counting semaphore
///
/// Size: 1 byte of state. `const`-constructible for use as a `static`.
pub struct Semaphore {
    count: Mutex<Cell<u8>>,
}

impl Semaphore {
    /// Semaphore holding `count` units
    pub const fn new(count: u8) -> Self {
        Self {
            count: Mutex::new(Cell::new(count)),
        }
    }

    /// Units currently available
    pub fn count(&self) -> u8 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }

    /// Add one unit. Never blocks; saturates at `u8::MAX`.
    pub fn signal(&self) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(count.get().saturating_add(1));
        });
    }

    /// Consume one unit. Returns false (and does nothing) when empty.
    pub fn release(&self) -> bool {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            match count.get() {
                0 => false,
                n => {
                    count.set(n - 1);
                    true
                }
            }
        })
    }

    /// Force the count (setup only)
    pub fn reset(&self, count: u8) {
        critical_section::with(|cs| self.count.borrow(cs).set(count));
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Pt {
    /// Shared skeleton of every bounded wait.
    ///
    /// `probe` is re-run on each entry; `Some` ends the wait with success.
    pub(crate) fn timed_wait<T>(
        &mut self,
        timeout: i32,
        mut probe: impl FnMut() -> Option<T>,
    ) -> Step<WaitResult<T>> {
        if self.state() != TaskState::Waiting {
            if let Some(v) = probe() {
                return ControlFlow::Continue(WaitResult::Ready(v));
            }
            if timeout <= 0 {
                return ControlFlow::Continue(WaitResult::NoWait);
            }
            self.arm(timeout);
            return ControlFlow::Break(Status::Waiting);
        }

        if let Some(v) = probe() {
            self.disarm();
            return ControlFlow::Continue(WaitResult::Ready(v));
        }
        if self.countdown() {
            return ControlFlow::Break(Status::Waiting);
        }
        trace!("wait at {:?} timed out", self.resume_point());
        self.disarm();
        ControlFlow::Continue(WaitResult::TimedOut)
    }

    /// Wait up to `timeout` invocations for `sem` to hold a unit.
    ///
    /// Does not consume the unit; pair with [`Semaphore::release`].
    /// `timeout <= 0` polls once without blocking.
    pub fn sem_wait(&mut self, sem: &Semaphore, timeout: i32) -> Step<WaitResult> {
        self.timed_wait(timeout, || (sem.count() > 0).then_some(()))
    }
}
