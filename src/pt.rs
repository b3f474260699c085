//! Continuation encoding — resumable routines without a stack
//!
//! A routine is a plain function over its task control block ([`Pt`]).
//! Its body is a `loop` around a `match` on [`Pt::resume_point`]; every arm
//! holds at most one suspension point, and [`Pt::goto`] moves on to the next
//! arm. A suspended routine simply returns; the next invocation dispatches
//! straight back into the arm it left, skipping everything before it.
//!
//! A suspension point must open its arm: whatever precedes it in the same
//! arm runs again on every re-evaluation. Keep [`Mark::START`] free of
//! suspension points.
//!
//! ```
//! use upt::{wait, Mark, Pt, Status};
//!
//! fn blink(pt: &mut Pt, toggles: &mut u32) -> Status {
//!     pt.begin();
//!     loop {
//!         match pt.resume_point() {
//!             Mark::START => {
//!                 *toggles += 1;
//!                 pt.goto(Mark(1));
//!             }
//!             Mark(1) => {
//!                 wait!(pt.delay(2));
//!                 *toggles += 1;
//!                 pt.goto(Mark(2));
//!             }
//!             _ => return pt.end(),
//!         }
//!     }
//! }
//!
//! let mut pt = Pt::new();
//! pt.start();
//! let mut toggles = 0;
//! assert_eq!(blink(&mut pt, &mut toggles), Status::Waiting);
//! assert_eq!(blink(&mut pt, &mut toggles), Status::Waiting);
//! assert_eq!(blink(&mut pt, &mut toggles), Status::Ended);
//! assert_eq!(toggles, 2);
//! ```

use core::ops::ControlFlow;

use log::trace;

/// Position inside a routine
///
/// Marks must be unique per routine. [`Mark::START`] is the routine entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mark(pub u16);

impl Mark {
    /// Routine entry
    pub const START: Mark = Mark(0);

    /// The mark numbered directly after this one
    pub const fn next(self) -> Mark {
        Mark(self.0.wrapping_add(1))
    }
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Registered but never started
    Uninitialized,
    /// Runnable, no timed wait in progress
    Ready,
    /// Parked in a timed wait (delay, semaphore, event flag)
    Waiting,
    /// Paused out-of-band until resumed
    Suspended,
    /// Finished; only an explicit restart brings it back
    Exited,
}

/// What a routine invocation reports back to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Blocked on a condition or a timed wait
    Waiting,
    /// Gave up the processor voluntarily
    Yielded,
    /// Left early through [`Pt::exit`]
    Exited,
    /// Ran off the end through [`Pt::end`]
    Ended,
}

impl Status {
    /// `Waiting` and `Yielded` keep the task alive
    pub const fn is_alive(self) -> bool {
        matches!(self, Status::Waiting | Status::Yielded)
    }
}

/// Outcome of a suspension point: `Break` carries the status the routine
/// must return, `Continue` carries the value of the completed wait.
pub type Step<T = ()> = ControlFlow<Status, T>;

/// Unwrap a [`Step`], returning its status from the enclosing routine when
/// the suspension point did not complete.
#[macro_export]
macro_rules! wait {
    ($step:expr) => {
        match $step {
            ::core::ops::ControlFlow::Continue(value) => value,
            ::core::ops::ControlFlow::Break(status) => return status,
        }
    };
}

/// Task control block
///
/// Size: 8 bytes. Owned by exactly one task; other tasks may only read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pt {
    /// Where the next invocation continues
    resume: Mark,
    /// Lifecycle state
    state: TaskState,
    /// Ticks left in the active timed wait (0 unless `Waiting`)
    timeout: i32,
    /// Set while the current arm was entered by dispatch rather than by `goto`
    dispatched: bool,
}

impl Pt {
    /// Fresh, unstarted control block
    pub const fn new() -> Self {
        Self {
            resume: Mark::START,
            state: TaskState::Uninitialized,
            timeout: 0,
            dispatched: false,
        }
    }

    fn init(&mut self) {
        self.resume = Mark::START;
        self.state = TaskState::Ready;
        self.timeout = 0;
        self.dispatched = false;
    }

    /// Current resume point
    pub fn resume_point(&self) -> Mark {
        self.resume
    }

    /// Current lifecycle state
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Ticks left in the active timed wait
    pub fn timeout(&self) -> i32 {
        self.timeout
    }

    // ── Control surface ───────────────────────────────────────────────

    /// Make an unstarted block `Ready`. No-op once started.
    pub fn start(&mut self) -> bool {
        if self.state != TaskState::Uninitialized {
            return false;
        }
        self.init();
        true
    }

    /// Re-enter `Ready` from `Exited`. No-op in any other state.
    pub fn restart(&mut self) -> bool {
        if self.state != TaskState::Exited {
            return false;
        }
        self.init();
        true
    }

    /// Unconditional re-initialisation (used when spawning a child)
    pub fn reset(&mut self) {
        self.init();
    }

    /// Pause from outside. Abandons any timed wait in progress.
    pub fn suspend(&mut self) -> bool {
        match self.state {
            TaskState::Ready | TaskState::Waiting => {
                self.state = TaskState::Suspended;
                self.timeout = 0;
                true
            }
            _ => false,
        }
    }

    /// Undo a suspension. No-op unless `Suspended`.
    pub fn resume(&mut self) -> bool {
        if self.state != TaskState::Suspended {
            return false;
        }
        self.state = TaskState::Ready;
        true
    }

    pub(crate) fn mark_exited(&mut self) {
        self.state = TaskState::Exited;
        self.timeout = 0;
    }

    // ── Routine framing ───────────────────────────────────────────────

    /// Routine entry; call once per invocation before dispatching.
    ///
    /// Returns the mark the invocation resumes at.
    pub fn begin(&mut self) -> Mark {
        self.dispatched = self.resume != Mark::START;
        self.resume
    }

    /// Record `at` as the resume point and move on to it.
    pub fn goto(&mut self, at: Mark) {
        self.resume = at;
        self.dispatched = false;
    }

    /// Was the current arm entered by dispatch from [`Pt::begin`]?
    pub fn is_resumed(&self) -> bool {
        self.dispatched
    }

    /// Normal completion: back to a fresh `Ready` cycle at the top.
    pub fn end(&mut self) -> Status {
        self.init();
        Status::Ended
    }

    /// Leave the routine early.
    pub fn exit(&mut self) -> Status {
        self.resume = Mark::START;
        self.dispatched = false;
        self.mark_exited();
        Status::Exited
    }

    /// Restart the routine from the top on its next invocation.
    pub fn rewind(&mut self) -> Status {
        self.resume = Mark::START;
        self.dispatched = false;
        if self.state == TaskState::Waiting {
            self.disarm();
        }
        Status::Waiting
    }

    /// Pause this task; once resumed it continues at `next`.
    pub fn suspend_self(&mut self, next: Mark) -> Status {
        self.goto(next);
        self.suspend();
        Status::Waiting
    }

    // ── Suspension points ─────────────────────────────────────────────

    /// Block until `cond` holds. Re-evaluated on every invocation.
    pub fn wait_until(&mut self, cond: bool) -> Step {
        if cond {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(Status::Waiting)
        }
    }

    /// Block while `cond` holds.
    pub fn wait_while(&mut self, cond: bool) -> Step {
        self.wait_until(!cond)
    }

    /// Block while a child task still reports alive.
    ///
    /// Pass the child's `schedule` result so the child advances once per
    /// parent invocation.
    pub fn wait_thread(&mut self, child_alive: bool) -> Step {
        self.wait_while(child_alive)
    }

    /// Yield once, then continue on the next invocation.
    pub fn yield_now(&mut self) -> Step {
        if self.dispatched {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(Status::Yielded)
        }
    }

    /// Yield once, then keep yielding until `cond` holds.
    pub fn yield_until(&mut self, cond: bool) -> Step {
        if self.dispatched && cond {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(Status::Yielded)
        }
    }

    // ── Timed-wait bookkeeping ────────────────────────────────────────

    pub(crate) fn arm(&mut self, ticks: i32) {
        trace!("timed wait armed at {:?} for {} ticks", self.resume, ticks);
        self.state = TaskState::Waiting;
        self.timeout = ticks;
    }

    pub(crate) fn disarm(&mut self) {
        self.state = TaskState::Ready;
        self.timeout = 0;
    }

    /// One tick off the active wait; true while ticks remain.
    pub(crate) fn countdown(&mut self) -> bool {
        self.timeout -= 1;
        self.timeout > 0
    }
}

impl Default for Pt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    /// Three marks, each suspending once on an external condition.
    fn stepper(pt: &mut Pt, env: &mut (bool, Vec<u16>)) -> Status {
        pt.begin();
        loop {
            match pt.resume_point() {
                Mark::START => {
                    env.1.push(0);
                    pt.goto(Mark(1));
                }
                Mark(1) => {
                    wait!(pt.wait_until(env.0));
                    env.1.push(1);
                    pt.goto(Mark(2));
                }
                Mark(2) => {
                    wait!(pt.wait_while(env.0));
                    env.1.push(2);
                    pt.goto(Mark(3));
                }
                _ => return pt.end(),
            }
        }
    }

    #[test]
    fn test_new_is_uninitialized() {
        let pt = Pt::new();
        assert_eq!(pt.state(), TaskState::Uninitialized);
        assert_eq!(pt.resume_point(), Mark::START);
        assert_eq!(pt.timeout(), 0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut pt = Pt::new();
        assert!(pt.start());
        pt.goto(Mark(4));
        assert!(!pt.start());
        assert_eq!(pt.resume_point(), Mark(4));
        assert_eq!(pt.state(), TaskState::Ready);
    }

    #[test]
    fn test_restart_only_from_exited() {
        let mut pt = Pt::new();
        assert!(!pt.restart());
        pt.start();
        pt.goto(Mark(2));
        assert!(!pt.restart());
        assert_eq!(pt.resume_point(), Mark(2));

        assert_eq!(pt.exit(), Status::Exited);
        assert_eq!(pt.state(), TaskState::Exited);
        assert!(pt.restart());
        assert_eq!(pt.state(), TaskState::Ready);
        assert_eq!(pt.resume_point(), Mark::START);
    }

    #[test]
    fn test_resumes_exactly_after_suspension() {
        let mut pt = Pt::new();
        pt.start();
        let mut env = (false, Vec::new());

        assert_eq!(stepper(&mut pt, &mut env), Status::Waiting);
        assert_eq!(stepper(&mut pt, &mut env), Status::Waiting);
        assert_eq!(env.1, [0]);

        env.0 = true;
        assert_eq!(stepper(&mut pt, &mut env), Status::Waiting);
        assert_eq!(env.1, [0, 1]);

        env.0 = false;
        assert_eq!(stepper(&mut pt, &mut env), Status::Ended);
        assert_eq!(env.1, [0, 1, 2]);
    }

    #[test]
    fn test_end_resets_for_next_cycle() {
        let mut pt = Pt::new();
        pt.start();
        let mut env = (true, Vec::new());
        // wait_while(true) parks on mark 2
        assert_eq!(stepper(&mut pt, &mut env), Status::Waiting);
        env.0 = false;
        assert_eq!(stepper(&mut pt, &mut env), Status::Ended);
        assert_eq!(pt.resume_point(), Mark::START);
        assert_eq!(pt.state(), TaskState::Ready);

        env.0 = true;
        assert_eq!(stepper(&mut pt, &mut env), Status::Waiting);
        assert_eq!(env.1, [0, 1, 2, 0, 1]);
    }

    fn yielder(pt: &mut Pt, count: &mut u32) -> Status {
        pt.begin();
        loop {
            match pt.resume_point() {
                Mark::START => pt.goto(Mark(1)),
                Mark(1) => {
                    wait!(pt.yield_now());
                    *count += 1;
                    pt.goto(Mark(2));
                }
                Mark(2) => {
                    wait!(pt.yield_until(*count >= 3));
                    return pt.exit();
                }
                _ => return pt.end(),
            }
        }
    }

    #[test]
    fn test_yield_gives_up_once() {
        let mut pt = Pt::new();
        pt.start();
        let mut count = 0;

        assert_eq!(yielder(&mut pt, &mut count), Status::Yielded);
        assert_eq!(count, 0);
        // resumed at the yield: falls through, then yields at mark 2
        assert_eq!(yielder(&mut pt, &mut count), Status::Yielded);
        assert_eq!(count, 1);
        assert_eq!(pt.resume_point(), Mark(2));
    }

    #[test]
    fn test_yield_until_requires_condition() {
        let mut pt = Pt::new();
        pt.start();
        let mut count = 0;
        yielder(&mut pt, &mut count);
        yielder(&mut pt, &mut count);

        // resumed at mark 2 but the condition is still false
        assert_eq!(yielder(&mut pt, &mut count), Status::Yielded);
        count = 3;
        assert_eq!(yielder(&mut pt, &mut count), Status::Exited);
        assert_eq!(pt.state(), TaskState::Exited);
        assert_eq!(pt.resume_point(), Mark::START);
    }

    #[test]
    fn test_rewind_clears_wait() {
        let mut pt = Pt::new();
        pt.start();
        pt.goto(Mark(5));
        pt.arm(10);
        assert_eq!(pt.rewind(), Status::Waiting);
        assert_eq!(pt.resume_point(), Mark::START);
        assert_eq!(pt.state(), TaskState::Ready);
        assert_eq!(pt.timeout(), 0);
    }

    #[test]
    fn test_suspend_resets_timeout() {
        let mut pt = Pt::new();
        pt.start();
        pt.arm(7);
        assert!(pt.suspend());
        assert_eq!(pt.state(), TaskState::Suspended);
        assert_eq!(pt.timeout(), 0);
        assert!(!pt.suspend());
        assert!(pt.resume());
        assert_eq!(pt.state(), TaskState::Ready);
        assert!(!pt.resume());
    }

    #[test]
    fn test_suspend_self_continues_at_next() {
        let mut pt = Pt::new();
        pt.start();
        assert_eq!(pt.suspend_self(Mark(3)), Status::Waiting);
        assert_eq!(pt.state(), TaskState::Suspended);
        assert_eq!(pt.resume_point(), Mark(3));
    }

    #[test]
    fn test_status_liveness() {
        assert!(Status::Waiting.is_alive());
        assert!(Status::Yielded.is_alive());
        assert!(!Status::Exited.is_alive());
        assert!(!Status::Ended.is_alive());
    }
}
