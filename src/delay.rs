//! Delay — countdown suspension measured in poll cycles
//!
//! `ticks` counts scheduler invocations of the task, not wall-clock time.
//! Actual latency is `ticks` × the host's poll period; a host that polls
//! every 1 ms gets millisecond delays, one that polls on every interrupt
//! gets whatever that rate is.

use core::ops::ControlFlow;

use log::trace;

use crate::pt::{Pt, Status, Step, TaskState};

impl Pt {
    /// Suspend for `ticks` invocations.
    ///
    /// The first entry arms the countdown and returns `Waiting`; each later
    /// entry takes one tick off, so the routine sees exactly `ticks`
    /// `Waiting` returns before falling through. `ticks <= 0` never waits.
    pub fn delay(&mut self, ticks: i32) -> Step {
        if self.state() == TaskState::Waiting {
            if self.countdown() {
                return ControlFlow::Break(Status::Waiting);
            }
            trace!("delay at {:?} elapsed", self.resume_point());
            self.disarm();
            return ControlFlow::Continue(());
        }

        if ticks <= 0 {
            return ControlFlow::Continue(());
        }
        self.arm(ticks);
        ControlFlow::Break(Status::Waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pt::Mark;
    use crate::wait;

    /// Delays `ticks`, then counts one completion.
    fn sleeper(pt: &mut Pt, env: &mut (i32, u32)) -> Status {
        pt.begin();
        loop {
            match pt.resume_point() {
                Mark::START => pt.goto(Mark(1)),
                Mark(1) => {
                    wait!(pt.delay(env.0));
                    env.1 += 1;
                    pt.goto(Mark(2));
                }
                _ => return pt.end(),
            }
        }
    }

    fn waiting_returns(ticks: i32) -> u32 {
        let mut pt = Pt::new();
        pt.start();
        let mut env = (ticks, 0);
        let mut waits = 0;
        while sleeper(&mut pt, &mut env) == Status::Waiting {
            waits += 1;
            assert!(waits < 1000, "delay never elapsed");
        }
        assert_eq!(env.1, 1);
        waits
    }

    #[test]
    fn test_delay_exact_waiting_count() {
        assert_eq!(waiting_returns(1), 1);
        assert_eq!(waiting_returns(3), 3);
        assert_eq!(waiting_returns(10), 10);
    }

    #[test]
    fn test_delay_zero_falls_through() {
        assert_eq!(waiting_returns(0), 0);
        assert_eq!(waiting_returns(-5), 0);
    }

    #[test]
    fn test_delay_state_transitions() {
        let mut pt = Pt::new();
        pt.start();
        pt.goto(Mark(1));
        assert_eq!(pt.delay(2), ControlFlow::Break(Status::Waiting));
        assert_eq!(pt.state(), TaskState::Waiting);
        assert_eq!(pt.timeout(), 2);

        assert_eq!(pt.delay(2), ControlFlow::Break(Status::Waiting));
        assert_eq!(pt.timeout(), 1);

        assert_eq!(pt.delay(2), ControlFlow::Continue(()));
        assert_eq!(pt.state(), TaskState::Ready);
        assert_eq!(pt.timeout(), 0);
    }

    #[test]
    fn test_delay_does_not_rerun_earlier_code() {
        let mut pt = Pt::new();
        pt.start();
        let mut env = (4, 0);
        for _ in 0..4 {
            assert_eq!(sleeper(&mut pt, &mut env), Status::Waiting);
            assert_eq!(pt.resume_point(), Mark(1));
        }
        assert_eq!(sleeper(&mut pt, &mut env), Status::Ended);
        assert_eq!(env.1, 1);
    }
}
