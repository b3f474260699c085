//! Errors of the task-table and kernel surface
//!
//! Primitive waits never fail with an error; their outcome is a
//! [`WaitResult`](crate::WaitResult) or a [`Status`](crate::Status).

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// All `MAX_TASKS` slots are taken
    TaskTableFull,
    /// No task registered under this index
    NoSuchTask(usize),
    /// `run` hit the configured cycle limit with tasks still alive
    CycleLimit { cycles: u64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TaskTableFull => write!(f, "task table full"),
            Error::NoSuchTask(idx) => write!(f, "no task at index {}", idx),
            Error::CycleLimit { cycles } => {
                write!(f, "tasks still alive after {} poll cycles", cycles)
            }
        }
    }
}

impl core::error::Error for Error {}
