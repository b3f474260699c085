//! UPT — stackless protothreads
//!
//! Suspend a routine anywhere, resume it exactly there, without giving it
//! a stack of its own:
//! - Continuation encoding: one `u16` resume point per task
//! - Static task table (no heap, no allocation)
//! - Tick-counted delays, counting semaphores, 32-bit event flags
//! - Cooperative poll loop; the host supplies the tick between cycles
//!
//! Semaphores and event flags are the only state safe to touch from
//! interrupt context. Everything in a [`Pt`] belongs to its one task.

#![no_std]

pub mod pt;
pub mod delay;
pub mod sem;
pub mod flag;
pub mod task;
pub mod scheduler;
pub mod kernel;
pub mod error;

pub use pt::{Mark, Pt, Status, Step, TaskState};
pub use sem::{Semaphore, WaitResult};
pub use flag::EventFlag;
pub use task::{Task, TaskFn, MAX_TASKS};
pub use scheduler::{poll, Scheduler};
pub use kernel::{Kernel, KernelConfig, KernelStats};
pub use error::Error;
