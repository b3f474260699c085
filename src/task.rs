//! Task definition — static, no-alloc task records
//!
//! A task is a resumable routine plus the control block it resumes from.
//! Routines are plain `fn` pointers, so a task is `Copy` and a whole task
//! table fits in a `const` array.

use core::fmt;

use log::debug;

use crate::pt::{Pt, Status, Step, TaskState};

/// Maximum tasks a scheduler table holds
pub const MAX_TASKS: usize = 16;

/// Bytes of task name kept (ASCII, zero padded)
pub const NAME_LEN: usize = 8;

/// Task routine — invoked once per poll cycle with its control block and
/// the context shared by every task of the table
pub type TaskFn<C> = fn(&mut Pt, &mut C) -> Status;

/// Task record
pub struct Task<C> {
    /// Task name (8 ASCII chars max)
    pub name: [u8; NAME_LEN],
    /// Routine
    pub func: Option<TaskFn<C>>,
    /// Control block
    pub pt: Pt,
    /// Routine invocations so far
    pub runs: u32,
}

impl<C> Clone for Task<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Task<C> {}

impl<C> Task<C> {
    /// Empty task slot
    pub const fn empty() -> Self {
        Self {
            name: [0u8; NAME_LEN],
            func: None,
            pt: Pt::new(),
            runs: 0,
        }
    }

    /// New, not yet started task
    pub fn new(name: &[u8], func: TaskFn<C>) -> Self {
        let mut n = [0u8; NAME_LEN];
        let len = name.len().min(NAME_LEN);
        n[..len].copy_from_slice(&name[..len]);

        Self {
            name: n,
            func: Some(func),
            pt: Pt::new(),
            runs: 0,
        }
    }

    /// Is this slot occupied?
    pub fn is_active(&self) -> bool {
        self.func.is_some()
    }

    /// Name up to the first NUL, or `"?"` when not UTF-8
    pub fn name_str(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("?")
    }

    pub fn state(&self) -> TaskState {
        self.pt.state()
    }

    pub fn start(&mut self) -> bool {
        let started = self.pt.start();
        if started {
            debug!("task {} started", self.name_str());
        }
        started
    }

    /// Only effective once the task has exited.
    pub fn restart(&mut self) -> bool {
        let restarted = self.pt.restart();
        if restarted {
            debug!("task {} restarted", self.name_str());
        }
        restarted
    }

    /// Re-initialise regardless of state (spawning a child)
    pub fn reset(&mut self) {
        self.pt.reset();
    }

    pub fn suspend(&mut self) -> bool {
        let suspended = self.pt.suspend();
        if suspended {
            debug!("task {} suspended", self.name_str());
        }
        suspended
    }

    pub fn resume(&mut self) -> bool {
        let resumed = self.pt.resume();
        if resumed {
            debug!("task {} resumed", self.name_str());
        }
        resumed
    }

    /// Run the routine if the task is runnable.
    ///
    /// Returns true while the task is alive: `Ready`/`Waiting` tasks report
    /// what their routine returns, `Suspended` tasks are alive without
    /// running, `Exited` and unstarted tasks are not alive.
    pub fn schedule(&mut self, ctx: &mut C) -> bool {
        let Some(func) = self.func else {
            return false;
        };
        match self.pt.state() {
            TaskState::Ready | TaskState::Waiting => {
                self.runs = self.runs.wrapping_add(1);
                let status = func(&mut self.pt, ctx);
                if status.is_alive() {
                    return true;
                }
                self.pt.mark_exited();
                debug!("task {} {:?} after {} runs", self.name_str(), status, self.runs);
                false
            }
            TaskState::Suspended => true,
            TaskState::Exited | TaskState::Uninitialized => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.is_active()
            && matches!(
                self.pt.state(),
                TaskState::Ready | TaskState::Waiting | TaskState::Suspended
            )
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name_str())
            .field("pt", &self.pt)
            .field("runs", &self.runs)
            .finish()
    }
}

impl Pt {
    /// Start `child` afresh and block until it finishes.
    ///
    /// The child is re-initialised only when this point is first reached,
    /// not when a later invocation resumes here; it then advances once per
    /// invocation of this routine.
    pub fn spawn<D>(&mut self, child: &mut Task<D>, ctx: &mut D) -> Step {
        if !self.is_resumed() {
            child.reset();
            debug!("spawned child {}", child.name_str());
        }
        self.wait_thread(child.schedule(ctx))
    }
}
