//! Cooperative poll scheduler
//!
//! No preemption, no priorities. One poll cycle schedules every registered
//! task once, in registration order, and ORs their liveness. The host
//! repeats cycles, idling between them, until nothing is alive.
//!
//! Membership is fixed by the static task table; there is no run queue.

use log::{info, trace};

use crate::error::Error;
use crate::task::{Task, TaskFn, MAX_TASKS};

/// Static task table
///
/// Size: MAX_TASKS × sizeof(Task) + overhead, no dynamic allocation.
pub struct Scheduler<C> {
    /// Static task table
    tasks: [Task<C>; MAX_TASKS],
    /// Number of registered tasks
    task_count: usize,
    /// Poll cycles run so far
    cycles: u64,
}

impl<C> Scheduler<C> {
    /// Create empty scheduler
    pub const fn new() -> Self {
        Self {
            tasks: [Task::empty(); MAX_TASKS],
            task_count: 0,
            cycles: 0,
        }
    }

    /// Register a task, returns slot index. The task starts `Uninitialized`.
    pub fn register(&mut self, name: &[u8], func: TaskFn<C>) -> Result<usize, Error> {
        if self.task_count >= MAX_TASKS {
            return Err(Error::TaskTableFull);
        }
        let idx = self.task_count;
        self.tasks[idx] = Task::new(name, func);
        self.task_count += 1;
        info!("task #{} {} registered", idx, self.tasks[idx].name_str());
        Ok(idx)
    }

    fn slot(&mut self, idx: usize) -> Result<&mut Task<C>, Error> {
        self.tasks[..self.task_count]
            .get_mut(idx)
            .ok_or(Error::NoSuchTask(idx))
    }

    /// Start a task. Returns whether it changed state.
    pub fn start(&mut self, idx: usize) -> Result<bool, Error> {
        Ok(self.slot(idx)?.start())
    }

    /// Start every registered task
    pub fn start_all(&mut self) {
        for task in &mut self.tasks[..self.task_count] {
            task.start();
        }
    }

    /// Restart an exited task. Returns whether it changed state.
    pub fn restart(&mut self, idx: usize) -> Result<bool, Error> {
        Ok(self.slot(idx)?.restart())
    }

    /// Suspend a task
    pub fn suspend(&mut self, idx: usize) -> Result<bool, Error> {
        Ok(self.slot(idx)?.suspend())
    }

    /// Resume a suspended task
    pub fn resume(&mut self, idx: usize) -> Result<bool, Error> {
        Ok(self.slot(idx)?.resume())
    }

    /// Schedule one task; true while it is alive.
    ///
    /// Unknown indices are reported as not alive.
    pub fn schedule(&mut self, idx: usize, ctx: &mut C) -> bool {
        match self.slot(idx) {
            Ok(task) => task.schedule(ctx),
            Err(_) => false,
        }
    }

    /// One poll cycle over the whole table; true while any task is alive.
    ///
    /// Every task is scheduled even after one has reported alive.
    pub fn cycle(&mut self, ctx: &mut C) -> bool {
        let mut alive = false;
        for task in &mut self.tasks[..self.task_count] {
            alive |= task.schedule(ctx);
        }
        self.cycles += 1;
        trace!("cycle {} alive={}", self.cycles, alive);
        alive
    }

    /// Number of registered tasks
    pub fn task_count(&self) -> usize {
        self.task_count
    }

    /// Number of tasks started and not yet exited
    pub fn alive_task_count(&self) -> usize {
        self.tasks[..self.task_count]
            .iter()
            .filter(|t| t.is_alive())
            .count()
    }

    /// Get task by index
    pub fn get_task(&self, idx: usize) -> Option<&Task<C>> {
        self.tasks[..self.task_count].get(idx)
    }

    /// Poll cycles run so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Host poll loop: run `alive` until it reports false, calling `idle`
/// between cycles.
///
/// `alive` is typically an OR of `schedule` calls (use `|`, not `||`, so
/// every task runs each cycle). Returns the number of cycles evaluated.
pub fn poll(mut alive: impl FnMut() -> bool, mut idle: impl FnMut()) -> u64 {
    let mut cycles = 0u64;
    loop {
        cycles += 1;
        if !alive() {
            return cycles;
        }
        idle();
    }
}
