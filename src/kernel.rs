//! Kernel — top-level protothread manager
//!
//! Combines the task table, the context every routine shares and a run
//! configuration into a single instance. Entry point for hosts that want
//! a ready-made poll loop.

use log::{info, trace, warn};

use crate::error::Error;
use crate::scheduler::Scheduler;
use crate::task::TaskFn;

/// Run configuration
#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub struct KernelConfig {
    /// Name used in log lines
    pub name: &'static str,
    /// Stop `run` with an error after this many cycles (`None` = never)
    pub cycle_limit: Option<u64>,
}

impl KernelConfig {
    pub const fn new() -> Self {
        Self {
            name: "upt",
            cycle_limit: None,
        }
    }

    pub const fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    pub const fn with_cycle_limit(self, cycles: u64) -> Self {
        Self {
            cycle_limit: Some(cycles),
            ..self
        }
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Protothread kernel
///
/// No heap: the task table is inline and `C` is owned by value.
pub struct Kernel<C> {
    /// Task table
    pub scheduler: Scheduler<C>,
    /// Context handed to every routine
    pub context: C,
    config: KernelConfig,
    /// Total poll cycles executed
    pub total_cycles: u64,
}

impl<C> Kernel<C> {
    /// Kernel with the default configuration
    pub const fn new(context: C) -> Self {
        Self::with_config(context, KernelConfig::new())
    }

    pub const fn with_config(context: C, config: KernelConfig) -> Self {
        Self {
            scheduler: Scheduler::new(),
            context,
            config,
            total_cycles: 0,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Register a task (not yet started)
    pub fn add_task(&mut self, name: &[u8], func: TaskFn<C>) -> Result<usize, Error> {
        self.scheduler.register(name, func)
    }

    /// Start every registered task
    pub fn start_all(&mut self) {
        self.scheduler.start_all();
        info!(
            "{}: {} tasks started",
            self.config.name,
            self.scheduler.task_count()
        );
    }

    /// Run one poll cycle; true while any task is alive.
    pub fn tick(&mut self) -> bool {
        self.total_cycles += 1;
        self.scheduler.cycle(&mut self.context)
    }

    /// Poll until every task has exited, calling `idle` between cycles.
    ///
    /// `idle` is where the host yields a tick; it also gets the context, so
    /// it can play the part of an outside producer.
    pub fn run(&mut self, mut idle: impl FnMut(&mut C)) -> Result<KernelStats, Error> {
        let start = self.total_cycles;
        loop {
            let cycles = self.total_cycles - start;
            if let Some(limit) = self.config.cycle_limit {
                if cycles >= limit {
                    warn!(
                        "{}: {} tasks still alive after {} cycles",
                        self.config.name,
                        self.scheduler.alive_task_count(),
                        cycles
                    );
                    return Err(Error::CycleLimit { cycles });
                }
            }
            if !self.tick() {
                break;
            }
            trace!("{}: idle after cycle {}", self.config.name, self.total_cycles);
            idle(&mut self.context);
        }

        let stats = self.stats(self.total_cycles - start);
        info!("{}: all tasks exited after {} cycles", self.config.name, stats.cycles);
        Ok(stats)
    }

    fn stats(&self, cycles: u64) -> KernelStats {
        let mut stats = KernelStats {
            cycles,
            tasks: self.scheduler.task_count(),
            exited: 0,
            runs: 0,
        };
        for idx in 0..self.scheduler.task_count() {
            if let Some(task) = self.scheduler.get_task(idx) {
                if !task.is_alive() {
                    stats.exited += 1;
                }
                stats.runs += u64::from(task.runs);
            }
        }
        stats
    }

    /// Memory footprint estimate
    pub fn memory_footprint(&self) -> usize {
        core::mem::size_of::<Self>()
    }
}

/// Kernel execution statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelStats {
    /// Poll cycles in this run
    pub cycles: u64,
    /// Registered tasks
    pub tasks: usize,
    /// Tasks not alive at the end
    pub exited: usize,
    /// Routine invocations, all tasks, since registration
    pub runs: u64,
}
