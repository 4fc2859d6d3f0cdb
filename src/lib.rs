// ============================================================================
// lvm-reload-stress Library
// ============================================================================
//
// Reproduces metadata reload races in LVM: workers cycle logical volumes
// through their whole life on separate volume groups while reloaders keep
// re-reading pv, vg and lv metadata as fast as they can.

pub mod config;
pub mod coordinator;
pub mod core;
pub mod executor;
pub mod lvm;
pub mod provision;
pub mod workload;

// Re-export main types for convenience
pub use config::HarnessConfig;
pub use coordinator::{Coordinator, RunSummary, install_signal_handlers};
pub use core::{CancellationSignal, CommandError, HarnessError, Result};
pub use executor::{CommandExecutor, Executor};
pub use lvm::LvmCommands;
pub use workload::{
    LatencySample, LifecycleWorkflow, ReloadReport, ReloadScope, ReloadStats, Reloader,
    TrialOutcome, Worker, WorkerExit,
};
