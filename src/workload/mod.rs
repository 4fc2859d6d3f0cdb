pub mod lifecycle;
pub mod reloader;
pub mod stats;
pub mod worker;

pub use lifecycle::{LifecycleWorkflow, PASSES, Phase, TrialOutcome, commands_per_lv};
pub use reloader::{ReloadReport, ReloadScope, Reloader};
pub use stats::{LatencySample, ReloadStats};
pub use worker::{Worker, WorkerExit};
