use super::lifecycle::{LifecycleWorkflow, TrialOutcome};
use crate::config::HarnessConfig;
use crate::core::{CancellationSignal, HarnessError};
use crate::lvm::LvmCommands;
use tracing::{error, info};

/// How a worker ended.
#[derive(Debug)]
pub enum WorkerExit {
    /// All configured trials completed
    Finished { trials: usize },
    /// Cancellation was observed during `trial`
    Cancelled { trial: usize },
    /// `trial` failed; the worker stopped there
    Failed { trial: usize, error: HarnessError },
}

impl WorkerExit {
    pub fn is_failed(&self) -> bool {
        matches!(self, WorkerExit::Failed { .. })
    }
}

/// Drives one vg through repeated trials, independently of other workers.
pub struct Worker {
    workflow: LifecycleWorkflow,
    trials: usize,
}

impl Worker {
    pub fn new(lvm: LvmCommands, config: &HarnessConfig, cancel: CancellationSignal) -> Self {
        Self {
            workflow: LifecycleWorkflow::new(lvm, config.lv_count, cancel),
            trials: config.trials,
        }
    }

    pub async fn run(&self, vg_name: &str) -> WorkerExit {
        info!("Worker started");
        let exit = self.run_trials(vg_name).await;
        info!("Worker finished");
        exit
    }

    async fn run_trials(&self, vg_name: &str) -> WorkerExit {
        for trial in 1..=self.trials {
            info!("Starting trial {}/{}", trial, self.trials);

            match self.workflow.run_trial(vg_name).await {
                Ok(TrialOutcome::Completed) => {
                    info!("Trial {} finished", trial);
                }
                Ok(TrialOutcome::Cancelled) => {
                    info!("Trial {} terminated", trial);
                    return WorkerExit::Cancelled { trial };
                }
                Err(error) => {
                    error!("Trial {} failed: {}", trial, error);
                    return WorkerExit::Failed { trial, error };
                }
            }
        }

        WorkerExit::Finished {
            trials: self.trials,
        }
    }
}
