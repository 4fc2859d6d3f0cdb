use crate::config::HarnessConfig;
use crate::core::{CancellationSignal, Result};
use crate::lvm::LvmCommands;
use crate::lvm::naming::vg_name;
use crate::workload::{ReloadReport, ReloadScope, Reloader, Worker, WorkerExit};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

/// What the run left behind once every task has stopped.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub workers: Vec<WorkerExit>,
    pub reloads: Vec<ReloadReport>,
}

impl RunSummary {
    pub fn failed_workers(&self) -> usize {
        self.workers.iter().filter(|exit| exit.is_failed()).count()
    }
}

/// Owns the lifetime of a stress run.
///
/// Reloaders run until the workers are done (or the run is cancelled); only
/// then is the shared signal set for them.
pub struct Coordinator {
    config: Arc<HarnessConfig>,
    lvm: LvmCommands,
    cancel: CancellationSignal,
}

impl Coordinator {
    pub fn new(config: HarnessConfig, lvm: LvmCommands, cancel: CancellationSignal) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            lvm,
            cancel,
        })
    }

    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancel
    }

    pub async fn run(&self) -> RunSummary {
        let reloaders = self.start_reloaders();
        let workers = self.start_workers().await;

        let workers = wait_all("workers", workers, self.config.poll_interval).await;
        info!("Workers stopped");

        self.cancel.cancel();

        let reloads = wait_all("reloaders", reloaders, self.config.poll_interval).await;
        info!("Reloaders stopped");

        RunSummary { workers, reloads }
    }

    fn start_reloaders(&self) -> Vec<JoinHandle<ReloadReport>> {
        ReloadScope::ALL
            .into_iter()
            .map(|scope| {
                info!("Starting {} reloader", scope);
                let reloader =
                    Reloader::new(scope, self.lvm.clone(), &self.config, self.cancel.clone());
                let span = info_span!("reload", scope = %scope);
                tokio::spawn(reloader.run().instrument(span))
            })
            .collect()
    }

    /// Starts one worker per vg, pausing between starts so the workers are
    /// spread over different lifecycle phases.
    async fn start_workers(&self) -> Vec<JoinHandle<WorkerExit>> {
        let mut workers = Vec::with_capacity(self.config.vg_count);

        for i in 0..self.config.vg_count {
            if self.cancel.is_cancelled() {
                info!("Run cancelled, not starting remaining workers");
                break;
            }

            let vg = vg_name(i);
            info!("Starting worker for vg {}", vg);

            let worker = Worker::new(self.lvm.clone(), &self.config, self.cancel.clone());
            let span = info_span!("worker", id = %format!("{:02}", i));
            workers.push(tokio::spawn(
                async move { worker.run(&vg).await }.instrument(span),
            ));

            tokio::time::sleep(self.config.stagger).await;
        }

        workers
    }
}

/// Joins the tasks in order, waking up every `poll` to report progress.
async fn wait_all<T>(what: &str, handles: Vec<JoinHandle<T>>, poll: Duration) -> Vec<T> {
    let total = handles.len();
    let mut results = Vec::with_capacity(total);

    for (done, mut handle) in handles.into_iter().enumerate() {
        loop {
            match tokio::time::timeout(poll, &mut handle).await {
                Ok(Ok(value)) => {
                    results.push(value);
                    break;
                }
                Ok(Err(err)) => {
                    error!("Task in {} ended abnormally: {}", what, err);
                    break;
                }
                Err(_) => debug!("Waiting for {} ({}/{} stopped)", what, done, total),
            }
        }
    }

    results
}

/// Sets `cancel` on SIGINT or SIGTERM.
///
/// The listener task only flips the flag and logs; the run notices at its
/// next checkpoint.
pub fn install_signal_handlers(cancel: CancellationSignal) -> Result<JoinHandle<()>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = sigint.recv() => "SIGINT",
                Some(()) = sigterm.recv() => "SIGTERM",
                else => break,
            };
            info!("Terminating after signal {}", name);
            cancel.cancel();
        }
    }))
}
