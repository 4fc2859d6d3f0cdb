use super::stats::{LatencySample, ReloadStats};
use crate::config::HarnessConfig;
use crate::core::CancellationSignal;
use crate::lvm::LvmCommands;
use crate::lvm::naming::{lv_name, pv_name, vg_name};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{error, info};

/// Class of metadata a reloader re-reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadScope {
    Pv,
    Vg,
    Lv,
}

impl ReloadScope {
    pub const ALL: [ReloadScope; 3] = [ReloadScope::Pv, ReloadScope::Vg, ReloadScope::Lv];

    pub fn name(&self) -> &'static str {
        match self {
            ReloadScope::Pv => "pv",
            ReloadScope::Vg => "vg",
            ReloadScope::Lv => "lv",
        }
    }

    /// Report command used for this scope.
    pub fn program(&self) -> &'static str {
        match self {
            ReloadScope::Pv => "pvs",
            ReloadScope::Vg => "vgs",
            ReloadScope::Lv => "lvs",
        }
    }

    /// `--select` expression for the target.
    ///
    /// The lv index is only used by [`ReloadScope::Lv`].
    pub fn selection(&self, vg_index: usize, lv_index: usize) -> String {
        match self {
            ReloadScope::Pv => format!("pv_name = {}", pv_name(vg_index)),
            ReloadScope::Vg => format!("vg_name = {}", vg_name(vg_index)),
            ReloadScope::Lv => format!(
                "vg_name = {} && lv_name = {}",
                vg_name(vg_index),
                lv_name(lv_index)
            ),
        }
    }
}

impl fmt::Display for ReloadScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadReport {
    pub scope: ReloadScope,
    /// `None` when the reloader stopped before its first attempt
    pub stats: Option<ReloadStats>,
}

/// Re-queries random targets of one scope until cancelled.
///
/// Attempts run back to back with no pacing.
pub struct Reloader {
    scope: ReloadScope,
    lvm: LvmCommands,
    vg_count: usize,
    lv_count: usize,
    cancel: CancellationSignal,
    rng: StdRng,
}

impl Reloader {
    pub fn new(
        scope: ReloadScope,
        lvm: LvmCommands,
        config: &HarnessConfig,
        cancel: CancellationSignal,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ scope as u64),
            None => StdRng::from_entropy(),
        };

        Self {
            scope,
            lvm,
            vg_count: config.vg_count,
            lv_count: config.lv_count,
            cancel,
            rng,
        }
    }

    pub async fn run(mut self) -> ReloadReport {
        info!("Reloader started");

        let mut samples = Vec::new();
        while !self.cancel.is_cancelled() {
            samples.push(self.reload_once().await);
        }

        let stats = ReloadStats::from_samples(&samples);
        match &stats {
            Some(stats) => info!("Stats: {}", stats),
            None => info!("Stats: reloads=0 errors=0 (no samples)"),
        }

        ReloadReport {
            scope: self.scope,
            stats,
        }
    }

    async fn reload_once(&mut self) -> LatencySample {
        let vg_index = self.rng.gen_range(0..self.vg_count);
        let lv_index = match self.scope {
            ReloadScope::Lv => self.rng.gen_range(0..self.lv_count),
            _ => 0,
        };
        let selection = self.scope.selection(vg_index, lv_index);
        info!("Reloading {} ({})", self.scope, selection);

        let start = Instant::now();
        let result = self.lvm.report(self.scope.program(), &selection).await;
        let elapsed = start.elapsed();

        if let Err(e) = &result {
            error!("Reloading {} failed: {}", self.scope, e);
        }
        LatencySample::new(elapsed, result.is_ok())
    }
}
