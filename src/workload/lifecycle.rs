use crate::core::{CancellationSignal, HarnessError, Result};
use crate::lvm::commands::{BLANK_UUID, TAG_VOL_UNINIT, in_use_tag, parent_tag, removed_tag};
use crate::lvm::naming::{lv_name, lv_path};
use crate::lvm::LvmCommands;
use std::fmt;

/// One step in the life of a logical volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Create a 1g lv tagged as initializing
    Create,
    /// Replace the initializing tag with the in-use and parent tags
    TagInUse,
    Activate,
    /// Direct write then read of 2 MiB
    Io,
    /// Grow by 1g
    Extend,
    Deactivate,
    /// Swap the in-use tag for the removal-pending one
    MarkRemoved,
    Discard,
    Remove,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Create => "create",
            Phase::TagInUse => "tag-inuse",
            Phase::Activate => "activate",
            Phase::Io => "io",
            Phase::Extend => "extend",
            Phase::Deactivate => "deactivate",
            Phase::MarkRemoved => "retag-removed",
            Phase::Discard => "discard",
            Phase::Remove => "remove",
        }
    }

    /// Number of external commands the phase runs.
    pub fn command_count(&self) -> usize {
        match self {
            Phase::Io => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four passes of a trial, in execution order.
///
/// Each pass runs over every lv of the vg before the next pass starts.
pub const PASSES: [&[Phase]; 4] = [
    // Provisioning
    &[Phase::Create, Phase::TagInUse, Phase::Deactivate],
    // Usage
    &[Phase::Activate, Phase::Io, Phase::Extend, Phase::Deactivate],
    // Teardown preparation
    &[Phase::MarkRemoved],
    // Removal
    &[Phase::Activate, Phase::Discard, Phase::Deactivate, Phase::Remove],
];

/// External commands a completed trial runs for a single lv.
pub fn commands_per_lv() -> usize {
    PASSES
        .iter()
        .flat_map(|pass| pass.iter())
        .map(Phase::command_count)
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    Completed,
    /// Cancellation was observed before an lv started; finished steps stay.
    Cancelled,
}

/// Runs every lv of one vg through its whole life.
#[derive(Clone)]
pub struct LifecycleWorkflow {
    lvm: LvmCommands,
    lv_count: usize,
    cancel: CancellationSignal,
}

impl LifecycleWorkflow {
    pub fn new(lvm: LvmCommands, lv_count: usize, cancel: CancellationSignal) -> Self {
        Self {
            lvm,
            lv_count,
            cancel,
        }
    }

    /// Runs one trial against `vg_name`.
    ///
    /// Cancellation is checked before each lv of each pass, never while a
    /// command is running. The first failing command ends the trial; there is
    /// no retry and no rollback.
    pub async fn run_trial(&self, vg_name: &str) -> Result<TrialOutcome> {
        for pass in PASSES {
            for i in 0..self.lv_count {
                if self.cancel.is_cancelled() {
                    return Ok(TrialOutcome::Cancelled);
                }

                let lv_name = lv_name(i);
                for &phase in pass {
                    self.run_phase(phase, vg_name, &lv_name)
                        .await
                        .map_err(|source| HarnessError::Step {
                            phase: phase.name(),
                            lv: lv_path(vg_name, &lv_name),
                            source: Box::new(source),
                        })?;
                }
            }
        }

        Ok(TrialOutcome::Completed)
    }

    pub async fn run_phase(&self, phase: Phase, vg_name: &str, lv_name: &str) -> Result<()> {
        match phase {
            Phase::Create => self.lvm.create_lv(vg_name, lv_name).await,
            Phase::TagInUse => {
                self.lvm
                    .change_lv_tags(
                        vg_name,
                        lv_name,
                        vec![in_use_tag(lv_name), parent_tag(BLANK_UUID)],
                        vec![TAG_VOL_UNINIT.to_string()],
                    )
                    .await
            }
            Phase::Activate => self.lvm.activate_lv(vg_name, lv_name).await,
            Phase::Io => self.lvm.perform_io(vg_name, lv_name).await,
            Phase::Extend => self.lvm.extend_lv(vg_name, lv_name).await,
            Phase::Deactivate => self.lvm.deactivate_lv(vg_name, lv_name).await,
            Phase::MarkRemoved => {
                self.lvm
                    .change_lv_tags(
                        vg_name,
                        lv_name,
                        vec![removed_tag(lv_name)],
                        vec![in_use_tag(lv_name)],
                    )
                    .await
            }
            Phase::Discard => self.lvm.discard_lv(vg_name, lv_name).await,
            Phase::Remove => self.lvm.remove_lv(vg_name, lv_name).await,
        }
    }
}
