use crate::core::{HarnessError, Result};
use crate::lvm::naming::MAX_INDEX;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Harness configuration
///
/// Built once at startup and shared read-only by every task.
#[derive(Debug, Clone, Serialize)]
pub struct HarnessConfig {
    /// Number of volume groups, one worker per vg
    pub vg_count: usize,

    /// Number of logical volumes each worker cycles through per trial
    pub lv_count: usize,

    /// Size of each backing file / pv in bytes
    pub pv_size: u64,

    /// Artificial I/O delay of the delay devices
    pub delay_msec: u64,

    /// Trials per worker
    pub trials: usize,

    /// Enable debug logs
    pub debug: bool,

    /// Pause after starting each worker, desynchronizing their phases
    pub stagger: Duration,

    /// Upper bound of a single wait on a task while joining
    pub poll_interval: Duration,

    /// Seed for the reloaders' target selection (random when unset)
    pub seed: Option<u64>,

    /// Directory holding backing files and device links
    pub work_dir: PathBuf,
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self {
            vg_count: 10,
            lv_count: 500,
            pv_size: 2048 * GIB,
            delay_msec: 10,
            trials: 1,
            debug: false,
            stagger: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            seed: None,
            work_dir: PathBuf::from("."),
        }
    }

    pub fn vg_count(mut self, count: usize) -> Self {
        self.vg_count = count;
        self
    }

    pub fn lv_count(mut self, count: usize) -> Self {
        self.lv_count = count;
        self
    }

    pub fn pv_size(mut self, bytes: u64) -> Self {
        self.pv_size = bytes;
        self
    }

    pub fn delay_msec(mut self, msec: u64) -> Self {
        self.delay_msec = msec;
        self
    }

    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Validate configuration
    ///
    /// Names embed the vg and lv index in a 4 digit field, so both counts
    /// must stay within it for names to be unique.
    pub fn validate(&self) -> Result<()> {
        if self.vg_count == 0 || self.vg_count > MAX_INDEX {
            return Err(HarnessError::InvalidConfig(format!(
                "vg_count must be in 1..={}, got {}",
                MAX_INDEX, self.vg_count
            )));
        }

        if self.lv_count == 0 || self.lv_count > MAX_INDEX {
            return Err(HarnessError::InvalidConfig(format!(
                "lv_count must be in 1..={}, got {}",
                MAX_INDEX, self.lv_count
            )));
        }

        if self.pv_size == 0 {
            return Err(HarnessError::InvalidConfig("pv_size must be > 0".to_string()));
        }

        if self.poll_interval.is_zero() {
            return Err(HarnessError::InvalidConfig(
                "poll_interval must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.vg_count, 10);
        assert_eq!(config.lv_count, 500);
        assert_eq!(config.pv_size, 2048 * GIB);
        assert_eq!(config.delay_msec, 10);
        assert_eq!(config.trials, 1);
        assert!(!config.debug);
        assert_eq!(config.stagger, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = HarnessConfig::new()
            .vg_count(2)
            .lv_count(3)
            .trials(4)
            .stagger(Duration::from_millis(5))
            .seed(42)
            .work_dir("/tmp/stress");

        assert_eq!(config.vg_count, 2);
        assert_eq!(config.lv_count, 3);
        assert_eq!(config.trials, 4);
        assert_eq!(config.stagger, Duration::from_millis(5));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.work_dir, PathBuf::from("/tmp/stress"));
    }

    #[test]
    fn test_validate() {
        assert!(HarnessConfig::new().vg_count(0).validate().is_err());
        assert!(HarnessConfig::new().lv_count(0).validate().is_err());
        assert!(HarnessConfig::new().lv_count(MAX_INDEX + 1).validate().is_err());
        assert!(HarnessConfig::new().vg_count(MAX_INDEX).validate().is_ok());
        assert!(HarnessConfig::new().pv_size(0).validate().is_err());
        assert!(
            HarnessConfig::new()
                .poll_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(HarnessConfig::new().vg_count(3)).unwrap();
        assert_eq!(json["vg_count"], 3);
        assert_eq!(json["seed"], serde_json::Value::Null);
    }
}
