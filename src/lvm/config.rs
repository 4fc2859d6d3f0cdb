use crate::core::{HarnessError, Result};
use crate::executor::{Executor, argv};

// Based on a production host configuration, adapted to use device mapper
// delay devices.
const CONFIG_TEMPLATE: &str = r#"
devices {
 preferred_names=["^/dev/mapper/"]
 ignore_suspended_devices=1
 write_cache_state=0
 disable_after_error_count=3
 filter=["a|^/dev/mapper/delay[0-9]+$|", "r|.*|"]
 {hints}
} global {
 locking_type=1
 prioritise_write_locks=1
 wait_for_locks=1
 use_lvmetad=0
} backup {
 retain_min=50
 retain_days=0
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LvmVersion {
    pub major: u32,
    pub minor: u32,
}

impl LvmVersion {
    /// 2.03 scans with hints by default; they must be disabled when the
    /// device set changes behind lvm's back.
    pub fn needs_hints_disabled(&self) -> bool {
        self.major == 2 && self.minor == 3
    }
}

/// Parses the output of `lvm version`.
///
/// The relevant line looks like `  LVM version:     2.03.09(2) (2020-03-26)`.
pub fn parse_lvm_version(output: &str) -> Result<LvmVersion> {
    let parse_error = || HarnessError::LvmVersion(output.to_string());

    let line = output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("LVM version:"))
        .ok_or_else(parse_error)?;

    let version = line["LVM version:".len()..]
        .split_whitespace()
        .next()
        .ok_or_else(parse_error)?;

    let mut parts = version.split('.');
    let major = parts.next().and_then(|p| p.parse().ok());
    let minor = parts.next().and_then(|p| p.parse().ok());
    match (major, minor, parts.next()) {
        (Some(major), Some(minor), Some(_)) => Ok(LvmVersion { major, minor }),
        _ => Err(parse_error()),
    }
}

pub async fn lvm_version(executor: &dyn Executor) -> Result<LvmVersion> {
    let out = executor.execute(&argv(["lvm", "version"]), None).await?;
    parse_lvm_version(&out)
}

/// Renders the single-line `--config` value passed to every lvm command.
pub fn lvm_config(version: LvmVersion) -> String {
    let hints = if version.needs_hints_disabled() {
        r#"hints="none""#
    } else {
        ""
    };
    CONFIG_TEMPLATE.replace("{hints}", hints).replace('\n', "")
}

pub async fn detect_lvm_config(executor: &dyn Executor) -> Result<String> {
    Ok(lvm_config(lvm_version(executor).await?))
}
