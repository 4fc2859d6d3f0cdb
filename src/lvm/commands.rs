use super::naming::{lv_device, lv_path};
use crate::core::Result;
use crate::executor::Executor;
use std::sync::Arc;
use tracing::info;

/// Tag marking an lv whose content is not initialized yet.
pub const TAG_VOL_UNINIT: &str = "OVIRT_VOL_INITIALIZING";
pub const BLANK_UUID: &str = "00000000-0000-0000-0000-000000000000";
pub const REMOVED_IMAGE_PREFIX: &str = "_remove_me_";

pub fn in_use_tag(lv_name: &str) -> String {
    format!("IU_{}", lv_name)
}

pub fn parent_tag(parent: &str) -> String {
    format!("PU_{}", parent)
}

pub fn removed_tag(lv_name: &str) -> String {
    format!("IU_{}{}", REMOVED_IMAGE_PREFIX, lv_name)
}

/// Requested change for a single `lvchange` invocation.
#[derive(Debug, Default, Clone)]
pub struct LvChange {
    pub activate: Option<bool>,
    pub add_tags: Vec<String>,
    pub del_tags: Vec<String>,
}

/// Typed wrappers around the lvm and block device tools.
///
/// Every lvm command carries the harness `--config`, so concurrent commands
/// only ever see the delay devices.
#[derive(Clone)]
pub struct LvmCommands {
    executor: Arc<dyn Executor>,
    config: String,
}

impl LvmCommands {
    pub fn new(executor: Arc<dyn Executor>, config: impl Into<String>) -> Self {
        Self {
            executor,
            config: config.into(),
        }
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    fn lvm_command(&self, program: &str) -> Vec<String> {
        vec![
            program.to_string(),
            "--config".to_string(),
            self.config.clone(),
        ]
    }

    async fn run(&self, cmd: Vec<String>) -> Result<String> {
        self.executor.execute(&cmd, None).await
    }

    pub async fn create_lv(&self, vg_name: &str, lv_name: &str) -> Result<()> {
        info!("Creating lv {}", lv_path(vg_name, lv_name));

        let mut cmd = self.lvm_command("lvcreate");
        cmd.extend(
            [
                "--autobackup",
                "n",
                "--contiguous",
                "n",
                "--size",
                "1g",
                "--addtag",
                TAG_VOL_UNINIT,
                "--activate",
                "y",
                "--name",
                lv_name,
                vg_name,
            ]
            .map(String::from),
        );
        self.run(cmd).await?;
        Ok(())
    }

    pub async fn change_lv(&self, vg_name: &str, lv_name: &str, change: &LvChange) -> Result<()> {
        let mut cmd = self.lvm_command("lvchange");
        cmd.extend(["--autobackup", "n"].map(String::from));

        for tag in &change.add_tags {
            cmd.extend(["--addtag".to_string(), tag.clone()]);
        }
        for tag in &change.del_tags {
            cmd.extend(["--deltag".to_string(), tag.clone()]);
        }
        if let Some(activate) = change.activate {
            let value = if activate { "y" } else { "n" };
            cmd.extend(["--activate".to_string(), value.to_string()]);
        }
        cmd.push(lv_path(vg_name, lv_name));

        self.run(cmd).await?;
        Ok(())
    }

    pub async fn activate_lv(&self, vg_name: &str, lv_name: &str) -> Result<()> {
        info!("Activating lv {}", lv_path(vg_name, lv_name));
        let change = LvChange {
            activate: Some(true),
            ..Default::default()
        };
        self.change_lv(vg_name, lv_name, &change).await
    }

    pub async fn deactivate_lv(&self, vg_name: &str, lv_name: &str) -> Result<()> {
        info!("Deactivating lv {}", lv_path(vg_name, lv_name));
        let change = LvChange {
            activate: Some(false),
            ..Default::default()
        };
        self.change_lv(vg_name, lv_name, &change).await
    }

    /// Adds and removes tags in one atomic `lvchange`.
    pub async fn change_lv_tags(
        &self,
        vg_name: &str,
        lv_name: &str,
        add: Vec<String>,
        del: Vec<String>,
    ) -> Result<()> {
        info!("Changing lv tags {}", lv_path(vg_name, lv_name));
        let change = LvChange {
            activate: None,
            add_tags: add,
            del_tags: del,
        };
        self.change_lv(vg_name, lv_name, &change).await
    }

    pub async fn extend_lv(&self, vg_name: &str, lv_name: &str) -> Result<()> {
        info!("Extending lv {}", lv_path(vg_name, lv_name));

        let mut cmd = self.lvm_command("lvextend");
        cmd.extend(["--autobackup", "n", "--size", "+1g"].map(String::from));
        cmd.push(lv_path(vg_name, lv_name));
        self.run(cmd).await?;
        Ok(())
    }

    pub async fn remove_lv(&self, vg_name: &str, lv_name: &str) -> Result<()> {
        info!("Removing lv {}", lv_path(vg_name, lv_name));

        let mut cmd = self.lvm_command("lvremove");
        cmd.extend(["--autobackup", "n", "--force"].map(String::from));
        cmd.push(lv_path(vg_name, lv_name));
        self.run(cmd).await?;
        Ok(())
    }

    pub async fn discard_lv(&self, vg_name: &str, lv_name: &str) -> Result<()> {
        let device = lv_device(vg_name, lv_name);
        info!("Discarding lv {}", device);

        let cmd = vec![
            "blkdiscard".to_string(),
            "--step".to_string(),
            "32m".to_string(),
            device,
        ];
        self.run(cmd).await?;
        Ok(())
    }

    /// Writes then reads back 2 MiB with direct I/O.
    pub async fn perform_io(&self, vg_name: &str, lv_name: &str) -> Result<()> {
        let device = lv_device(vg_name, lv_name);
        info!("Doing some I/O with {}", device);

        let write = vec![
            "dd".to_string(),
            "if=/dev/zero".to_string(),
            format!("of={}", device),
            "bs=64k".to_string(),
            "count=32".to_string(),
            "oflag=direct".to_string(),
        ];
        self.run(write).await?;

        let read = vec![
            "dd".to_string(),
            format!("if={}", device),
            "of=/dev/null".to_string(),
            "bs=64k".to_string(),
            "count=32".to_string(),
            "iflag=direct".to_string(),
        ];
        self.run(read).await?;
        Ok(())
    }

    /// Runs a report command (`pvs`, `vgs`, `lvs`) filtered by `selection`.
    pub async fn report(&self, program: &str, selection: &str) -> Result<String> {
        let mut cmd = self.lvm_command(program);
        cmd.extend(["--noheadings", "--select", selection].map(String::from));
        self.run(cmd).await
    }

    /// Names of vgs matching the `--select` expression.
    pub async fn list_vgs(&self, selection: &str) -> Result<Vec<String>> {
        let mut cmd = self.lvm_command("vgs");
        cmd.extend(["--noheadings", "-o", "vg_name", "--select", selection].map(String::from));
        let out = self.run(cmd).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    pub async fn deactivate_vg(&self, vg_name: &str) -> Result<()> {
        let mut cmd = self.lvm_command("vgchange");
        cmd.extend(["--activate", "n", vg_name].map(String::from));
        self.run(cmd).await?;
        Ok(())
    }

    pub async fn create_pv(&self, pv_name: &str) -> Result<()> {
        let mut cmd = self.lvm_command("pvcreate");
        cmd.extend(["--metadatasize", "128m", "--metadatacopies", "2", pv_name].map(String::from));
        self.run(cmd).await?;
        Ok(())
    }

    pub async fn create_vg(&self, vg_name: &str, pv_name: &str) -> Result<()> {
        let mut cmd = self.lvm_command("vgcreate");
        cmd.extend(["--physicalextentsize", "128m", vg_name, pv_name].map(String::from));
        self.run(cmd).await?;
        Ok(())
    }
}
