//! Creating and removing the backing storage.
//!
//! Each vg sits on a delay device stacked on a loop device backed by a sparse
//! file. Links in the work directory remember what was created so teardown
//! can find it again.

use crate::config::HarnessConfig;
use crate::core::{HarnessError, Result};
use crate::executor::argv;
use crate::lvm::LvmCommands;
use crate::lvm::naming::{VG_PREFIX, delay_name, link_name, pv_name, vg_name};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

pub async fn setup(config: &HarnessConfig, lvm: &LvmCommands) -> Result<()> {
    config.validate()?;
    info!("Setting up storage in {}", config.work_dir.display());
    let executor = lvm.executor();

    for i in 0..config.vg_count {
        let backing_file = config.work_dir.join(link_name("backing", i));
        info!("Creating backing file {}", backing_file.display());
        let file = fs::File::create(&backing_file).await?;
        file.set_len(config.pv_size).await?;
        drop(file);

        let backing_path = backing_file.to_string_lossy().into_owned();
        let loop_device = executor
            .execute(
                &argv(["losetup", "--find", "--show", backing_path.as_str()]),
                None,
            )
            .await?;
        info!("Created loop device {}", loop_device);

        let loop_link = config.work_dir.join(link_name("loop", i));
        info!("Creating symlink {} -> {}", loop_link.display(), loop_device);
        fs::symlink(&loop_device, &loop_link).await?;

        let delay = delay_name(i);
        info!("Creating delay device {}", delay);
        let out = executor
            .execute(&argv(["blockdev", "--getsize", loop_device.as_str()]), None)
            .await?;
        let sectors: u64 = out.parse().map_err(|_| HarnessError::UnexpectedOutput {
            program: "blockdev".to_string(),
            output: out.clone(),
        })?;
        let table = format!(
            "0 {} delay {} 0 {}",
            sectors, loop_device, config.delay_msec
        );
        executor
            .execute(&argv(["dmsetup", "create", delay.as_str()]), Some(table.as_bytes()))
            .await?;

        let pv = pv_name(i);
        let delay_link = config.work_dir.join(link_name("delay", i));
        info!("Creating symlink {} -> {}", delay_link.display(), pv);
        fs::symlink(&pv, &delay_link).await?;

        info!("Creating pv {}", pv);
        lvm.create_pv(&pv).await?;

        let vg = vg_name(i);
        info!("Creating vg {} on pv {}", vg, pv);
        lvm.create_vg(&vg, &pv).await?;
    }

    Ok(())
}

pub async fn teardown(config: &HarnessConfig, lvm: &LvmCommands) -> Result<()> {
    info!("Tearing down storage in {}", config.work_dir.display());
    let executor = lvm.executor();

    let selection = format!("vg_name =~ ^{}-[0-9]+", VG_PREFIX);
    for vg in lvm.list_vgs(&selection).await? {
        info!("Deactivating lvs in vg {}", vg);
        lvm.deactivate_vg(&vg).await?;
    }

    for delay_link in entries_with_prefix(&config.work_dir, "delay_").await? {
        let delay_device = fs::read_link(&delay_link).await?;

        if fs::try_exists(&delay_device).await? {
            let device = delay_device.to_string_lossy().into_owned();
            info!("Wiping delay device {}", device);
            executor
                .execute(&argv(["wipefs", "--all", device.as_str()]), None)
                .await?;

            let name = delay_device
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or(device);
            info!("Removing delay device {}", name);
            executor
                .execute(&argv(["dmsetup", "remove", "--force", name.as_str()]), None)
                .await?;
        }

        fs::remove_file(&delay_link).await?;
    }

    for loop_link in entries_with_prefix(&config.work_dir, "loop_").await? {
        let loop_device = fs::read_link(&loop_link).await?;
        let device = loop_device.to_string_lossy().into_owned();

        info!("Removing loop device {}", device);
        executor
            .execute(&argv(["losetup", "--detach", device.as_str()]), None)
            .await?;

        fs::remove_file(&loop_link).await?;
    }

    for backing_file in entries_with_prefix(&config.work_dir, "backing_").await? {
        info!("Removing backing file {}", backing_file.display());
        fs::remove_file(&backing_file).await?;
    }

    Ok(())
}

/// Directory entries whose name starts with `prefix`, sorted by name.
async fn entries_with_prefix(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            entries.push(entry.path());
        }
    }

    entries.sort();
    Ok(entries)
}
