use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use lvm_reload_stress::config::GIB;
use lvm_reload_stress::lvm::detect_lvm_config;
use lvm_reload_stress::{
    CancellationSignal, CommandExecutor, Coordinator, Executor, HarnessConfig, LvmCommands,
    install_signal_handlers, provision,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lvm-reload-stress")]
#[command(about = "Reproduce LVM metadata reload errors under concurrent lv changes")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Number of trials
    #[arg(long, global = true, default_value_t = 1)]
    trials: usize,

    /// Number of vgs
    #[arg(long, global = true, default_value_t = 10)]
    vg_count: usize,

    /// Number of lvs per vg
    #[arg(long, global = true, default_value_t = 500)]
    lv_count: usize,

    /// Size of pv in GiB
    #[arg(long, global = true, default_value_t = 2048)]
    pv_size: u64,

    /// Number of milliseconds to delay I/O
    #[arg(long, global = true, default_value_t = 10)]
    delay_msec: u64,

    /// Seed for the reloaders' target selection
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Directory for backing files and device links
    #[arg(long, global = true, default_value = ".")]
    work_dir: PathBuf,

    /// Show debug logs
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Create backing files, loop and delay devices, pvs and vgs
    Setup,
    /// Remove everything setup created
    Teardown,
    /// Run the workers and reloaders
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = build_config(&cli)?;
    let executor: Arc<dyn Executor> = Arc::new(CommandExecutor::new());

    match cli.command {
        Command::Setup => cmd_setup(config, executor).await,
        Command::Teardown => cmd_teardown(config, executor).await,
        Command::Run => cmd_run(config, executor).await,
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_thread_names(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Result<HarnessConfig> {
    let pv_size = cli
        .pv_size
        .checked_mul(GIB)
        .ok_or_else(|| anyhow!("--pv-size {} GiB is too large", cli.pv_size))?;

    let mut config = HarnessConfig::new()
        .trials(cli.trials)
        .vg_count(cli.vg_count)
        .lv_count(cli.lv_count)
        .pv_size(pv_size)
        .delay_msec(cli.delay_msec)
        .work_dir(cli.work_dir.clone())
        .debug(cli.debug);
    if let Some(seed) = cli.seed {
        config = config.seed(seed);
    }

    config.validate()?;
    Ok(config)
}

async fn lvm_commands(executor: Arc<dyn Executor>) -> Result<LvmCommands> {
    let lvm_config = detect_lvm_config(executor.as_ref())
        .await
        .context("detect lvm version")?;
    Ok(LvmCommands::new(executor, lvm_config))
}

async fn cmd_setup(config: HarnessConfig, executor: Arc<dyn Executor>) -> Result<()> {
    info!("Setting up storage config={}", serde_json::to_string(&config)?);
    let lvm = lvm_commands(executor).await?;
    provision::setup(&config, &lvm)
        .await
        .context("setup storage")
}

async fn cmd_teardown(config: HarnessConfig, executor: Arc<dyn Executor>) -> Result<()> {
    info!("Tearing down storage config={}", serde_json::to_string(&config)?);
    let lvm = lvm_commands(executor).await?;
    provision::teardown(&config, &lvm)
        .await
        .context("tear down storage")
}

async fn cmd_run(config: HarnessConfig, executor: Arc<dyn Executor>) -> Result<()> {
    info!("Running trials config={}", serde_json::to_string(&config)?);

    let cancel = CancellationSignal::new();
    let signals = install_signal_handlers(cancel.clone()).context("register signal handlers")?;

    let lvm = lvm_commands(executor).await?;
    let coordinator = Coordinator::new(config, lvm, cancel)?;
    let summary = coordinator.run().await;
    signals.abort();

    info!(
        "Run finished: {} workers, {} failed",
        summary.workers.len(),
        summary.failed_workers()
    );
    Ok(())
}
