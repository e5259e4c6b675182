//! Main entry point for the temperature manager

use anyhow::Context;
use clap::Parser;
use log::info;
use temp_manager::{
    args::{Args, Commands},
    config::DaemonConfig,
    daemon, logging, LinuxProbe, ThermalPolicy,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::setup(args.verbose, args.log_file.as_deref()).context("failed to set up logging")?;

    let config = DaemonConfig::load_or_default(&args.config)?;

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(config).await,
        Commands::Status { json } => print_status(config, json).await,
        Commands::Config { write: false } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Config { write: true } => {
            config
                .save_to_file(&args.config)
                .with_context(|| format!("failed to write {}", args.config.display()))?;
            info!("Wrote configuration to {}", args.config.display());
            Ok(())
        }
    }
}

/// One probe pass without any hardware
async fn print_status(config: DaemonConfig, json: bool) -> anyhow::Result<()> {
    let probe = LinuxProbe::new(config.probe.clone());
    let policy = ThermalPolicy::new(config.policy.hysteresis_celsius);
    let report = daemon::sample(&probe, &policy, None).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for text in report.frame().texts() {
            let text = text.trim_end();
            if !text.is_empty() {
                println!("{}", text);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "rpi")]
async fn run_daemon(config: DaemonConfig) -> anyhow::Result<()> {
    use temp_manager::daemon::{ControlLoop, LoopTiming};
    use temp_manager::display::BootSplash;
    use temp_manager::hardware;

    info!("temp-manager v{}", env!("CARGO_PKG_VERSION"));

    // Assets and hardware must all be present before the loop starts
    let splash = BootSplash::load(&config.display.logo_path())?;
    let display = hardware::open_display(&config, splash)?;
    let fan = hardware::open_fan(&config.fan)?;

    let mut control = ControlLoop::new(
        LinuxProbe::new(config.probe.clone()),
        fan,
        display,
        ThermalPolicy::new(config.policy.hysteresis_celsius),
        LoopTiming::from(&config),
    );
    control.run(shutdown_signal()).await;

    info!("temp-manager stopped");
    Ok(())
}

#[cfg(not(feature = "rpi"))]
async fn run_daemon(_config: DaemonConfig) -> anyhow::Result<()> {
    info!("temp-manager v{}", env!("CARGO_PKG_VERSION"));
    anyhow::bail!("built without the `rpi` feature; only `status` and `config` are available")
}

/// Resolves on Ctrl-C or SIGTERM
#[cfg(feature = "rpi")]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("Cannot listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
        _ = terminate.recv() => info!("Received SIGTERM"),
    }
}
