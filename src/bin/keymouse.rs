// Keymouse CLI
// Grabs keyboards and drives the pointer from the keyboard

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use clap::Parser;

use keymouse_core::input::{EvdevInput, GrabSet};
use keymouse_core::output::UinputSink;
use keymouse_core::{
    config::default_config_content, Config, EventRouter, ExitReason, MotionIntegrator,
    SharedMotion, SharedSink,
};

/// Keyboard-driven mouse emulator
#[derive(Parser, Debug)]
#[command(name = "keymouse")]
#[command(version)]
#[command(about = "Drive the mouse pointer from the keyboard", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Devices to grab, by name or path (can be used multiple times)
    #[arg(short, long, value_name = "DEVICE")]
    devices: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// List available input devices
    #[arg(long)]
    list_devices: bool,

    /// Print the built-in configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn list_devices() {
    let devices = EvdevInput::list_devices();
    println!("Found {} input device(s):", devices.len());
    for device in &devices {
        let marker = if device.is_keyboard { " [keyboard]" } else { "" };
        println!("  {}: {} ({}){}", device.index, device.name, device.path, marker);
    }
}

fn install_signal_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("installing signal handler")?;
    thread::Builder::new()
        .name("keymouse-signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                log::info!("Received signal {}, shutting down", signal);
                running.store(false, Ordering::SeqCst);
            }
        })
        .context("spawning signal thread")?;
    Ok(())
}

/// Outcome of a full run, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Clean(ExitReason),
    IntegratorFailed,
}

impl Outcome {
    fn exit_status(self) -> u8 {
        match self {
            Outcome::Clean(_) => 0,
            Outcome::IntegratorFailed => 1,
        }
    }
}

fn run(config: Config) -> anyhow::Result<Outcome> {
    let engine = &config.engine;
    let running = Arc::new(AtomicBool::new(true));
    install_signal_handler(running.clone())?;

    let grabs = GrabSet::new();
    let sink = SharedSink::new(UinputSink::new(grabs.clone()).context("creating virtual device")?);
    let input = EvdevInput::open(&config.device_filter, grabs, sink.clone(), running.clone())
        .context("opening keyboards")?;
    log::info!("Grabbed {} keyboard(s)", input.device_count());

    let motion = SharedMotion::new(engine.default_speed);
    let failed = Arc::new(AtomicBool::new(false));

    let mut integrator =
        MotionIntegrator::new(motion.clone(), sink.clone(), engine.tick_rate, running.clone());
    let integrator_running = running.clone();
    let integrator_failed = failed.clone();
    let integrator_thread = thread::Builder::new()
        .name("keymouse-motion".to_string())
        .spawn(move || {
            if let Err(e) = integrator.run() {
                log::error!("Motion integrator failed: {}", e);
                integrator_failed.store(true, Ordering::SeqCst);
                integrator_running.store(false, Ordering::SeqCst);
            }
        })
        .context("spawning motion integrator")?;

    let mut router = EventRouter::new(input, sink, engine, motion);
    let result = router.run();

    running.store(false, Ordering::SeqCst);
    if integrator_thread.join().is_err() {
        log::error!("Motion integrator panicked");
        failed.store(true, Ordering::SeqCst);
    }

    let reason = result.context("event router failed")?;
    if failed.load(Ordering::SeqCst) {
        return Ok(Outcome::IntegratorFailed);
    }
    log::info!("Exiting ({:?})", reason);
    Ok(Outcome::Clean(reason))
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    if !args.devices.is_empty() {
        config.device_filter = args.devices.clone();
    }
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_content());
        return ExitCode::SUCCESS;
    }

    init_logging(args.verbose);

    if args.list_devices {
        list_devices();
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.check_config {
        match &config.source_path {
            Some(path) => println!("Configuration is valid: {}", path.display()),
            None => println!("Built-in configuration is valid"),
        }
        println!("  {} binding(s)", config.engine.bindings.len());
        return ExitCode::SUCCESS;
    }

    match run(config) {
        Ok(outcome) => ExitCode::from(outcome.exit_status()),
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
