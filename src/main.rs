use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use vdp_bridge::config::ConfigLoader;
use vdp_bridge::protocol::set_mode;
use vdp_bridge::{logging, BridgeError, ShutdownToken, SystemPortOpener, Timer, VdpBridge};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Pipe bytes between stdin/stdout and an AGON VDP over a serial line.",
    long_about = "Every byte read from stdin is forwarded to the VDP as if an emulated CPU had written it; every byte the VDP sends back is written to stdout. Runs until stdin closes or a termination signal arrives."
)]
struct Args {
    /// Configuration file (otherwise the standard search path is used).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device the VDP is attached to.
    #[arg(short, long)]
    device: Option<String>,

    /// Line speed.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Send the VDU init handshake right after opening the link.
    #[arg(long)]
    handshake: bool,

    /// Switch the VDP to this screen mode before piping.
    #[arg(long)]
    mode: Option<u8>,

    /// Hex-dump link traffic at debug level.
    #[arg(long)]
    dump: bool,

    /// How long to keep draining device output after stdin closes.
    #[arg(long, default_value_t = 200)]
    linger_ms: u64,

    /// Leave SIGINT/SIGTERM at their default action instead of shutting
    /// down cleanly.
    #[arg(long)]
    no_signals: bool,

    /// Write the effective configuration to this file and exit.
    #[arg(long, value_name = "PATH")]
    save_config: Option<PathBuf>,
}

fn load_config(args: &Args) -> ConfigLoader {
    let loaded = match &args.config {
        Some(path) => ConfigLoader::load_from(path),
        None => ConfigLoader::load(),
    };
    let mut loader = loaded.unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config, using defaults: {}", e);
        ConfigLoader::with_defaults()
    });

    let config = loader.config_mut();

    if let Some(device) = &args.device {
        config.link.device_path = device.clone();
    }
    if let Some(baud) = args.baud {
        config.link.baud_rate = baud;
    }
    if args.handshake {
        config.link.send_init_handshake = true;
    }
    if args.dump {
        config.logging.dump_payloads = true;
    }
    config.startup.install_signal_handlers = !args.no_signals;
    loader
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let loader = load_config(&args);
    if let Some(path) = &args.save_config {
        loader.save_to(path)?;
        println!("configuration written to {}", path.display());
        return Ok(());
    }
    let config = loader.into_config();
    logging::init(&config.logging);

    let token = ShutdownToken::new();
    let bridge = VdpBridge::from_config(&config, Box::new(SystemPortOpener), token.clone());

    // Bring the link up eagerly; a failure here is retried on the first
    // forwarded byte.
    if let Err(e) = bridge.supervisor().ensure_started() {
        warn!("VDP link not up yet: {e}");
    }
    if let Some(mode) = args.mode {
        bridge.send_command(&set_mode(mode));
    }

    let pump = tokio::task::spawn_blocking({
        let bridge = bridge.clone();
        let token = token.clone();
        move || run_pump(&bridge, &token)
    });

    let stdin_done = Arc::new(AtomicBool::new(false));
    // Plain thread: a read blocked on stdin must not hold up runtime shutdown.
    std::thread::Builder::new().name("vdp-stdin".into()).spawn({
        let bridge = bridge.clone();
        let token = token.clone();
        let stdin_done = stdin_done.clone();
        move || {
            forward_stdin(&bridge, &token);
            stdin_done.store(true, Ordering::Release);
        }
    })?;

    let linger = Duration::from_millis(args.linger_ms);
    let mut tick = tokio::time::interval(Duration::from_millis(5));
    let mut idle_since: Option<Timer> = None;
    let mut stdout = std::io::stdout();
    let mut echoed = 0u64;

    while !token.is_cancelled() {
        tick.tick().await;

        let mut out = Vec::new();
        while let Some(b) = bridge.deliver_from_device() {
            out.push(b);
        }
        // The emulator-side echo of our own writes has no reader here.
        while bridge.relay().read_inbound().is_ok() {
            echoed += 1;
        }

        if !out.is_empty() {
            stdout.write_all(&out)?;
            stdout.flush()?;
            idle_since = None;
        } else if stdin_done.load(Ordering::Acquire) {
            if idle_since.get_or_insert_with(Timer::start).age() >= linger {
                break;
            }
        }
    }

    let status = token.exit_status();
    token.cancel(0);
    match pump.await {
        Ok(Ok(total)) => info!(total, echoed, "bridge stopped"),
        Ok(Err(e)) => error!("device pump failed: {e}"),
        Err(e) => error!("device pump panicked: {e}"),
    }

    if status != 0 {
        std::process::exit(status);
    }
    Ok(())
}

/// Seconds between "still waiting" notices while the link is down.
const LINK_WAIT_NOTICE_SECS: u64 = 5;

/// Wait for the link, then pump device output until shutdown.
fn run_pump(bridge: &VdpBridge, token: &ShutdownToken) -> Result<u64, BridgeError> {
    let mut waiting = Timer::start();
    while !bridge.supervisor().is_ready() {
        if !token.sleep(Duration::from_millis(100)) {
            return Ok(0);
        }
        if waiting.elapsed(LINK_WAIT_NOTICE_SECS) {
            info!(
                device = %bridge.supervisor().link_config().device_path,
                "still waiting for the VDP link"
            );
            waiting.restart();
        }
    }
    bridge.pump_device_rx(token)
}

fn forward_stdin(bridge: &VdpBridge, token: &ShutdownToken) {
    let mut stdin = std::io::stdin().lock();
    let mut buf = [0u8; 256];
    while !token.is_cancelled() {
        match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => buf[..n].iter().for_each(|&b| bridge.forward_to_device(b)),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("stdin read failed: {e}");
                break;
            }
        }
    }
    debug!("stdin closed");
}
