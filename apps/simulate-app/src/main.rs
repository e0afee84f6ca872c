//! Simulate command-line entry point.
//!
//! Provides three modes of operation:
//! - `connect`: Connect to a listening controller and serve its commands
//! - `serve`: Listen for controllers and serve them one at a time
//! - `info`: Print crate versions, built-in commands and the configuration

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use simulate_bridge::DEFAULT_PORT;
use simulate_bridge::prelude::*;
use simulate_core::SimulationConfig;
use simulate_rl::RlPlugin;
use simulate_sim::{HeadlessScene, JsonSceneLoader, Simulator};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Simulation bridge driven by an external controller.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// TOML file with the initial simulation configuration.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a listening controller and serve its commands.
    Connect {
        /// Controller host.
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Controller port.
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Listen for controllers and serve them one at a time.
    Serve {
        /// Address to bind (e.g. 127.0.0.1:55001).
        #[arg(short, long, default_value = "127.0.0.1:55001")]
        address: String,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig, String> {
    match path {
        Some(path) => SimulationConfig::from_file(path)
            .map_err(|e| format!("failed to load {}: {e}", path.display())),
        None => Ok(SimulationConfig::default()),
    }
}

fn context(config: SimulationConfig) -> SimContext {
    let simulator = Simulator::with_config(Box::new(HeadlessScene::new()), config)
        .with_plugin(RlPlugin::new());
    SimContext::new(simulator, Arc::new(JsonSceneLoader))
}

/// Consecutive accept failures tolerated before `serve` gives up.
const MAX_ACCEPT_FAILURES: u32 = 10;
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Linear backoff between failed accepts, reset by a successful one.
#[derive(Debug, Default)]
struct AcceptBackoff {
    failures: u32,
}

impl AcceptBackoff {
    fn succeeded(&mut self) {
        self.failures = 0;
    }

    /// Delay before the next attempt, or `None` once the limit is reached.
    fn failed(&mut self) -> Option<Duration> {
        self.failures += 1;
        (self.failures < MAX_ACCEPT_FAILURES).then(|| ACCEPT_RETRY_DELAY * self.failures)
    }
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_connect(host: String, port: u16, config: SimulationConfig) -> Result<(), String> {
    let bridge = Bridge::new(BridgeConfig {
        host,
        port,
        ..BridgeConfig::default()
    });
    let mut ctx = context(config);
    let reason = bridge
        .connect_and_run(&mut ctx)
        .map_err(|e| format!("bridge failed: {e}"))?;
    info!(?reason, "session finished");
    Ok(())
}

fn run_serve(address: &str, config: &SimulationConfig) -> Result<(), String> {
    let listener =
        TcpListener::bind(address).map_err(|e| format!("failed to bind {address}: {e}"))?;
    let local = listener
        .local_addr()
        .map_err(|e| format!("failed to get address: {e}"))?;
    let bridge = Bridge::new(BridgeConfig::default());
    println!("simulate bridge listening on {local}");

    let mut backoff = AcceptBackoff::default();
    loop {
        println!("waiting for controller...");
        let mut connection = match Connection::accept(&listener, bridge.config().max_message_size)
        {
            Ok(connection) => {
                backoff.succeeded();
                connection
            }
            Err(e) => {
                let retry = backoff.failed();
                error!(%e, failures = backoff.failures, "accept failed");
                match retry {
                    Some(delay) => {
                        thread::sleep(delay);
                        continue;
                    }
                    None => return Err(format!("accept keeps failing: {e}")),
                }
            }
        };

        // Each controller starts from a fresh simulator.
        let mut ctx = context(config.clone());
        match bridge.run(&mut connection, &mut ctx) {
            Ok(ExitReason::CloseRequested) => println!("controller closed the session"),
            Ok(ExitReason::PeerClosed) => println!("controller disconnected"),
            Err(e) => eprintln!("controller error: {e}"),
        }
    }
}

fn run_info(config: &SimulationConfig) {
    println!("simulate v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  simulate-core   {}", env!("CARGO_PKG_VERSION"));
    println!("  simulate-sim    {}", env!("CARGO_PKG_VERSION"));
    println!("  simulate-rl     {}", env!("CARGO_PKG_VERSION"));
    println!("  simulate-bridge {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("commands:");
    for name in CommandRegistry::with_builtins().names() {
        println!("  {name}");
    }
    println!();
    println!("configuration:");
    println!("  time_step     {}", config.time_step);
    println!("  frame_skip    {}", config.frame_skip);
    println!("  return_nodes  {}", config.return_nodes);
    println!("  return_frames {}", config.return_frames);
    println!("  gravity       {:?}", config.gravity);
    println!();
    println!("default port: {DEFAULT_PORT}");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Some(Commands::Connect { host, port }) => run_connect(host, port, config),
        Some(Commands::Serve { address }) => run_serve(&address, &config),
        Some(Commands::Info) => {
            run_info(&config);
            Ok(())
        }
        None => run_connect("localhost".into(), DEFAULT_PORT, config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
