//! SerialTune console
//!
//! Serves a demo variable set over a serial port or stdin/stdout, the way a
//! firmware build would over its UART.

mod demo;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serialtune_core::transport::{list_ports, open_port, LineLink, DEFAULT_BAUD_RATE};
use serialtune_core::convert::{DefaultReader, DefaultWriter};
use serialtune_core::registry::DEFAULT_MAX_ITEMS;
use serialtune_core::{Interpreter, TuneProfile, UpdateHook};
use tracing_subscriber::EnvFilter;

use demo::DemoVariables;

/// Delay between serial polls
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Parser)]
#[command(name = "serialtune")]
#[command(version)]
#[command(about = "Inspect and modify variables over a line protocol", long_about = None)]
struct Cli {
    /// Serial port to serve (reads stdin when omitted)
    #[arg(long)]
    port: Option<String>,

    /// Baud rate for the serial port
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// JSON tuning profile
    #[arg(long)]
    profile: Option<PathBuf>,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Include ports of unknown kind when listing
    #[arg(long, requires = "list_ports")]
    all: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_ports {
        for port in list_ports(cli.all).context("Failed to enumerate serial ports")? {
            println!("{port}");
        }
        return Ok(());
    }

    let profile = match &cli.profile {
        Some(path) => TuneProfile::from_file(path)
            .with_context(|| format!("Failed to load profile {}", path.display()))?,
        None => TuneProfile::default(),
    };

    let vars = DemoVariables::default();
    let mut tuner: Interpreter = Interpreter::with_profile(profile);
    vars.register(&mut tuner)
        .context("Failed to register demo variables")?;
    let mut tuner = tuner.on_update(|label, slot| {
        tracing::info!("{label} ({}) updated", slot.primitive_type());
    });

    match &cli.port {
        Some(name) => serve_serial(&mut tuner, &vars, name, cli.baud),
        None => serve_stdin(&mut tuner, &vars),
    }
}

fn serve_serial<'a, H: UpdateHook<'a>>(
    tuner: &mut Interpreter<'a, DEFAULT_MAX_ITEMS, DefaultReader, DefaultWriter, H>,
    vars: &DemoVariables,
    name: &str,
    baud: u32,
) -> Result<()> {
    let port = open_port(name, Some(baud)).with_context(|| format!("Failed to open {name}"))?;
    let writer = port
        .try_clone()
        .with_context(|| format!("Failed to clone handle for {name}"))?;
    let mut link: LineLink<_, _> = LineLink::new(port, writer);

    tracing::info!("Serving {} variables on {name} at {baud} baud", tuner.registry().len());
    loop {
        let handled = link.poll(tuner).context("Serial link failed")?;
        if handled > 0 {
            tracing::info!("{}", vars.status());
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn serve_stdin<'a, H: UpdateHook<'a>>(
    tuner: &mut Interpreter<'a, DEFAULT_MAX_ITEMS, DefaultReader, DefaultWriter, H>,
    vars: &DemoVariables,
) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    tracing::info!(
        "Reading commands from stdin; variables: {}",
        tuner.registry().labels().collect::<Vec<_>>().join(", ")
    );
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let mut out = String::new();
        tuner.process(&line, &mut out);
        stdout.write_all(out.as_bytes())?;
        stdout.flush()?;
        tracing::debug!("{}", vars.status());
    }
    Ok(())
}
