//! TouchTune - touch wheel sensitivity tuner
//!
//! # Usage
//!
//! ```bash
//! # Interactive tuning session
//! touchtune --port /dev/ttyUSB0
//!
//! # One-shot actions
//! touchtune -p /dev/ttyUSB0 --level 4
//! touchtune -p /dev/ttyUSB0 --status
//! touchtune -p /dev/ttyUSB0 --auto-tune
//! touchtune -p /dev/ttyUSB0 --save touch_config.json
//!
//! # No hardware
//! touchtune --demo
//! touchtune --list-ports
//! ```

mod console;
mod render;
mod shell;

use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use touchtune_core::demo::SimulatedController;
use touchtune_core::protocol::{
    list_ports, Connection, ConnectionConfig, TimingConfig, Transport, DEFAULT_BAUD_RATE,
};

use console::Console;

/// Izod Mini touch sensitivity tuner
#[derive(Parser, Debug)]
#[command(name = "touchtune")]
#[command(version, about = "Izod Mini Touch Sensitivity Tuner", long_about = None)]
struct Cli {
    /// Serial port (e.g. /dev/ttyUSB0, COM3)
    #[arg(short, long, required_unless_present_any = ["list_ports", "demo"])]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Set sensitivity level and exit
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
    level: Option<u8>,

    /// Show status and exit
    #[arg(short, long)]
    status: bool,

    /// Run auto-tune and exit
    #[arg(short, long)]
    auto_tune: bool,

    /// Save configuration to file
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Talk to a simulated controller instead of a serial port
    #[arg(long)]
    demo: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// What to do once connected
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    SetLevel(u8),
    Status,
    AutoTune,
    Save(PathBuf),
    Shell,
}

impl Cli {
    /// First requested one-shot action, or the interactive shell
    fn action(&self) -> Action {
        if let Some(level) = self.level {
            Action::SetLevel(level)
        } else if self.status {
            Action::Status
        } else if self.auto_tune {
            Action::AutoTune
        } else if let Some(path) = &self.save {
            Action::Save(path.clone())
        } else {
            Action::Shell
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_ports() {
    let ports = list_ports();
    if ports.is_empty() {
        println!("No serial ports found");
        return;
    }
    for port in ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{}  [{:04x}:{:04x}] {}",
                port.name,
                vid,
                pid,
                port.product.unwrap_or_default()
            ),
            _ => println!("{}", port.name),
        }
    }
}

/// Run `action` and close the session whatever the outcome
fn drive<T, R, W>(
    mut conn: Connection<T>,
    action: Action,
    console: &mut Console<R, W>,
) -> Result<()>
where
    T: Transport,
    R: BufRead,
    W: Write,
{
    debug!("running {:?}", action);
    let result = match action {
        Action::SetLevel(level) => console.set_level(&mut conn, level),
        Action::Status => console.show_status(&mut conn),
        Action::AutoTune => console.auto_tune(&mut conn),
        Action::Save(path) => console.save(&mut conn, &path),
        Action::Shell => console.run_shell(&mut conn),
    };
    conn.close();
    console.say("✓ Disconnected")?;
    result
}

fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_ports {
        print_ports();
        return Ok(ExitCode::SUCCESS);
    }

    let action = cli.action();
    let mut console = Console::new(io::stdin().lock(), io::stdout());

    if cli.demo {
        info!("demo mode: using simulated controller");
        let sim = SimulatedController::new();
        let conn = Connection::with_transport(sim, TimingConfig::immediate());
        console.say("✓ Connected to simulated Izod Mini")?;
        drive(conn, action, &mut console)?;
        return Ok(ExitCode::SUCCESS);
    }

    let port = cli.port.unwrap_or_default();
    let config = ConnectionConfig::new(port.as_str()).with_baud_rate(cli.baud);
    let conn = match Connection::open(config) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("✗ Failed to connect: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    console.say(format!("✓ Connected to Izod Mini on {}", port))?;
    drive(conn, action, &mut console)?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
