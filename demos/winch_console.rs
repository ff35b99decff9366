//! Winch Console Example
//!
//! This example drives a spudpole through a serial relay board:
//! - Interactive serial port selection (or command-line argument)
//! - Hardware events entered from a menu
//! - Deployed line length and motor run time after every event
//!
//! Usage:
//!   cargo run --example winch_console                  # Interactive mode
//!   cargo run --example winch_console -- /dev/ttyUSB0  # Specify port
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example winch_console

use inquire::Select;
use log::{error, info};
use spudpole::{ClockTimer, Identity, LineGeometry, MotorRating, Result, SerialRelay, Spudpole};

const COMMANDS: [&str; 7] = [
    "Mark docked",
    "Deploy",
    "Retrieve",
    "Stop",
    "Drum turn",
    "Status",
    "Quit",
];

/// Interactive serial port selection using inquire
fn select_port() -> Result<String> {
    let ports = SerialRelay::list_ports()?;

    if ports.is_empty() {
        eprintln!("No serial ports found!");
        std::process::exit(1);
    }

    let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

    let selection = Select::new("Select the relay serial port:", port_names)
        .prompt()
        .map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Selection cancelled: {}", e),
            )
        })?;

    Ok(selection)
}

fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port_name = std::env::args()
        .nth(1)
        .map(Ok)
        .unwrap_or_else(select_port)?;

    info!("Opening relay on {}...", port_name);
    let mut relay = SerialRelay::open(&port_name)?;
    relay.set_debug_print(true);

    let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "DEMO-0001")?)
        .control(relay)
        .line_measurement(LineGeometry {
            spool_diameter: 0.05,
            line_diameter: 0.008,
            turns_per_layer: 10,
            turns_when_docked: 51,
        })
        .motor_rating(MotorRating {
            nominal_voltage: 24.0,
            rated_current: 80.0,
        })
        .run_time_accounting(0, ClockTimer::new())
        .build()?;

    loop {
        let command = match Select::new("Event:", COMMANDS.to_vec()).prompt() {
            Ok(command) => command,
            Err(_) => break,
        };

        let outcome = match command {
            "Mark docked" => spudpole.mark_docked(),
            "Deploy" => spudpole.deploy(),
            "Retrieve" => spudpole.retrieve(),
            "Stop" => spudpole.stop(),
            "Drum turn" => {
                spudpole.bump_counter();
                Ok(())
            }
            "Status" => Ok(()),
            _ => break,
        };

        if let Err(e) = outcome {
            error!("{}", e);
        }

        let status = spudpole.status();
        match status.deployed_line_length {
            Some(length) => info!(
                "{:?}: {} turns, {:.2}m deployed, motor {}",
                status.state, status.counter, length, status.motor_run_time_hms
            ),
            None => info!(
                "{:?}: {} turns, length unknown, motor {}",
                status.state, status.counter, status.motor_run_time_hms
            ),
        }
    }

    if let Err(e) = spudpole.stop() {
        error!("Failed to stop motor on exit: {}", e);
    }
    info!("=== Winch Console Complete ===");
    Ok(())
}
