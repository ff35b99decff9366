//! # Spudpole Library
//!
//! A Rust library modelling motorized anchor spudpoles (winches that pay out
//! and recover an anchor rode). It tracks the operating state of the winch,
//! estimates deployed line length from drum geometry, and accumulates motor
//! run time.
//!
//! ## Features
//!
//! - Five-state machine driven by hardware events (docked sensor, deploy, retrieve, stop)
//! - Drum turn counter that only moves while the motor runs
//! - Deployed line length from layered drum geometry
//! - Run-time accounting through an injected timer
//! - Explicit transition legality table, permissive by default
//! - Serial relay board support for motor control
//!
//! ## Example
//!
//! ```no_run
//! use spudpole::{ClockTimer, Identity, LineGeometry, SerialRelay, Spudpole};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001")?)
//!         .control(SerialRelay::open("/dev/ttyUSB0")?)
//!         .line_measurement(LineGeometry {
//!             spool_diameter: 0.05,
//!             line_diameter: 0.008,
//!             turns_per_layer: 10,
//!             turns_when_docked: 51,
//!         })
//!         .run_time_accounting(0, ClockTimer::new())
//!         .build()?;
//!
//!     spudpole.mark_docked()?;
//!     spudpole.deploy()?;
//!     spudpole.bump_counter();
//!     spudpole.stop()?;
//!     println!("Deployed: {:.2}m", spudpole.deployed_line_length_or_sentinel());
//!     Ok(())
//! }
//! ```

pub mod collaborators;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod policy;
pub mod relay;
pub mod types;
pub mod winch;

pub use collaborators::{ClockTimer, ControlSink, RunTimer};
pub use constants::LINE_LENGTH_UNAVAILABLE;
pub use error::{Result, SpudpoleError};
pub use geometry::LineGeometry;
pub use policy::TransitionTable;
pub use relay::SerialRelay;
pub use types::*;
pub use winch::{Spudpole, SpudpoleBuilder};
