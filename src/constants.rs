//! Constants for spudpole modelling and relay communication.
//!
//! This module defines the identifier bound, the line-length sentinel used by
//! network adapters, and the framing and serial port settings of the motor
//! relay board.

/// Maximum length in bytes of manufacturer, model and serial identifiers
pub const MAX_IDENTIFIER_LEN: usize = 32;

/// Deployed line length reported when no measurement is available
pub const LINE_LENGTH_UNAVAILABLE: f64 = -1.0;

/// Start-of-frame byte for relay commands
pub const RELAY_SYNC_BYTE: u8 = 0xA5;

/// Relay action code: stop motor
pub const RELAY_STOP: u8 = 0;

/// Relay action code: run motor in the deploy direction
pub const RELAY_DEPLOY: u8 = 1;

/// Relay action code: run motor in the retrieve direction
pub const RELAY_RETRIEVE: u8 = 2;

/// Baud rate (9600 bps)
pub const BAUD_RATE: u32 = 9600;

/// Write timeout in milliseconds
pub const TIMEOUT_MS: u64 = 1000;

/// Stop bits configuration
pub const STOP_BITS: serialport::StopBits = serialport::StopBits::One;
