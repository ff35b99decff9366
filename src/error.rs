//! Error types for spudpole operations.

use crate::constants::MAX_IDENTIFIER_LEN;
use crate::types::{Event, SpudpoleState};
use thiserror::Error;

/// Result type alias for spudpole operations.
pub type Result<T> = std::result::Result<T, SpudpoleError>;

/// Error types for spudpole configuration and control.
#[derive(Error, Debug)]
pub enum SpudpoleError {
    /// Serial port communication error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Identifier exceeds the fixed field length
    #[error("Identifier too long: {field} is {length} bytes (max {})", MAX_IDENTIFIER_LEN)]
    IdentifierTooLong {
        /// Name of the offending identifier field
        field: &'static str,
        /// Length of the rejected value
        length: usize,
    },

    /// Line measurement parameters are not physically meaningful
    #[error("Invalid line geometry: {0}")]
    InvalidGeometry(String),

    /// Electrical rating is not physically meaningful
    #[error("Invalid motor rating: {0}")]
    InvalidRating(String),

    /// Transition table names an event that cannot be refused
    #[error("Event {0:?} cannot be denied")]
    UndeniableEvent(Event),

    /// Transition table does not permit the event in the current state
    #[error("Transition refused: {event:?} while {from:?}")]
    TransitionRefused {
        /// State the spudpole was in
        from: SpudpoleState,
        /// Event that was refused
        event: Event,
    },
}
