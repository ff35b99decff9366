use crate::constants::{MAX_IDENTIFIER_LEN, RELAY_DEPLOY, RELAY_RETRIEVE, RELAY_STOP};
use crate::error::{Result, SpudpoleError};
use crate::geometry::LineGeometry;
use crate::policy::TransitionTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operating state of a spudpole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpudpoleState {
    /// Not yet observed; only ever the initial value
    #[default]
    Unknown = 0,
    Docked = 1,
    Deploying = 2,
    Retrieving = 3,
    Stopped = 4,
}

impl SpudpoleState {
    /// Numeric code used by network adapters
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Hardware events that drive the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    MarkDocked,
    Deploy,
    Retrieve,
    Stop,
}

impl Event {
    /// State entered when the event is accepted
    pub fn target(self) -> SpudpoleState {
        match self {
            Event::MarkDocked => SpudpoleState::Docked,
            Event::Deploy => SpudpoleState::Deploying,
            Event::Retrieve => SpudpoleState::Retrieving,
            Event::Stop => SpudpoleState::Stopped,
        }
    }

    /// Whether a transition table may refuse the event. Docking and stopping
    /// report physical facts and are always accepted.
    pub fn is_deniable(self) -> bool {
        matches!(self, Event::Deploy | Event::Retrieve)
    }
}

/// Physical actuation requested from the control sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlAction {
    Stop,
    Deploy,
    Retrieve,
}

impl ControlAction {
    /// Relay action code
    pub fn code(self) -> u8 {
        match self {
            ControlAction::Stop => RELAY_STOP,
            ControlAction::Deploy => RELAY_DEPLOY,
            ControlAction::Retrieve => RELAY_RETRIEVE,
        }
    }
}

/// Signal passed to the run timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerMode {
    Start,
    Stop,
}

/// Behaviour of the turn counter when deploying past the docked capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CounterPolicy {
    /// Count every turn; saturates only at `u32::MAX`
    #[default]
    Unbounded,
    /// Never count beyond `turns_when_docked` once geometry is configured
    ClampAtDocked,
}

#[derive(Deserialize)]
struct IdentityFields {
    manufacturer_name: String,
    model_code: String,
    serial_code: String,
}

/// Manufacturer, model and serial identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IdentityFields")]
pub struct Identity {
    manufacturer_name: String,
    model_code: String,
    serial_code: String,
}

impl Identity {
    /// Create an identity, rejecting fields longer than `MAX_IDENTIFIER_LEN` bytes
    pub fn new(
        manufacturer_name: impl Into<String>,
        model_code: impl Into<String>,
        serial_code: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            manufacturer_name: bounded("manufacturer_name", manufacturer_name.into())?,
            model_code: bounded("model_code", model_code.into())?,
            serial_code: bounded("serial_code", serial_code.into())?,
        })
    }

    pub fn manufacturer_name(&self) -> &str {
        &self.manufacturer_name
    }

    pub fn model_code(&self) -> &str {
        &self.model_code
    }

    pub fn serial_code(&self) -> &str {
        &self.serial_code
    }
}

impl TryFrom<IdentityFields> for Identity {
    type Error = SpudpoleError;

    fn try_from(fields: IdentityFields) -> Result<Self> {
        Identity::new(fields.manufacturer_name, fields.model_code, fields.serial_code)
    }
}

fn bounded(field: &'static str, value: String) -> Result<String> {
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(SpudpoleError::IdentifierTooLong {
            field,
            length: value.len(),
        });
    }
    Ok(value)
}

/// Electrical rating of the winch controller and motor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorRating {
    /// Nominal controller voltage (V)
    pub nominal_voltage: f64,
    /// Rated motor current (A)
    pub rated_current: f64,
}

impl MotorRating {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("nominal_voltage", self.nominal_voltage),
            ("rated_current", self.rated_current),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SpudpoleError::InvalidRating(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Static configuration of one spudpole
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpudpoleConfig {
    pub identity: Identity,
    #[serde(default)]
    pub line_geometry: Option<LineGeometry>,
    #[serde(default)]
    pub motor_rating: MotorRating,
    #[serde(default)]
    pub counter_policy: CounterPolicy,
    #[serde(default)]
    pub transitions: TransitionTable,
}

/// Snapshot of runtime state for network adapters
#[derive(Debug, Clone, Serialize)]
pub struct SpudpoleStatus {
    pub timestamp: DateTime<Utc>,
    pub state: SpudpoleState,
    pub is_working: bool,
    pub counter: u32,
    pub deployed_line_length: Option<f64>,
    pub motor_run_time: u64,
    pub motor_run_time_hms: String,
}

/// Format duration from seconds to HH:MM:SS
pub fn format_run_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
