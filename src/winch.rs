use crate::collaborators::{ControlSink, RunTimer};
use crate::error::{Result, SpudpoleError};
use crate::geometry::LineGeometry;
use crate::policy::TransitionTable;
use crate::types::*;
use crate::constants::LINE_LENGTH_UNAVAILABLE;
use chrono::Utc;
use log::{debug, info, warn};

/// One physical spudpole
pub struct Spudpole {
    identity: Identity,
    geometry: Option<LineGeometry>,
    motor_rating: MotorRating,
    counter_policy: CounterPolicy,
    transitions: TransitionTable,
    state: SpudpoleState,
    counter: u32,
    motor_run_time: u64,
    control: Option<Box<dyn ControlSink>>,
    timer: Option<Box<dyn RunTimer>>,
}

/// Setup for a [`Spudpole`]; everything configured here is fixed once built
pub struct SpudpoleBuilder {
    identity: Identity,
    geometry: Option<LineGeometry>,
    motor_rating: MotorRating,
    counter_policy: CounterPolicy,
    transitions: TransitionTable,
    motor_run_time: u64,
    control: Option<Box<dyn ControlSink>>,
    timer: Option<Box<dyn RunTimer>>,
}

impl SpudpoleBuilder {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            geometry: None,
            motor_rating: MotorRating::default(),
            counter_policy: CounterPolicy::default(),
            transitions: TransitionTable::permissive(),
            motor_run_time: 0,
            control: None,
            timer: None,
        }
    }

    /// Start from a deserialized configuration; collaborators are added afterwards
    pub fn from_config(config: SpudpoleConfig) -> Self {
        let mut builder = Self::new(config.identity)
            .motor_rating(config.motor_rating)
            .counter_policy(config.counter_policy)
            .transitions(config.transitions);
        builder.geometry = config.line_geometry;
        builder
    }

    /// Sink receiving motor commands
    pub fn control(mut self, sink: impl ControlSink + 'static) -> Self {
        self.control = Some(Box::new(sink));
        self
    }

    /// Enable deployed line length estimation
    pub fn line_measurement(mut self, geometry: LineGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Enable run-time accounting starting from `motor_run_time` seconds
    pub fn run_time_accounting(mut self, motor_run_time: u64, timer: impl RunTimer + 'static) -> Self {
        self.motor_run_time = motor_run_time;
        self.timer = Some(Box::new(timer));
        self
    }

    pub fn motor_rating(mut self, motor_rating: MotorRating) -> Self {
        self.motor_rating = motor_rating;
        self
    }

    pub fn counter_policy(mut self, counter_policy: CounterPolicy) -> Self {
        self.counter_policy = counter_policy;
        self
    }

    pub fn transitions(mut self, transitions: TransitionTable) -> Self {
        self.transitions = transitions;
        self
    }

    /// Validate the configuration and create the spudpole in state `Unknown`
    pub fn build(self) -> Result<Spudpole> {
        if let Some(geometry) = &self.geometry {
            geometry.validate()?;
        }
        self.motor_rating.validate()?;

        debug!(
            "Created spudpole {} {} ({}), line measurement {}, run-time accounting {}",
            self.identity.manufacturer_name(),
            self.identity.model_code(),
            self.identity.serial_code(),
            if self.geometry.map_or(false, |g| g.is_configured()) { "on" } else { "off" },
            if self.timer.is_some() { "on" } else { "off" },
        );

        Ok(Spudpole {
            identity: self.identity,
            geometry: self.geometry,
            motor_rating: self.motor_rating,
            counter_policy: self.counter_policy,
            transitions: self.transitions,
            state: SpudpoleState::Unknown,
            counter: 0,
            motor_run_time: self.motor_run_time,
            control: self.control,
            timer: self.timer,
        })
    }
}

impl Spudpole {
    /// Create a spudpole with identity only: no collaborators, no line measurement
    pub fn new(manufacturer_name: &str, model_code: &str, serial_code: &str) -> Result<Self> {
        Self::builder(Identity::new(manufacturer_name, model_code, serial_code)?).build()
    }

    pub fn builder(identity: Identity) -> SpudpoleBuilder {
        SpudpoleBuilder::new(identity)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn manufacturer_name(&self) -> &str {
        self.identity.manufacturer_name()
    }

    pub fn model_code(&self) -> &str {
        self.identity.model_code()
    }

    pub fn serial_code(&self) -> &str {
        self.identity.serial_code()
    }

    pub fn line_geometry(&self) -> Option<&LineGeometry> {
        self.geometry.as_ref()
    }

    pub fn motor_rating(&self) -> &MotorRating {
        &self.motor_rating
    }

    pub fn counter_policy(&self) -> CounterPolicy {
        self.counter_policy
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Docked sensor tripped: line fully recovered, counter back to zero
    pub fn mark_docked(&mut self) -> Result<()> {
        self.transition(Event::MarkDocked)?;
        self.counter = 0;
        Ok(())
    }

    /// Start paying out line
    pub fn deploy(&mut self) -> Result<()> {
        self.transition(Event::Deploy)?;
        self.actuate(ControlAction::Deploy);
        self.start_timer();
        Ok(())
    }

    /// Start recovering line
    pub fn retrieve(&mut self) -> Result<()> {
        self.transition(Event::Retrieve)?;
        self.actuate(ControlAction::Retrieve);
        self.start_timer();
        Ok(())
    }

    /// Stop the motor and record the accumulated run time
    pub fn stop(&mut self) -> Result<()> {
        self.transition(Event::Stop)?;
        self.actuate(ControlAction::Stop);
        self.stop_timer();
        Ok(())
    }

    /// Motor already stopped outside our control (limit switch, manual stop):
    /// record it without sending a control action
    pub fn mark_stopped(&mut self) -> Result<()> {
        self.transition(Event::Stop)?;
        self.stop_timer();
        Ok(())
    }

    fn transition(&mut self, event: Event) -> Result<()> {
        let from = self.state;
        if !self.transitions.allows(from, event) {
            warn!("{}: refused {:?} while {:?}", self.identity.serial_code(), event, from);
            return Err(SpudpoleError::TransitionRefused { from, event });
        }
        self.state = event.target();
        info!("{}: {:?} -> {:?}", self.identity.serial_code(), from, self.state);
        Ok(())
    }

    fn actuate(&mut self, action: ControlAction) {
        if let Some(control) = self.control.as_mut() {
            if let Err(e) = control.actuate(action) {
                warn!("{}: control action {:?} failed: {}", self.identity.serial_code(), action, e);
            }
        }
    }

    fn start_timer(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.signal(TimerMode::Start, self.motor_run_time);
        }
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            self.motor_run_time = timer.signal(TimerMode::Stop, self.motor_run_time);
            debug!("{}: motor run time {}s", self.identity.serial_code(), self.motor_run_time);
        }
    }

    pub fn state(&self) -> SpudpoleState {
        self.state
    }

    /// Motor is running in either direction
    pub fn is_working(&self) -> bool {
        matches!(self.state, SpudpoleState::Deploying | SpudpoleState::Retrieving)
    }

    pub fn is_docked(&self) -> bool {
        self.state == SpudpoleState::Docked
    }

    /// Stopped away from the dock
    pub fn is_deployed(&self) -> bool {
        self.state == SpudpoleState::Stopped
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Count one drum turn out; only effective while deploying
    pub fn increment_counter(&mut self) -> u32 {
        if self.state == SpudpoleState::Deploying && !self.at_capacity() {
            self.counter = self.counter.saturating_add(1);
            debug!("{}: counter {}", self.identity.serial_code(), self.counter);
        }
        self.counter
    }

    /// Count one drum turn in; only effective while retrieving
    pub fn decrement_counter(&mut self) -> u32 {
        if self.state == SpudpoleState::Retrieving && self.counter > 0 {
            self.counter -= 1;
            debug!("{}: counter {}", self.identity.serial_code(), self.counter);
        }
        self.counter
    }

    /// Record one drum turn in whichever direction the motor is running
    pub fn bump_counter(&mut self) -> u32 {
        match self.state {
            SpudpoleState::Deploying => self.increment_counter(),
            SpudpoleState::Retrieving => self.decrement_counter(),
            SpudpoleState::Unknown | SpudpoleState::Docked | SpudpoleState::Stopped => self.counter,
        }
    }

    fn at_capacity(&self) -> bool {
        match self.counter_policy {
            CounterPolicy::Unbounded => false,
            CounterPolicy::ClampAtDocked => self
                .measured_geometry()
                .map_or(false, |g| self.counter >= g.turns_when_docked),
        }
    }

    fn measured_geometry(&self) -> Option<&LineGeometry> {
        self.geometry.as_ref().filter(|g| g.is_configured())
    }

    /// Line paid out since docked (m), if state is known and geometry configured
    pub fn deployed_line_length(&self) -> Option<f64> {
        if self.state == SpudpoleState::Unknown {
            return None;
        }
        self.measured_geometry().map(|g| g.deployed_length(self.counter))
    }

    /// As [`deployed_line_length`](Self::deployed_line_length), with
    /// [`LINE_LENGTH_UNAVAILABLE`] standing in for no measurement
    pub fn deployed_line_length_or_sentinel(&self) -> f64 {
        self.deployed_line_length().unwrap_or(LINE_LENGTH_UNAVAILABLE)
    }

    /// Accumulated motor run time in seconds; zero without run-time accounting
    pub fn total_motor_time(&self) -> u64 {
        if self.timer.is_some() {
            self.motor_run_time
        } else {
            0
        }
    }

    pub fn status(&self) -> SpudpoleStatus {
        let motor_run_time = self.total_motor_time();
        SpudpoleStatus {
            timestamp: Utc::now(),
            state: self.state,
            is_working: self.is_working(),
            counter: self.counter,
            deployed_line_length: self.deployed_line_length(),
            motor_run_time,
            motor_run_time_hms: format_run_time(motor_run_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingControl {
        actions: Rc<RefCell<Vec<ControlAction>>>,
    }

    impl ControlSink for RecordingControl {
        fn actuate(&mut self, action: ControlAction) -> Result<()> {
            self.actions.borrow_mut().push(action);
            Ok(())
        }
    }

    struct FailingControl;

    impl ControlSink for FailingControl {
        fn actuate(&mut self, _action: ControlAction) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "relay unplugged").into())
        }
    }

    fn drum() -> LineGeometry {
        LineGeometry {
            spool_diameter: 0.05,
            line_diameter: 0.008,
            turns_per_layer: 10,
            turns_when_docked: 51,
        }
    }

    fn measured() -> Spudpole {
        Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .line_measurement(drum())
            .build()
            .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let spudpole = Spudpole::new("Ankreo", "SP6", "0001").unwrap();
        assert_eq!(spudpole.state(), SpudpoleState::Unknown);
        assert_eq!(spudpole.counter(), 0);
        assert_eq!(spudpole.total_motor_time(), 0);
        assert!(!spudpole.is_working());
        assert!(!spudpole.is_docked());
        assert!(!spudpole.is_deployed());
        assert_eq!(spudpole.manufacturer_name(), "Ankreo");
        assert_eq!(spudpole.model_code(), "SP6");
        assert_eq!(spudpole.serial_code(), "0001");
    }

    #[test]
    fn test_new_rejects_long_identifier() {
        let serial = "9".repeat(40);
        assert!(matches!(
            Spudpole::new("Ankreo", "SP6", &serial),
            Err(SpudpoleError::IdentifierTooLong { field: "serial_code", length: 40 })
        ));
    }

    #[test]
    fn test_build_rejects_invalid_geometry() {
        let result = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .line_measurement(LineGeometry {
                turns_per_layer: 0,
                ..drum()
            })
            .build();
        assert!(matches!(result, Err(SpudpoleError::InvalidGeometry(_))));
    }

    #[test]
    fn test_every_state_reachable_from_every_state() {
        let mut spudpole = measured();
        let events = [Event::MarkDocked, Event::Deploy, Event::Retrieve, Event::Stop];
        for first in events {
            for second in events {
                for event in [first, second] {
                    match event {
                        Event::MarkDocked => spudpole.mark_docked().unwrap(),
                        Event::Deploy => spudpole.deploy().unwrap(),
                        Event::Retrieve => spudpole.retrieve().unwrap(),
                        Event::Stop => spudpole.stop().unwrap(),
                    }
                    assert_eq!(spudpole.state(), event.target());
                }
            }
        }
    }

    #[test]
    fn test_retrieve_directly_from_docked_is_permitted() {
        let mut spudpole = measured();
        spudpole.mark_docked().unwrap();
        spudpole.retrieve().unwrap();
        assert_eq!(spudpole.state(), SpudpoleState::Retrieving);
        assert_eq!(spudpole.bump_counter(), 0);
    }

    #[test]
    fn test_mark_docked_resets_counter_from_any_state() {
        let mut spudpole = measured();
        spudpole.deploy().unwrap();
        for _ in 0..7 {
            spudpole.bump_counter();
        }
        spudpole.stop().unwrap();
        assert_eq!(spudpole.counter(), 7);
        spudpole.mark_docked().unwrap();
        assert_eq!(spudpole.counter(), 0);
        assert!(spudpole.is_docked());

        spudpole.deploy().unwrap();
        spudpole.bump_counter();
        spudpole.mark_docked().unwrap();
        assert_eq!(spudpole.counter(), 0);
        assert_eq!(spudpole.state(), SpudpoleState::Docked);
    }

    #[test]
    fn test_bump_counter_by_state() {
        let mut spudpole = measured();
        assert_eq!(spudpole.bump_counter(), 0);

        spudpole.mark_docked().unwrap();
        assert_eq!(spudpole.bump_counter(), 0);

        spudpole.deploy().unwrap();
        assert_eq!(spudpole.bump_counter(), 1);
        assert_eq!(spudpole.bump_counter(), 2);
        assert_eq!(spudpole.bump_counter(), 3);

        spudpole.stop().unwrap();
        assert_eq!(spudpole.bump_counter(), 3);

        spudpole.retrieve().unwrap();
        assert_eq!(spudpole.bump_counter(), 2);
        assert_eq!(spudpole.bump_counter(), 1);
        assert_eq!(spudpole.bump_counter(), 0);
        assert_eq!(spudpole.bump_counter(), 0);
    }

    #[test]
    fn test_increment_and_decrement_are_state_guarded() {
        let mut spudpole = measured();
        spudpole.deploy().unwrap();
        assert_eq!(spudpole.decrement_counter(), 0);
        assert_eq!(spudpole.increment_counter(), 1);
        spudpole.retrieve().unwrap();
        assert_eq!(spudpole.increment_counter(), 1);
        assert_eq!(spudpole.decrement_counter(), 0);
    }

    #[test]
    fn test_unbounded_counter_passes_docked_capacity() {
        let mut spudpole = measured();
        spudpole.deploy().unwrap();
        for _ in 0..60 {
            spudpole.bump_counter();
        }
        assert_eq!(spudpole.counter(), 60);
        let full = drum().length_from_turns(51);
        assert_eq!(spudpole.deployed_line_length(), Some(full));
    }

    #[test]
    fn test_clamped_counter_stops_at_docked_capacity() {
        let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .line_measurement(drum())
            .counter_policy(CounterPolicy::ClampAtDocked)
            .build()
            .unwrap();
        spudpole.deploy().unwrap();
        for _ in 0..60 {
            spudpole.bump_counter();
        }
        assert_eq!(spudpole.counter(), 51);
    }

    #[test]
    fn test_clamp_without_geometry_counts_freely() {
        let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .counter_policy(CounterPolicy::ClampAtDocked)
            .build()
            .unwrap();
        spudpole.deploy().unwrap();
        for _ in 0..5 {
            spudpole.bump_counter();
        }
        assert_eq!(spudpole.counter(), 5);
    }

    #[test]
    fn test_line_length_unavailable_in_unknown_state() {
        let spudpole = measured();
        assert_eq!(spudpole.deployed_line_length(), None);
        assert_eq!(spudpole.deployed_line_length_or_sentinel(), LINE_LENGTH_UNAVAILABLE);
    }

    #[test]
    fn test_line_length_unavailable_without_spool_diameter() {
        let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .line_measurement(LineGeometry {
                spool_diameter: 0.0,
                ..drum()
            })
            .build()
            .unwrap();
        spudpole.deploy().unwrap();
        for _ in 0..12 {
            spudpole.bump_counter();
        }
        assert_eq!(spudpole.counter(), 12);
        assert_eq!(spudpole.deployed_line_length(), None);
        assert_eq!(spudpole.deployed_line_length_or_sentinel(), LINE_LENGTH_UNAVAILABLE);
    }

    #[test]
    fn test_line_length_zero_when_docked() {
        let mut spudpole = measured();
        spudpole.mark_docked().unwrap();
        assert_eq!(spudpole.deployed_line_length(), Some(0.0));
    }

    #[test]
    fn test_control_actions_in_order() {
        let control = RecordingControl::default();
        let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .control(control.clone())
            .build()
            .unwrap();
        spudpole.mark_docked().unwrap();
        spudpole.deploy().unwrap();
        spudpole.stop().unwrap();
        spudpole.retrieve().unwrap();
        spudpole.stop().unwrap();
        assert_eq!(
            *control.actions.borrow(),
            vec![
                ControlAction::Deploy,
                ControlAction::Stop,
                ControlAction::Retrieve,
                ControlAction::Stop,
            ]
        );
    }

    struct FixedTimer(u64);

    impl RunTimer for FixedTimer {
        fn signal(&mut self, mode: TimerMode, total: u64) -> u64 {
            match mode {
                TimerMode::Start => total,
                TimerMode::Stop => self.0,
            }
        }
    }

    #[test]
    fn test_mark_stopped_records_without_actuation() {
        let control = RecordingControl::default();
        let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .control(control.clone())
            .run_time_accounting(0, FixedTimer(42))
            .build()
            .unwrap();

        spudpole.deploy().unwrap();
        spudpole.mark_stopped().unwrap();
        assert_eq!(spudpole.state(), SpudpoleState::Stopped);
        assert!(spudpole.is_deployed());
        assert_eq!(spudpole.total_motor_time(), 42);
        assert_eq!(*control.actions.borrow(), vec![ControlAction::Deploy]);
    }

    #[test]
    fn test_stop_and_dock_survive_denials() {
        let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .transitions(
                TransitionTable::permissive()
                    .deny(SpudpoleState::Retrieving, Event::MarkDocked)
                    .deny(SpudpoleState::Deploying, Event::Stop),
            )
            .build()
            .unwrap();

        spudpole.deploy().unwrap();
        spudpole.stop().unwrap();
        assert_eq!(spudpole.state(), SpudpoleState::Stopped);

        spudpole.retrieve().unwrap();
        spudpole.mark_docked().unwrap();
        assert_eq!(spudpole.state(), SpudpoleState::Docked);
    }

    #[test]
    fn test_control_failure_does_not_block_transition() {
        let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .control(FailingControl)
            .build()
            .unwrap();
        spudpole.deploy().unwrap();
        assert_eq!(spudpole.state(), SpudpoleState::Deploying);
    }

    #[test]
    fn test_strict_table_refuses_without_side_effects() {
        let control = RecordingControl::default();
        let mut spudpole = Spudpole::builder(Identity::new("Ankreo", "SP6", "0001").unwrap())
            .control(control.clone())
            .transitions(TransitionTable::strict())
            .build()
            .unwrap();

        match spudpole.deploy() {
            Err(SpudpoleError::TransitionRefused { from, event }) => {
                assert_eq!(from, SpudpoleState::Unknown);
                assert_eq!(event, Event::Deploy);
            }
            other => panic!("expected TransitionRefused, got {:?}", other),
        }
        assert_eq!(spudpole.state(), SpudpoleState::Unknown);
        assert!(control.actions.borrow().is_empty());

        spudpole.mark_docked().unwrap();
        assert!(spudpole.retrieve().is_err());
        assert!(spudpole.is_docked());
        spudpole.deploy().unwrap();
        assert_eq!(*control.actions.borrow(), vec![ControlAction::Deploy]);
    }

    #[test]
    fn test_status_snapshot() {
        let mut spudpole = measured();
        spudpole.mark_docked().unwrap();
        spudpole.deploy().unwrap();
        spudpole.bump_counter();
        let status = spudpole.status();
        assert_eq!(status.state, SpudpoleState::Deploying);
        assert!(status.is_working);
        assert_eq!(status.counter, 1);
        assert!(status.deployed_line_length.unwrap() > 0.0);
        assert_eq!(status.motor_run_time, 0);
        assert_eq!(status.motor_run_time_hms, "00:00:00");
    }
}
