//! Transition legality table.
//!
//! Every event is checked against a [`TransitionTable`] before the state
//! machine acts on it. The default table is permissive: any event is
//! accepted from any state. Only motor runs can be refused; docking and
//! stopping are always accepted.

use crate::error::SpudpoleError;
use crate::types::{Event, SpudpoleState};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct TransitionTableFields {
    #[serde(default)]
    denied: Vec<(SpudpoleState, Event)>,
}

/// Set of (state, event) pairs the state machine refuses
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "TransitionTableFields")]
pub struct TransitionTable {
    denied: Vec<(SpudpoleState, Event)>,
}

impl TransitionTable {
    /// Accept every event from every state
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Refuse motor runs while the state is `Unknown`, and retrieval when docked.
    ///
    /// Runs from `Stopped` are still accepted even if the spudpole was never
    /// docked, so the counter may not be referenced to the docked position.
    pub fn strict() -> Self {
        Self::permissive()
            .deny(SpudpoleState::Unknown, Event::Deploy)
            .deny(SpudpoleState::Unknown, Event::Retrieve)
            .deny(SpudpoleState::Docked, Event::Retrieve)
    }

    /// Refuse `event` while in `from`. Events that are not
    /// [deniable](Event::is_deniable) are ignored.
    pub fn deny(mut self, from: SpudpoleState, event: Event) -> Self {
        if !event.is_deniable() {
            warn!("Ignoring denial of {:?} while {:?}", event, from);
            return self;
        }
        if !self.denied.contains(&(from, event)) {
            self.denied.push((from, event));
        }
        self
    }

    /// Accept `event` while in `from`
    pub fn allow(mut self, from: SpudpoleState, event: Event) -> Self {
        self.denied.retain(|&pair| pair != (from, event));
        self
    }

    pub fn allows(&self, from: SpudpoleState, event: Event) -> bool {
        !self.denied.contains(&(from, event))
    }

    pub fn is_permissive(&self) -> bool {
        self.denied.is_empty()
    }
}

impl TryFrom<TransitionTableFields> for TransitionTable {
    type Error = SpudpoleError;

    fn try_from(fields: TransitionTableFields) -> Result<Self, SpudpoleError> {
        fields
            .denied
            .into_iter()
            .try_fold(Self::permissive(), |table, (from, event)| {
                if event.is_deniable() {
                    Ok(table.deny(from, event))
                } else {
                    Err(SpudpoleError::UndeniableEvent(event))
                }
            })
    }
}
