//! Drum geometry and deployed line length estimation.
//!
//! Line is wound onto the drum in concentric layers of `turns_per_layer`
//! turns. Each layer sits one line diameter further out on each side, so a
//! turn on layer `L` follows a centreline of diameter
//! `spool_diameter + line_diameter + 2 * L * line_diameter`.

use crate::error::{Result, SpudpoleError};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Line measurement parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LineGeometry {
    /// Bare drum diameter (m); zero means line measurement is unconfigured
    pub spool_diameter: f64,
    /// Line (rode) diameter (m)
    pub line_diameter: f64,
    /// Turns that fit side by side on one layer
    pub turns_per_layer: u32,
    /// Turns on the drum when fully docked
    pub turns_when_docked: u32,
}

impl LineGeometry {
    /// Check the parameters can be used for length queries
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("spool_diameter", self.spool_diameter),
            ("line_diameter", self.line_diameter),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SpudpoleError::InvalidGeometry(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.is_configured() && self.turns_per_layer == 0 {
            return Err(SpudpoleError::InvalidGeometry(
                "turns_per_layer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether line measurement is available
    pub fn is_configured(&self) -> bool {
        self.spool_diameter > 0.0
    }

    /// Cumulative length of line held by the first `turns` turns on the drum
    pub fn length_from_turns(&self, turns: u32) -> f64 {
        if self.turns_per_layer == 0 {
            return 0.0;
        }
        let layers_used = turns / self.turns_per_layer;
        (0..=layers_used)
            .map(|layer| {
                let turns_on_layer = if layer < layers_used {
                    self.turns_per_layer
                } else {
                    turns % self.turns_per_layer
                };
                self.length_on_layer(layer, turns_on_layer)
            })
            .sum()
    }

    /// Length of line in `turns_on_layer` turns on layer `layer`
    fn length_on_layer(&self, layer: u32, turns_on_layer: u32) -> f64 {
        let diameter =
            self.spool_diameter + self.line_diameter + 2.0 * layer as f64 * self.line_diameter;
        turns_on_layer as f64 * PI * diameter
    }

    /// Length of line that has left the drum after `counter` turns from docked
    pub fn deployed_length(&self, counter: u32) -> f64 {
        let remaining = self.turns_when_docked.saturating_sub(counter);
        self.length_from_turns(self.turns_when_docked) - self.length_from_turns(remaining)
    }
}
