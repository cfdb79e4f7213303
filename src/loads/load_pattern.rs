//! Load patterns

use serde::{Deserialize, Serialize};

/// A named group of loads, optionally generating self-weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadPattern {
    pub name: String,
    /// Pattern family ("DEAD", "LIVE", ...), informational
    #[serde(rename = "type", default)]
    pub pattern_type: String,
    /// Self-weight multiplier (0 = no self-weight)
    #[serde(default)]
    pub sw_mult: f64,
}

impl LoadPattern {
    pub fn new(name: &str, pattern_type: &str, sw_mult: f64) -> Self {
        Self {
            name: name.to_string(),
            pattern_type: pattern_type.to_string(),
            sw_mult,
        }
    }

    /// Dead pattern carrying full self-weight
    pub fn dead(name: &str) -> Self {
        Self::new(name, "DEAD", 1.0)
    }

    /// Live pattern without self-weight
    pub fn live(name: &str) -> Self {
        Self::new(name, "LIVE", 0.0)
    }
}
