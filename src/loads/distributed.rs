//! Distributed loads on members

use serde::{Deserialize, Serialize};

/// Axis system a member load is given in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordSystem {
    #[default]
    #[serde(alias = "global", alias = "GLOBAL")]
    Global,
    #[serde(alias = "local", alias = "LOCAL")]
    Local,
}

/// A uniform line load over the clear span of a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDistributedLoad {
    /// Load pattern this load belongs to
    pub pattern: String,
    pub element_id: u32,
    #[serde(default)]
    pub wx: f64,
    #[serde(default)]
    pub wy: f64,
    #[serde(default)]
    pub wz: f64,
    #[serde(default)]
    pub coord: CoordSystem,
    /// Load is given per unit projected length (global loads only)
    #[serde(default)]
    pub projected: bool,
}

impl MemberDistributedLoad {
    /// Create a uniform load in global axes
    pub fn global(pattern: &str, element_id: u32, wx: f64, wy: f64, wz: f64) -> Self {
        Self {
            pattern: pattern.to_string(),
            element_id,
            wx,
            wy,
            wz,
            coord: CoordSystem::Global,
            projected: false,
        }
    }

    /// Create a uniform load in member local axes
    pub fn local(pattern: &str, element_id: u32, w1: f64, w2: f64, w3: f64) -> Self {
        Self {
            coord: CoordSystem::Local,
            ..Self::global(pattern, element_id, w1, w2, w3)
        }
    }

    /// Create a downward (negative global Z) load
    pub fn gravity(pattern: &str, element_id: u32, w: f64) -> Self {
        Self::global(pattern, element_id, 0.0, 0.0, -w.abs())
    }

    /// Mark the load as acting per projected length
    pub fn projected(mut self) -> Self {
        self.projected = true;
        self
    }

    pub fn components(&self) -> [f64; 3] {
        [self.wx, self.wy, self.wz]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_defaults_to_global() {
        let load: MemberDistributedLoad =
            serde_json::from_str(r#"{"pattern": "DEAD", "element_id": 1, "wz": -5.0}"#).unwrap();
        assert_eq!(load.coord, CoordSystem::Global);
        assert!(!load.projected);
        assert_eq!(load.components(), [0.0, 0.0, -5.0]);
    }
}
