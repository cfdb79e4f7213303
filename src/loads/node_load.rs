//! Node loads - forces and moments applied directly to nodes

use serde::{Deserialize, Serialize};

/// A load applied directly to a node, in global axes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodalLoad {
    /// Load pattern this load belongs to
    pub pattern: String,
    pub node_id: u32,
    #[serde(default)]
    pub fx: f64,
    #[serde(default)]
    pub fy: f64,
    #[serde(default)]
    pub fz: f64,
    #[serde(default)]
    pub mx: f64,
    #[serde(default)]
    pub my: f64,
    #[serde(default)]
    pub mz: f64,
}

impl NodalLoad {
    /// Create a new node load with all components
    #[allow(clippy::too_many_arguments)]
    pub fn new(pattern: &str, node_id: u32, fx: f64, fy: f64, fz: f64, mx: f64, my: f64, mz: f64) -> Self {
        Self {
            pattern: pattern.to_string(),
            node_id,
            fx,
            fy,
            fz,
            mx,
            my,
            mz,
        }
    }

    /// Create a force-only node load
    pub fn force(pattern: &str, node_id: u32, fx: f64, fy: f64, fz: f64) -> Self {
        Self::new(pattern, node_id, fx, fy, fz, 0.0, 0.0, 0.0)
    }

    /// Create a moment-only node load
    pub fn moment(pattern: &str, node_id: u32, mx: f64, my: f64, mz: f64) -> Self {
        Self::new(pattern, node_id, 0.0, 0.0, 0.0, mx, my, mz)
    }

    /// Components as [FX, FY, FZ, MX, MY, MZ]
    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }
}
