//! Node - a joint in 3D space with its support restraints

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// A joint of the frame model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// User id (not necessarily contiguous)
    pub id: u32,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
    /// Restraint flags [UX, UY, UZ, RX, RY, RZ]
    #[serde(default)]
    pub restraints: [bool; 6],
}

impl Node {
    /// Create a new unrestrained node
    pub fn new(id: u32, x: f64, y: f64, z: f64) -> Self {
        Self {
            id,
            x,
            y,
            z,
            restraints: [false; 6],
        }
    }

    /// Fully fixed support
    pub fn fixed(mut self) -> Self {
        self.restraints = [true; 6];
        self
    }

    /// Pinned support (translations restrained)
    pub fn pinned(mut self) -> Self {
        self.restraints = [true, true, true, false, false, false];
        self
    }

    /// Set arbitrary restraint flags
    pub fn with_restraints(mut self, restraints: [bool; 6]) -> Self {
        self.restraints = restraints;
        self
    }

    /// Get the coordinates as a vector
    pub fn coords(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        (other.coords() - self.coords()).norm()
    }

    /// Number of restrained DOFs
    pub fn num_restrained(&self) -> usize {
        self.restraints.iter().filter(|&&r| r).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_distance() {
        let n1 = Node::new(1, 0.0, 0.0, 0.0);
        let n2 = Node::new(2, 3.0, 4.0, 0.0);
        assert!((n1.distance_to(&n2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_restraints_default_free() {
        let node: Node = serde_json::from_str(r#"{"id": 4, "x": 1.0, "y": 2.0, "z": 3.0}"#).unwrap();
        assert_eq!(node.num_restrained(), 0);
        assert_eq!(Node::new(1, 0.0, 0.0, 0.0).pinned().num_restrained(), 3);
    }
}
