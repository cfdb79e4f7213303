//! Frame element - 3D beam/column between two nodes

use serde::{Deserialize, Serialize};

/// End releases for a frame element
///
/// Each end carries six flags in local axes:
/// [P (axial), V2, V3, T (torsion), M22, M33].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberReleases {
    pub i_end: [bool; 6],
    pub j_end: [bool; 6],
}

impl MemberReleases {
    /// Create releases with no end releases
    pub fn none() -> Self {
        Self::default()
    }

    /// Moment releases at the i-end
    pub fn pin_i() -> Self {
        Self {
            i_end: [false, false, false, false, true, true],
            j_end: [false; 6],
        }
    }

    /// Moment releases at the j-end
    pub fn pin_j() -> Self {
        Self {
            i_end: [false; 6],
            j_end: [false, false, false, false, true, true],
        }
    }

    /// Moment releases at both ends
    pub fn pin_both() -> Self {
        Self {
            i_end: [false, false, false, false, true, true],
            j_end: [false, false, false, false, true, true],
        }
    }

    /// Get combined releases as 12-element array
    pub fn as_array(&self) -> [bool; 12] {
        let mut arr = [false; 12];
        arr[0..6].copy_from_slice(&self.i_end);
        arr[6..12].copy_from_slice(&self.j_end);
        arr
    }

    /// True if any DOF is released
    pub fn any(&self) -> bool {
        self.i_end.iter().chain(self.j_end.iter()).any(|&r| r)
    }
}

fn default_cardinal() -> u8 {
    10
}

/// A 3D frame element (beam or column)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameElement {
    pub id: u32,
    /// Node id at the i-end
    pub n1_id: u32,
    /// Node id at the j-end
    pub n2_id: u32,
    /// Name of the section (which names the material)
    pub sec_name: String,
    /// Rotation of local axes 2-3 about axis 1 (degrees)
    #[serde(default)]
    pub beta: f64,
    #[serde(default)]
    pub rel_i: [bool; 6],
    #[serde(default)]
    pub rel_j: [bool; 6],
    /// Global vector from node i to the member's i-end
    #[serde(default)]
    pub off_i: [f64; 3],
    /// Global vector from node j to the member's j-end
    #[serde(default)]
    pub off_j: [f64; 3],
    /// Rigid zone length at the i-end
    #[serde(default)]
    pub end_off_i: f64,
    /// Rigid zone length at the j-end
    #[serde(default)]
    pub end_off_j: f64,
    /// Insertion point; already resolved into the joint offsets
    #[serde(default = "default_cardinal")]
    pub cardinal: u8,
}

impl FrameElement {
    /// Create a new element with no releases or offsets
    pub fn new(id: u32, n1_id: u32, n2_id: u32, sec_name: &str) -> Self {
        Self {
            id,
            n1_id,
            n2_id,
            sec_name: sec_name.to_string(),
            beta: 0.0,
            rel_i: [false; 6],
            rel_j: [false; 6],
            off_i: [0.0; 3],
            off_j: [0.0; 3],
            end_off_i: 0.0,
            end_off_j: 0.0,
            cardinal: default_cardinal(),
        }
    }

    /// Set the local axis angle in degrees
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set end releases
    pub fn with_releases(mut self, releases: MemberReleases) -> Self {
        self.rel_i = releases.i_end;
        self.rel_j = releases.j_end;
        self
    }

    /// Set joint offsets (global vectors)
    pub fn with_joint_offsets(mut self, off_i: [f64; 3], off_j: [f64; 3]) -> Self {
        self.off_i = off_i;
        self.off_j = off_j;
        self
    }

    /// Set rigid end zone lengths
    pub fn with_end_offsets(mut self, end_off_i: f64, end_off_j: f64) -> Self {
        self.end_off_i = end_off_i;
        self.end_off_j = end_off_j;
        self
    }

    pub fn releases(&self) -> MemberReleases {
        MemberReleases {
            i_end: self.rel_i,
            j_end: self.rel_j,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_defaults() {
        let el: FrameElement =
            serde_json::from_str(r#"{"id": 3, "n1_id": 1, "n2_id": 2, "sec_name": "B30x50"}"#).unwrap();
        assert_eq!(el.beta, 0.0);
        assert_eq!(el.cardinal, 10);
        assert!(!el.releases().any());
    }

    #[test]
    fn test_releases() {
        let arr = MemberReleases::pin_i().as_array();
        assert!(!arr[0]);
        assert!(arr[4]);
        assert!(arr[5]);
        assert!(!arr[10]);
    }
}
