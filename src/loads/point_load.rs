//! Point loads on members

use serde::{Deserialize, Serialize};

use super::distributed::CoordSystem;

/// Direction of a concentrated member load
///
/// `Gravity` always acts along global -Z, whatever the load's axis system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDirection", into = "String")]
pub enum LoadDirection {
    /// Global X or local axis 1
    Axis1,
    /// Global Y or local axis 2
    Axis2,
    /// Global Z or local axis 3
    Axis3,
    Gravity,
    /// Unrecognized label; the load is skipped
    Unknown(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDirection {
    Index(i64),
    Label(String),
}

impl From<RawDirection> for LoadDirection {
    fn from(raw: RawDirection) -> Self {
        match raw {
            RawDirection::Index(i) => LoadDirection::parse(&i.to_string()),
            RawDirection::Label(s) => LoadDirection::parse(&s),
        }
    }
}

impl From<LoadDirection> for String {
    fn from(dir: LoadDirection) -> Self {
        match dir {
            LoadDirection::Axis1 => "X".to_string(),
            LoadDirection::Axis2 => "Y".to_string(),
            LoadDirection::Axis3 => "Z".to_string(),
            LoadDirection::Gravity => "Gravity".to_string(),
            LoadDirection::Unknown(s) => s,
        }
    }
}

impl LoadDirection {
    /// Parse a direction label such as "Gravity", "X", "Local 2" or "3"
    pub fn parse(label: &str) -> Self {
        let d = label.to_uppercase();
        if d.contains("GRAVITY") {
            LoadDirection::Gravity
        } else if d.contains('X') || d.contains('1') {
            LoadDirection::Axis1
        } else if d.contains('Y') || d.contains('2') {
            LoadDirection::Axis2
        } else if d.contains('Z') || d.contains('3') {
            LoadDirection::Axis3
        } else {
            LoadDirection::Unknown(label.to_string())
        }
    }

    /// Unit vector in the load's axis system, or None for unknown labels
    pub fn unit_vector(&self) -> Option<[f64; 3]> {
        match self {
            LoadDirection::Axis1 => Some([1.0, 0.0, 0.0]),
            LoadDirection::Axis2 => Some([0.0, 1.0, 0.0]),
            LoadDirection::Axis3 => Some([0.0, 0.0, 1.0]),
            LoadDirection::Gravity => Some([0.0, 0.0, -1.0]),
            LoadDirection::Unknown(_) => None,
        }
    }
}

/// Whether a point load is a force or a couple
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointLoadKind {
    #[default]
    Force,
    Moment,
}

/// A concentrated force or moment on a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPointLoad {
    /// Load pattern this load belongs to
    pub pattern: String,
    pub element_id: u32,
    /// Load magnitude
    pub force: f64,
    /// Distance from the member's i-end (absolute or relative)
    pub dist: f64,
    /// `dist` is a fraction of the total member length
    #[serde(default)]
    pub is_rel: bool,
    #[serde(default)]
    pub coord: CoordSystem,
    pub dir: LoadDirection,
    #[serde(default)]
    pub l_type: PointLoadKind,
}

impl MemberPointLoad {
    /// Create a point force at a relative position along the member
    pub fn at_fraction(pattern: &str, element_id: u32, force: f64, fraction: f64, dir: LoadDirection) -> Self {
        Self {
            pattern: pattern.to_string(),
            element_id,
            force,
            dist: fraction,
            is_rel: true,
            coord: CoordSystem::Global,
            dir,
            l_type: PointLoadKind::Force,
        }
    }

    /// Create a point force at an absolute distance from the i-end
    pub fn at_distance(pattern: &str, element_id: u32, force: f64, dist: f64, dir: LoadDirection) -> Self {
        Self {
            is_rel: false,
            ..Self::at_fraction(pattern, element_id, force, dist, dir)
        }
    }

    /// Use the member's local axes
    pub fn in_local(mut self) -> Self {
        self.coord = CoordSystem::Local;
        self
    }

    /// Turn the load into a concentrated couple
    pub fn as_moment(mut self) -> Self {
        self.l_type = PointLoadKind::Moment;
        self
    }

    /// Axis system the load actually acts in
    pub fn effective_coord(&self) -> CoordSystem {
        if self.dir == LoadDirection::Gravity {
            CoordSystem::Global
        } else {
            self.coord
        }
    }

    /// Distance from the adjusted i-end, given the total member length
    pub fn position(&self, l_total: f64) -> f64 {
        if self.is_rel {
            self.dist * l_total
        } else {
            self.dist
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!(LoadDirection::parse("Gravity"), LoadDirection::Gravity);
        assert_eq!(LoadDirection::parse("global x"), LoadDirection::Axis1);
        assert_eq!(LoadDirection::parse("2"), LoadDirection::Axis2);
        assert_eq!(LoadDirection::parse("Z"), LoadDirection::Axis3);
        assert!(LoadDirection::parse("sideways").unit_vector().is_none());
    }

    #[test]
    fn test_gravity_forces_global_axes() {
        let load: MemberPointLoad = serde_json::from_str(
            r#"{"pattern": "DEAD", "element_id": 2, "force": 10.0, "dist": 0.5,
                "is_rel": true, "coord": "Local", "dir": "Gravity", "l_type": "Force"}"#,
        )
        .unwrap();
        assert_eq!(load.effective_coord(), CoordSystem::Global);
        assert!((load.position(4.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_numeric_direction() {
        let load: MemberPointLoad = serde_json::from_str(
            r#"{"pattern": "L", "element_id": 1, "force": 1.0, "dist": 1.5, "dir": 3}"#,
        )
        .unwrap();
        assert_eq!(load.dir, LoadDirection::Axis3);
        assert_eq!(load.l_type, PointLoadKind::Force);
        assert!((load.position(4.0) - 1.5).abs() < 1e-12);
    }
}
