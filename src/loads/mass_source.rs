//! Mass sources: which loads are converted to seismic mass

use serde::{Deserialize, Serialize};

/// A pattern contributing mass, with its multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMultiplier", into = "(String, f64)")]
pub struct MassMultiplier {
    pub pattern: String,
    pub multiplier: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMultiplier {
    Pair(String, f64),
    Named {
        name: String,
        #[serde(alias = "mult", alias = "multiplier")]
        scale: f64,
    },
}

impl From<RawMultiplier> for MassMultiplier {
    fn from(raw: RawMultiplier) -> Self {
        match raw {
            RawMultiplier::Pair(pattern, multiplier) => Self { pattern, multiplier },
            RawMultiplier::Named { name, scale } => Self {
                pattern: name,
                multiplier: scale,
            },
        }
    }
}

impl From<MassMultiplier> for (String, f64) {
    fn from(m: MassMultiplier) -> Self {
        (m.pattern, m.multiplier)
    }
}

fn default_true() -> bool {
    true
}

/// Mass source definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassSource {
    pub name: String,
    #[serde(default = "default_true")]
    pub include_self_mass: bool,
    #[serde(default)]
    pub include_patterns: bool,
    #[serde(default)]
    pub load_patterns: Vec<MassMultiplier>,
}

impl MassSource {
    /// Self mass only
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            include_self_mass: true,
            include_patterns: false,
            load_patterns: Vec::new(),
        }
    }

    /// Add a pattern whose vertical loads become mass
    pub fn with_pattern(mut self, pattern: &str, multiplier: f64) -> Self {
        self.include_patterns = true;
        self.load_patterns.push(MassMultiplier {
            pattern: pattern.to_string(),
            multiplier,
        });
        self
    }

    pub fn without_self_mass(mut self) -> Self {
        self.include_self_mass = false;
        self
    }
}

impl Default for MassSource {
    fn default() -> Self {
        Self::new("Default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_forms() {
        let ms: MassSource = serde_json::from_str(
            r#"{"name": "MS1", "include_self_mass": true, "include_patterns": true,
                "load_patterns": [["LIVE", 0.3], {"name": "SDL", "scale": 1.0}]}"#,
        )
        .unwrap();
        assert_eq!(ms.load_patterns.len(), 2);
        assert_eq!(ms.load_patterns[0].pattern, "LIVE");
        assert_eq!(ms.load_patterns[0].multiplier, 0.3);
        assert_eq!(ms.load_patterns[1].pattern, "SDL");
    }

    #[test]
    fn test_default_is_self_mass_only() {
        let ms = MassSource::default();
        assert!(ms.include_self_mass);
        assert!(!ms.include_patterns);
    }
}
