//! Section properties for frame elements

use serde::{Deserialize, Serialize};

/// Numeric cross-section properties in the element's local axes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SectionProperties {
    /// Cross-sectional area
    #[serde(rename = "A", default)]
    pub a: f64,
    /// Torsional constant
    #[serde(rename = "J", default)]
    pub j: f64,
    /// Moment of inertia about local axis 3 (strong axis)
    #[serde(rename = "I33", default)]
    pub i33: f64,
    /// Moment of inertia about local axis 2 (weak axis)
    #[serde(rename = "I22", default)]
    pub i22: f64,
    /// Effective shear area along local axis 2 (0 = no shear deformation)
    #[serde(rename = "As2", default)]
    pub as2: f64,
    /// Effective shear area along local axis 3 (0 = no shear deformation)
    #[serde(rename = "As3", default)]
    pub as3: f64,
}

/// Named cross-section bound to a material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    /// Name of the material
    pub mat_name: String,
    pub properties: SectionProperties,
}

impl Section {
    /// Create a section from explicit properties
    pub fn new(name: &str, mat_name: &str, properties: SectionProperties) -> Self {
        Self {
            name: name.to_string(),
            mat_name: mat_name.to_string(),
            properties,
        }
    }

    /// Solid rectangle of width `b` (along local 2) and depth `h` (along local 3)
    pub fn rectangular(name: &str, mat_name: &str, b: f64, h: f64) -> Self {
        let a = b * h;
        let (long, short) = if b > h { (b, h) } else { (h, b) };
        let j = long * short.powi(3) * (1.0 / 3.0 - 0.21 * short / long * (1.0 - short.powi(4) / (12.0 * long.powi(4))));

        Self::new(
            name,
            mat_name,
            SectionProperties {
                a,
                j,
                i33: b.powi(3) * h / 12.0,
                i22: b * h.powi(3) / 12.0,
                as2: 5.0 / 6.0 * a,
                as3: 5.0 / 6.0 * a,
            },
        )
    }
}

impl SectionProperties {
    /// Drop shear deformation (Euler-Bernoulli behaviour)
    pub fn without_shear_deformation(mut self) -> Self {
        self.as2 = 0.0;
        self.as3 = 0.0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_section() {
        let sec = Section::rectangular("R", "C30", 0.3, 0.5);
        assert!((sec.properties.a - 0.15).abs() < 1e-12);
        assert!((sec.properties.i22 - 0.3 * 0.125 / 12.0).abs() < 1e-12);
        assert!(sec.properties.i33 < sec.properties.i22);
        assert!(sec.properties.j > 0.0);
    }

    #[test]
    fn test_missing_properties_default_to_zero() {
        let sec: Section =
            serde_json::from_str(r#"{"name": "S", "mat_name": "M", "properties": {"A": 0.01}}"#).unwrap();
        assert_eq!(sec.properties.as2, 0.0);
        assert_eq!(sec.properties.i33, 0.0);
    }
}
