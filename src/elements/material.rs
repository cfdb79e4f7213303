//! Material properties

use serde::{Deserialize, Serialize};

/// Material properties for structural analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// Material name referenced by sections
    pub name: String,
    /// Modulus of elasticity
    #[serde(rename = "E")]
    pub e: f64,
    /// Poisson's ratio
    #[serde(default)]
    pub nu: f64,
    /// Shear modulus (derived from E and nu when absent)
    #[serde(rename = "G", default)]
    pub g: Option<f64>,
    /// Unit weight (force per unit volume)
    pub rho: f64,
    /// Material family ("Steel", "Concrete", ...)
    #[serde(rename = "type", default)]
    pub mat_type: String,
    /// Yield strength (reporting only)
    #[serde(default)]
    pub fy: f64,
    /// Ultimate strength (reporting only)
    #[serde(default)]
    pub fu: f64,
}

impl Material {
    /// Create an isotropic material from E, nu and unit weight
    pub fn isotropic(name: &str, e: f64, nu: f64, rho: f64) -> Self {
        Self {
            name: name.to_string(),
            e,
            nu,
            g: None,
            rho,
            mat_type: String::new(),
            fy: 0.0,
            fu: 0.0,
        }
    }

    /// Structural steel with unit weight in N/m³
    pub fn steel(name: &str) -> Self {
        Self {
            mat_type: "Steel".to_string(),
            fy: 355e6,
            fu: 510e6,
            ..Self::isotropic(name, 2.0e11, 0.3, 76_980.0)
        }
    }

    /// Shear modulus, G = E / (2 * (1 + nu)) unless given explicitly
    pub fn shear_modulus(&self) -> f64 {
        match self.g {
            Some(g) if g > 0.0 => g,
            _ => self.e / (2.0 * (1.0 + self.nu)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_shear_modulus() {
        let mat = Material::isotropic("S", 200e9, 0.3, 78_500.0);
        let expected_g = 200e9 / (2.0 * 1.3);
        assert!((mat.shear_modulus() - expected_g).abs() < 1.0);
    }

    #[test]
    fn test_explicit_shear_modulus_wins() {
        let mat: Material = serde_json::from_str(
            r#"{"name": "C30", "E": 3.2e10, "nu": 0.2, "G": 1.0e10, "rho": 25000.0, "type": "Concrete"}"#,
        )
        .unwrap();
        assert_eq!(mat.shear_modulus(), 1.0e10);
        assert_eq!(mat.mat_type, "Concrete");
    }
}
