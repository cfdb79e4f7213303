//! Load cases

use serde::{Deserialize, Serialize};

/// Analysis type of a load case
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadCaseType {
    #[default]
    #[serde(rename = "Linear Static")]
    LinearStatic,
    #[serde(rename = "Modal")]
    Modal,
    #[serde(rename = "Response Spectrum")]
    ResponseSpectrum,
    /// Any other case type (nonlinear, time history, ...)
    #[serde(other)]
    Unsupported,
}

/// Rule for combining modal responses
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalCombination {
    #[serde(alias = "cqc")]
    CQC,
    #[default]
    #[serde(alias = "srss")]
    SRSS,
}

/// Rule for combining excitation directions
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionalCombination {
    #[default]
    #[serde(alias = "srss")]
    SRSS,
    #[serde(alias = "ABS", alias = "Abs", alias = "absolute")]
    Absolute,
}

/// Ground excitation direction of a spectrum load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExcitationDirection {
    #[serde(alias = "X")]
    U1,
    #[serde(alias = "Y")]
    U2,
    #[serde(alias = "Z")]
    U3,
}

impl ExcitationDirection {
    /// Global translational axis index (0 = X, 1 = Y, 2 = Z)
    pub fn axis(&self) -> usize {
        match self {
            ExcitationDirection::U1 => 0,
            ExcitationDirection::U2 => 1,
            ExcitationDirection::U3 => 2,
        }
    }

    /// Global axis label
    pub fn label(&self) -> &'static str {
        match self {
            ExcitationDirection::U1 => "X",
            ExcitationDirection::U2 => "Y",
            ExcitationDirection::U3 => "Z",
        }
    }
}

/// One spectrum excitation: (direction, function name, scale factor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsaLoad(pub ExcitationDirection, pub String, pub f64);

impl RsaLoad {
    pub fn direction(&self) -> ExcitationDirection {
        self.0
    }

    pub fn function(&self) -> &str {
        &self.1
    }

    pub fn scale(&self) -> f64 {
        self.2
    }
}

fn default_mass_source() -> String {
    "Default".to_string()
}

fn default_num_modes() -> usize {
    12
}

/// A load case: a scaled set of load patterns plus analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCase {
    /// Name of the load case
    pub name: String,
    #[serde(rename = "type", default)]
    pub case_type: LoadCaseType,
    /// Active patterns and their scale factors
    #[serde(default)]
    pub loads: Vec<(String, f64)>,
    #[serde(default = "default_mass_source")]
    pub mass_source: String,
    #[serde(default = "default_num_modes")]
    pub num_modes: usize,
    #[serde(default)]
    pub rsa_loads: Vec<RsaLoad>,
    #[serde(default)]
    pub modal_comb: ModalCombination,
    #[serde(default)]
    pub dir_comb: DirectionalCombination,
    /// Geometric nonlinearity request; not supported
    #[serde(default)]
    pub p_delta: bool,
    /// Modal case supplying the mode shapes of a spectrum case
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modal_case: Option<String>,
}

impl LoadCase {
    /// Create a new linear static load case
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            case_type: LoadCaseType::LinearStatic,
            loads: Vec::new(),
            mass_source: default_mass_source(),
            num_modes: default_num_modes(),
            rsa_loads: Vec::new(),
            modal_comb: ModalCombination::default(),
            dir_comb: DirectionalCombination::default(),
            p_delta: false,
            modal_case: None,
        }
    }

    /// Linear static case applying a single pattern at unit scale
    pub fn linear_static(name: &str, pattern: &str) -> Self {
        Self::new(name).with_pattern(pattern, 1.0)
    }

    /// Modal case
    pub fn modal(name: &str, num_modes: usize) -> Self {
        Self {
            case_type: LoadCaseType::Modal,
            num_modes,
            ..Self::new(name)
        }
    }

    /// Response spectrum case
    pub fn response_spectrum(name: &str, modal_comb: ModalCombination, dir_comb: DirectionalCombination) -> Self {
        Self {
            case_type: LoadCaseType::ResponseSpectrum,
            modal_comb,
            dir_comb,
            ..Self::new(name)
        }
    }

    /// Add a pattern with a scale factor
    pub fn with_pattern(mut self, pattern: &str, scale: f64) -> Self {
        self.loads.push((pattern.to_string(), scale));
        self
    }

    /// Add a spectrum excitation
    pub fn with_rsa_load(mut self, direction: ExcitationDirection, function: &str, scale: f64) -> Self {
        self.rsa_loads.push(RsaLoad(direction, function.to_string(), scale));
        self
    }

    pub fn with_mass_source(mut self, mass_source: &str) -> Self {
        self.mass_source = mass_source.to_string();
        self
    }

    /// Scale factor of a pattern in this case, if active
    ///
    /// A pattern listed more than once takes its last scale.
    pub fn pattern_scale(&self, pattern: &str) -> Option<f64> {
        self.loads.iter().rev().find(|(name, _)| name == pattern).map(|(_, s)| *s)
    }
}

impl Default for LoadCase {
    fn default() -> Self {
        Self::linear_static("DEAD", "DEAD")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spectrum_case() {
        let case: LoadCase = serde_json::from_str(
            r#"{"name": "RSX", "type": "Response Spectrum", "loads": [],
                "rsa_loads": [["U1", "TSC-X", 9.81], ["U2", "TSC-Y", 0.0]],
                "modal_comb": "CQC", "dir_comb": "Absolute"}"#,
        )
        .unwrap();
        assert_eq!(case.case_type, LoadCaseType::ResponseSpectrum);
        assert_eq!(case.rsa_loads.len(), 2);
        assert_eq!(case.rsa_loads[0].direction(), ExcitationDirection::U1);
        assert_eq!(case.rsa_loads[1].function(), "TSC-Y");
        assert_eq!(case.modal_comb, ModalCombination::CQC);
        assert_eq!(case.dir_comb, DirectionalCombination::Absolute);
        assert_eq!(case.mass_source, "Default");
        assert_eq!(case.num_modes, 12);
    }

    #[test]
    fn test_unknown_case_type_is_unsupported() {
        let case: LoadCase = serde_json::from_str(r#"{"name": "TH", "type": "Time History"}"#).unwrap();
        assert_eq!(case.case_type, LoadCaseType::Unsupported);
    }

    #[test]
    fn test_pattern_scale() {
        let case = LoadCase::new("COMB").with_pattern("DEAD", 1.4).with_pattern("LIVE", 1.6);
        assert_eq!(case.pattern_scale("LIVE"), Some(1.6));
        assert_eq!(case.pattern_scale("WIND"), None);

        let repeated = case.with_pattern("DEAD", 1.2);
        assert_eq!(repeated.pattern_scale("DEAD"), Some(1.2));
    }
}
