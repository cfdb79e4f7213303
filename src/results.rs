//! Result types written by the solver
//!
//! Everything keyed by node or element id serializes as a JSON object with
//! string keys, e.g. `"displacements": {"1": [dx, dy, dz, rx, ry, rz]}`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::ElementMatrices;
use crate::error::{ErrorDetails, FrameResult, SolverError};

/// Six nodal components `[UX, UY, UZ, RX, RY, RZ]` or `[FX, FY, FZ, MX, MY, MZ]`
pub type NodeVector = [f64; 6];

/// Outcome of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    #[default]
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInfo {
    #[serde(rename = "type")]
    pub analysis_type: String,
    pub version: String,
    pub time_elapsed: String,
    pub dofs: usize,
    pub case_name: String,
}

/// Sum of support reactions (static) or combined base shear (RSA)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseReaction {
    #[serde(rename = "Fx")]
    pub fx: f64,
    #[serde(rename = "Fy")]
    pub fy: f64,
    #[serde(rename = "Fz")]
    pub fz: f64,
    #[serde(rename = "Mx")]
    pub mx: f64,
    #[serde(rename = "My")]
    pub my: f64,
    #[serde(rename = "Mz")]
    pub mz: f64,
}

impl BaseReaction {
    /// Create from array [FX, FY, FZ, MX, MY, MZ]
    pub fn from_array(arr: NodeVector) -> Self {
        Self {
            fx: arr[0],
            fy: arr[1],
            fz: arr[2],
            mx: arr[3],
            my: arr[4],
            mz: arr[5],
        }
    }

    pub fn as_array(&self) -> NodeVector {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }

    /// Get total force magnitude
    pub fn force_magnitude(&self) -> f64 {
        (self.fx.powi(2) + self.fy.powi(2) + self.fz.powi(2)).sqrt()
    }
}

/// End forces of a frame member in local axes
///
/// Components follow the member-end sign convention: positive along the
/// positive local axes at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberForces {
    pub i_end: NodeVector,
    pub j_end: NodeVector,
}

impl MemberForces {
    /// Split a local 12-component force vector into its two ends
    pub fn from_local(forces: &[f64]) -> Self {
        let mut i_end = [0.0; 6];
        let mut j_end = [0.0; 6];
        i_end.copy_from_slice(&forces[0..6]);
        j_end.copy_from_slice(&forces[6..12]);
        Self { i_end, j_end }
    }

    /// Axial force, positive in tension
    pub fn axial(&self) -> f64 {
        self.j_end[0]
    }
}

/// One row of the modal period table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    pub mode: usize,
    #[serde(rename = "T")]
    pub period: f64,
    #[serde(rename = "f")]
    pub frequency: f64,
    pub omega: f64,
    pub eigen: f64,
}

/// One row of the modal participating mass table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticipationRow {
    pub mode: usize,
    #[serde(rename = "Ux")]
    pub ux: f64,
    #[serde(rename = "SumUx")]
    pub sum_ux: f64,
    #[serde(rename = "Uy")]
    pub uy: f64,
    #[serde(rename = "SumUy")]
    pub sum_uy: f64,
    #[serde(rename = "Uz")]
    pub uz: f64,
    #[serde(rename = "SumUz")]
    pub sum_uz: f64,
    #[serde(rename = "Gamma_x")]
    pub gamma_x: f64,
    #[serde(rename = "Gamma_y")]
    pub gamma_y: f64,
    #[serde(rename = "Gamma_z")]
    pub gamma_z: f64,
}

impl ParticipationRow {
    /// Participating mass ratio along a global axis (0 = X)
    pub fn ratio(&self, axis: usize) -> f64 {
        [self.ux, self.uy, self.uz][axis]
    }

    pub fn gamma(&self, axis: usize) -> f64 {
        [self.gamma_x, self.gamma_y, self.gamma_z][axis]
    }

    pub fn cumulative(&self, axis: usize) -> f64 {
        [self.sum_ux, self.sum_uy, self.sum_uz][axis]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalTables {
    pub periods: Vec<PeriodRow>,
    pub participation_mass: Vec<ParticipationRow>,
}

/// Total translational mass on free DOFs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalMass {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl TotalMass {
    pub fn from_array(arr: [f64; 3]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
        }
    }

    pub fn along(&self, axis: usize) -> f64 {
        [self.x, self.y, self.z][axis]
    }
}

/// Per-mode response spectrum row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsaDetailRow {
    pub mode: usize,
    #[serde(rename = "T")]
    pub period: f64,
    #[serde(rename = "Damping")]
    pub damping: f64,
    /// Spectral acceleration in g
    #[serde(rename = "SaR_g")]
    pub sa_g: f64,
    /// Scaled spectral acceleration
    #[serde(rename = "SaR_ms2")]
    pub sa_ms2: f64,
    #[serde(rename = "Sd")]
    pub sd: f64,
    #[serde(rename = "Ratio")]
    pub ratio: f64,
    #[serde(rename = "V_coeff")]
    pub v_coeff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub label: String,
    pub value: f64,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsaInfo {
    #[serde(rename = "type")]
    pub info_type: String,
    pub method: String,
}

/// Per-element matrices exported for force recovery and debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementMatrixRecord {
    pub k: Vec<Vec<f64>>,
    pub t: Vec<Vec<f64>>,
    pub fef: Vec<f64>,
}

impl From<&ElementMatrices> for ElementMatrixRecord {
    fn from(m: &ElementMatrices) -> Self {
        let rows = |mat: &crate::math::Mat12| -> Vec<Vec<f64>> {
            (0..12).map(|i| (0..12).map(|j| mat[(i, j)]).collect()).collect()
        };
        Self {
            k: rows(&m.k_local),
            t: rows(&m.t_total),
            fef: m.fef_local.iter().copied().collect(),
        }
    }
}

/// Write the element matrix artifact `{element id: {k, t, fef}}`
pub fn write_matrices(matrices: &BTreeMap<u32, ElementMatrices>, path: impl AsRef<Path>) -> FrameResult<()> {
    let records: BTreeMap<u32, ElementMatrixRecord> = matrices.iter().map(|(&id, m)| (id, m.into())).collect();
    let json = serde_json::to_string_pretty(&records).map_err(|e| SolverError::WriteFailure(e.to_string()))?;
    std::fs::write(path.as_ref(), json)
        .map_err(|e| SolverError::WriteFailure(format!("{}: {}", path.as_ref().display(), e)))
}

/// Complete result payload of one run
///
/// Sections that do not apply to the analysis type are omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<AnalysisInfo>,

    // Static
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displacements: Option<BTreeMap<u32, NodeVector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<BTreeMap<u32, NodeVector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_reaction: Option<BaseReaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_forces: Option<BTreeMap<u32, MemberForces>>,

    // Modal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<ModalTables>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_shapes: Option<BTreeMap<String, BTreeMap<u32, NodeVector>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembled_mass: Option<BTreeMap<u32, NodeVector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_mass: Option<TotalMass>,

    // Response spectrum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsa_info: Option<RsaInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_shear_coeff: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsa_detailed: Option<BTreeMap<String, Vec<RsaDetailRow>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsa_summary: Option<Vec<SummaryItem>>,
}

impl AnalysisOutput {
    /// Empty successful output
    pub fn success() -> Self {
        Self::default()
    }

    /// FAILED output carrying the structured error and nothing else
    pub fn failed(error: &SolverError) -> Self {
        Self {
            status: AnalysisStatus::Failed,
            error: Some(error.details()),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AnalysisStatus::Success
    }

    /// Largest absolute displacement component
    pub fn max_displacement(&self) -> f64 {
        self.displacements
            .iter()
            .flat_map(|d| d.values())
            .flat_map(|v| v.iter())
            .fold(0.0_f64, |acc, x| acc.max(x.abs()))
    }

    pub fn to_json(&self) -> FrameResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SolverError::WriteFailure(e.to_string()))
    }

    /// Write the output JSON to a file
    pub fn write_json(&self, path: impl AsRef<Path>) -> FrameResult<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| SolverError::WriteFailure(format!("{}: {}", path.as_ref().display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_output_has_only_error() {
        let err = SolverError::LoadCaseNotFound("LIVE".into());
        let json = serde_json::to_value(AnalysisOutput::failed(&err)).unwrap();
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["error"]["code"], "E104");
        assert!(json.get("displacements").is_none());
        assert!(json.get("info").is_none());
    }

    #[test]
    fn test_node_keys_serialize_as_strings() {
        let mut output = AnalysisOutput::success();
        let mut disp = BTreeMap::new();
        disp.insert(3, [0.0, 0.0, -0.5, 0.0, 0.0, 0.0]);
        output.displacements = Some(disp);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["displacements"]["3"][2], -0.5);
        assert_eq!(output.max_displacement(), 0.5);
    }

    #[test]
    fn test_table_field_names() {
        let row = PeriodRow {
            mode: 1,
            period: 0.5,
            frequency: 2.0,
            omega: 12.566,
            eigen: 157.9,
        };
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["T"], 0.5);
        assert_eq!(json["f"], 2.0);

        let reaction = BaseReaction::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let json = serde_json::to_value(reaction).unwrap();
        assert_eq!(json["Fz"], 3.0);
        assert_eq!(json["Mz"], 6.0);
    }
}
