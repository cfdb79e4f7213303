//! Response spectrum analysis
//!
//! Each excitation direction reads spectral ordinates at the modal periods,
//! combines the modal responses (CQC or SRSS) and the directions are then
//! combined with SRSS or an absolute sum.

use std::collections::BTreeMap;

use log::{debug, info};
use nalgebra::{DMatrix, DVector};

use super::data_manager::DataManager;
use super::modal::ModalResults;
use super::spectrum::SpectrumGenerator;
use super::AnalysisOptions;
use crate::error::{FrameResult, SolverError};
use crate::loads::{DirectionalCombination, ExcitationDirection, LoadCase, ModalCombination, RsaLoad};
use crate::results::{AnalysisOutput, BaseReaction, NodeVector, RsaDetailRow, RsaInfo, SummaryItem};

/// CQC cross-modal correlation coefficient
pub fn cqc_rho(omega_i: f64, omega_j: f64, zeta: f64) -> f64 {
    if omega_i == 0.0 || omega_j == 0.0 {
        return if omega_i == omega_j { 1.0 } else { 0.0 };
    }
    let r = omega_i / omega_j;
    let num = 8.0 * zeta * zeta * (1.0 + r) * r.powf(1.5);
    let den = (1.0 - r * r).powi(2) + 4.0 * zeta * zeta * r * (1.0 + r).powi(2);
    if den == 0.0 {
        1.0
    } else {
        num / den
    }
}

fn correlation_matrix(omegas: &[f64], zeta: f64) -> DMatrix<f64> {
    let n = omegas.len();
    DMatrix::from_fn(n, n, |i, j| cqc_rho(omegas[i], omegas[j], zeta))
}

fn combine_correlated(values: &[f64], rho: &DMatrix<f64>) -> f64 {
    let mut total = 0.0;
    for (i, vi) in values.iter().enumerate() {
        for (j, vj) in values.iter().enumerate() {
            total += vi * rho[(i, j)] * vj;
        }
    }
    total.abs().sqrt()
}

fn srss(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Combine peak modal responses
pub fn combine_modal(values: &[f64], omegas: &[f64], zeta: f64, rule: ModalCombination) -> f64 {
    match rule {
        ModalCombination::CQC => combine_correlated(values, &correlation_matrix(omegas, zeta)),
        ModalCombination::SRSS => srss(values),
    }
}

/// Combine responses to different excitation directions
pub fn combine_directional(values: &[f64], rule: DirectionalCombination) -> f64 {
    match rule {
        DirectionalCombination::SRSS => srss(values),
        DirectionalCombination::Absolute => values.iter().map(|v| v.abs()).sum(),
    }
}

/// Combined response to one spectrum excitation
#[derive(Debug, Clone)]
pub struct DirectionResponse {
    pub direction: ExcitationDirection,
    pub rows: Vec<RsaDetailRow>,
    /// Base shear over total weight
    pub base_shear_coeff: f64,
    /// Base shear force along X, Y, Z
    pub base_shear: [f64; 3],
    /// Peak displacement over all global DOFs
    pub displacements: DVector<f64>,
}

/// Directionally combined spectrum results
#[derive(Debug, Clone)]
pub struct RsaResults {
    pub method: DirectionalCombination,
    pub directions: Vec<DirectionResponse>,
    pub base_shear_coeff: f64,
    pub base_reaction: BaseReaction,
    pub displacements: BTreeMap<u32, NodeVector>,
}

impl RsaResults {
    fn method_label(&self) -> &'static str {
        match self.method {
            DirectionalCombination::SRSS => "SRSS",
            DirectionalCombination::Absolute => "ABS",
        }
    }

    /// Add the spectrum sections to an output that already holds the modal results
    pub fn apply_to(&self, output: &mut AnalysisOutput) {
        output.rsa_info = Some(RsaInfo {
            info_type: "Response Spectrum Combined".to_string(),
            method: self.method_label().to_string(),
        });
        output.base_shear_coeff = Some(self.base_shear_coeff);
        output.base_reaction = Some(self.base_reaction);
        output.displacements = Some(self.displacements.clone());
        output.rsa_detailed = Some(
            self.directions
                .iter()
                .map(|d| (d.direction.label().to_string(), d.rows.clone()))
                .collect(),
        );
        output.rsa_summary = Some(
            self.directions
                .iter()
                .map(|d| SummaryItem {
                    label: format!("Base Shear Coeff ({})", d.direction.label()),
                    value: d.base_shear_coeff,
                    desc: format!("V / W_total ({})", d.direction.label()),
                })
                .collect(),
        );
    }
}

/// Runs a response spectrum case on top of a modal solution
pub struct RsaEngine<'a> {
    dm: &'a DataManager<'a>,
    modal: &'a ModalResults,
    options: &'a AnalysisOptions,
}

impl<'a> RsaEngine<'a> {
    pub fn new(dm: &'a DataManager<'a>, modal: &'a ModalResults, options: &'a AnalysisOptions) -> Self {
        Self { dm, modal, options }
    }

    /// Run every excitation of the case and combine the directions
    pub fn run(&self, case: &LoadCase) -> FrameResult<RsaResults> {
        if case.rsa_loads.is_empty() {
            return Err(SolverError::NoSpectrumLoads(case.name.clone()));
        }

        let directions = case
            .rsa_loads
            .iter()
            .map(|load| self.run_direction(load, case.modal_comb))
            .collect::<FrameResult<Vec<_>>>()?;

        let method = case.dir_comb;
        let coeffs: Vec<f64> = directions.iter().map(|d| d.base_shear_coeff).collect();
        let mut reaction = [0.0; 6];
        for (axis, item) in reaction.iter_mut().take(3).enumerate() {
            let forces: Vec<f64> = directions.iter().map(|d| d.base_shear[axis]).collect();
            *item = combine_directional(&forces, method);
        }

        let n = self.dm.total_dofs();
        let mut combined = DVector::zeros(n);
        let mut per_direction = vec![0.0; directions.len()];
        for dof in 0..n {
            for (k, d) in directions.iter().enumerate() {
                per_direction[k] = d.displacements[dof];
            }
            combined[dof] = combine_directional(&per_direction, method);
        }

        Ok(RsaResults {
            method,
            base_shear_coeff: combine_directional(&coeffs, method),
            base_reaction: BaseReaction::from_array(reaction),
            displacements: self.dm.node_vectors(&combined),
            directions,
        })
    }

    /// Modal responses to one excitation, combined over modes
    pub fn run_direction(&self, load: &RsaLoad, rule: ModalCombination) -> FrameResult<DirectionResponse> {
        let function = self
            .dm
            .model()
            .function(load.function())
            .ok_or_else(|| SolverError::FunctionNotFound(load.function().to_string()))?;
        let spectrum = SpectrumGenerator::new(function, self.options.spectrum_t_max);
        let direction = load.direction();
        let axis = direction.axis();
        let zeta = function.damping;
        info!(
            "RSA: {} direction, function '{}' (R = {}, I = {}), {:?} combination",
            direction.label(),
            function.name,
            function.r,
            function.i,
            rule
        );

        // Excitation scale relative to one g; a non-positive scale means one g
        let g = self.options.rsa_gravity;
        let factor = if load.scale() > 0.0 { load.scale() / g } else { 1.0 };

        let modes = &self.modal.modes;
        let mut rows = Vec::with_capacity(modes.len());
        let mut coefficients = Vec::with_capacity(modes.len());
        let mut omegas = Vec::with_capacity(modes.len());
        let mut shapes: Vec<DVector<f64>> = Vec::with_capacity(modes.len());

        for mode in modes {
            let sa_g = spectrum.spectral_acceleration(mode.period);
            let accel = sa_g * factor * g;
            let sd = if mode.omega > 0.0 {
                accel / (mode.omega * mode.omega)
            } else {
                0.0
            };
            let ratio = mode.ratio[axis];
            let v_coeff = sa_g * factor * ratio;

            debug!(
                "RSA mode {}: T = {:.4}, Sa = {:.4} g, ratio = {:.4}, V/W = {:.5}",
                mode.mode, mode.period, sa_g, ratio, v_coeff
            );

            rows.push(RsaDetailRow {
                mode: mode.mode,
                period: mode.period,
                damping: zeta,
                sa_g,
                sa_ms2: accel,
                sd,
                ratio,
                v_coeff,
            });
            coefficients.push(v_coeff);
            omegas.push(mode.omega);
            shapes.push(&mode.shape * (mode.gamma[axis] * sd));
        }

        let rho = match rule {
            ModalCombination::CQC => Some(correlation_matrix(&omegas, zeta)),
            ModalCombination::SRSS => None,
        };
        let combine = |values: &[f64]| match &rho {
            Some(rho) => combine_correlated(values, rho),
            None => srss(values),
        };

        let base_shear_coeff = combine(&coefficients);
        let n = self.dm.total_dofs();
        let mut displacements = DVector::zeros(n);
        let mut per_mode = vec![0.0; shapes.len()];
        for dof in 0..n {
            for (k, shape) in shapes.iter().enumerate() {
                per_mode[k] = shape[dof];
            }
            displacements[dof] = combine(&per_mode);
        }

        let weight = self.modal.total_mass[axis] * g;
        let mut base_shear = [0.0; 3];
        base_shear[axis] = base_shear_coeff * weight;

        Ok(DirectionResponse {
            direction,
            rows,
            base_shear_coeff,
            base_shear,
            displacements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rho_equal_frequencies() {
        assert_relative_eq!(cqc_rho(10.0, 10.0, 0.05), 1.0, max_relative = 1e-12);
        assert_eq!(cqc_rho(0.0, 0.0, 0.05), 1.0);
        assert_eq!(cqc_rho(0.0, 5.0, 0.05), 0.0);
        // Undamped distinct modes are uncorrelated
        assert_eq!(cqc_rho(10.0, 20.0, 0.0), 0.0);
    }

    #[test]
    fn test_rho_is_symmetric_and_bounded() {
        for &(a, b) in &[(3.0, 4.0), (10.0, 11.0), (1.0, 30.0)] {
            let r1 = cqc_rho(a, b, 0.05);
            let r2 = cqc_rho(b, a, 0.05);
            assert_relative_eq!(r1, r2, max_relative = 1e-10);
            assert!(r1 > 0.0 && r1 < 1.0);
        }
    }

    #[test]
    fn test_cqc_approaches_srss_for_separated_modes() {
        let values = [3.0, -2.0, 1.0];
        let omegas = [2.0, 20.0, 200.0];
        let cqc = combine_modal(&values, &omegas, 0.05, ModalCombination::CQC);
        let srss = combine_modal(&values, &omegas, 0.05, ModalCombination::SRSS);
        assert_relative_eq!(srss, 14f64.sqrt(), max_relative = 1e-12);
        assert!((cqc - srss).abs() / srss < 1e-2);
    }

    #[test]
    fn test_cqc_closely_spaced_modes_add() {
        let values = [1.0, 1.0];
        let omegas = [10.0, 10.0];
        let cqc = combine_modal(&values, &omegas, 0.05, ModalCombination::CQC);
        assert_relative_eq!(cqc, 2.0, max_relative = 1e-12);
    }

    #[test]
    fn test_directional_combination() {
        assert_relative_eq!(combine_directional(&[3.0, 4.0], DirectionalCombination::SRSS), 5.0);
        assert_relative_eq!(combine_directional(&[3.0, -4.0], DirectionalCombination::Absolute), 7.0);
    }
}
