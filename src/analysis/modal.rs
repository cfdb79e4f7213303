//! Modal analysis: natural periods, mode shapes and participating mass
//!
//! Solves `K φ = λ M φ` on the free DOFs with a shift-invert transform and
//! mass-normalizes every mode.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use log::{debug, info, warn};
use nalgebra::{Cholesky, DMatrix, DVector, SymmetricEigen};
use nalgebra_sparse::CsrMatrix;

use super::assembler::GlobalAssembler;
use super::data_manager::DataManager;
use super::mass::{GlobalMassAssembler, MassMatrix};
use super::AnalysisOptions;
use crate::error::{FrameResult, SolverError};
use crate::math::sparse::{csr_to_dense, submatrix};
use crate::results::{AnalysisOutput, ModalTables, NodeVector, ParticipationRow, PeriodRow, TotalMass};

/// Eigenvalues (ascending) with their eigenvectors as columns
#[derive(Debug, Clone)]
pub struct EigenPairs {
    pub values: Vec<f64>,
    pub vectors: DMatrix<f64>,
}

/// Generalized symmetric eigen solver for `K φ = λ M φ` with diagonal M
pub trait EigenSolver {
    /// Lowest `n_modes` pairs closest to `shift` from above
    fn solve(&self, k_ff: &CsrMatrix<f64>, m_ff: &DVector<f64>, n_modes: usize, shift: f64) -> FrameResult<EigenPairs>;
}

/// Dense shift-invert solver
///
/// Factors `K − σM = L Lᵀ` and solves the standard symmetric problem
/// `L⁻¹ M L⁻ᵀ y = μ y`; then `λ = σ + 1/μ` and `φ = L⁻ᵀ y`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseShiftInvert;

impl EigenSolver for DenseShiftInvert {
    fn solve(&self, k_ff: &CsrMatrix<f64>, m_ff: &DVector<f64>, n_modes: usize, shift: f64) -> FrameResult<EigenPairs> {
        let n = m_ff.len();
        let mut a = csr_to_dense(k_ff);
        for i in 0..n {
            a[(i, i)] -= shift * m_ff[i];
        }

        let chol = Cholesky::new(a).ok_or_else(|| {
            SolverError::EigenFailure(format!(
                "K - ({})M is not positive definite; the structure may be unstable or disconnected",
                shift
            ))
        })?;
        let l = chol.l();

        // C = (L⁻¹ M^½)(L⁻¹ M^½)ᵀ stays symmetric by construction
        let sqrt_m = DMatrix::from_diagonal(&m_ff.map(|m| m.max(0.0).sqrt()));
        let y = l
            .solve_lower_triangular(&sqrt_m)
            .ok_or_else(|| SolverError::EigenFailure("triangular solve failed".into()))?;
        let c = &y * y.transpose();

        let eigen = SymmetricEigen::new(c);
        let mu_max = eigen.eigenvalues.amax();
        if mu_max <= 0.0 || !mu_max.is_finite() {
            return Err(SolverError::EigenFailure("mass matrix has no positive entries".into()));
        }

        let mut pairs: Vec<(f64, usize)> = eigen
            .eigenvalues
            .iter()
            .enumerate()
            .filter(|&(_, &mu)| mu > mu_max * 1e-12)
            .map(|(i, &mu)| (shift + 1.0 / mu, i))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        pairs.truncate(n_modes);

        if pairs.is_empty() {
            return Err(SolverError::EigenFailure("no modes with mass participation".into()));
        }

        let mut values = Vec::with_capacity(pairs.len());
        let mut vectors = DMatrix::zeros(n, pairs.len());
        for (col, &(lambda, idx)) in pairs.iter().enumerate() {
            let phi = l
                .tr_solve_lower_triangular(&eigen.eigenvectors.column(idx).into_owned())
                .ok_or_else(|| SolverError::EigenFailure("back substitution failed".into()))?;
            values.push(lambda);
            vectors.set_column(col, &phi);
        }

        Ok(EigenPairs { values, vectors })
    }
}

/// One mass-normalized mode
#[derive(Debug, Clone)]
pub struct ModeResult {
    pub mode: usize,
    pub eigenvalue: f64,
    pub omega: f64,
    pub frequency: f64,
    pub period: f64,
    /// Mode shape over all global DOFs, zero at restraints
    pub shape: DVector<f64>,
    /// Participating mass ratio along X, Y, Z
    pub ratio: [f64; 3],
    /// Normalized participation factor along X, Y, Z
    pub gamma: [f64; 3],
}

/// Modes and mass data of a modal run
#[derive(Debug, Clone)]
pub struct ModalResults {
    pub modes: Vec<ModeResult>,
    pub mass: MassMatrix,
    /// Translational mass on free DOFs along X, Y, Z
    pub total_mass: [f64; 3],
}

impl ModalResults {
    pub fn num_modes(&self) -> usize {
        self.modes.len()
    }

    pub fn period_rows(&self) -> Vec<PeriodRow> {
        self.modes
            .iter()
            .map(|m| PeriodRow {
                mode: m.mode,
                period: m.period,
                frequency: m.frequency,
                omega: m.omega,
                eigen: m.eigenvalue,
            })
            .collect()
    }

    /// Participation table with running sums in mode order
    pub fn participation_rows(&self) -> Vec<ParticipationRow> {
        let mut sums = [0.0; 3];
        self.modes
            .iter()
            .map(|m| {
                for d in 0..3 {
                    sums[d] += m.ratio[d];
                }
                ParticipationRow {
                    mode: m.mode,
                    ux: m.ratio[0],
                    sum_ux: sums[0],
                    uy: m.ratio[1],
                    sum_uy: sums[1],
                    uz: m.ratio[2],
                    sum_uz: sums[2],
                    gamma_x: m.gamma[0],
                    gamma_y: m.gamma[1],
                    gamma_z: m.gamma[2],
                }
            })
            .collect()
    }

    /// Mode shapes keyed `"Mode N"` then node id
    pub fn mode_shapes(&self, dm: &DataManager) -> BTreeMap<String, BTreeMap<u32, NodeVector>> {
        self.modes
            .iter()
            .map(|m| (format!("Mode {}", m.mode), dm.node_vectors(&m.shape)))
            .collect()
    }

    /// Tables, mode shapes and masses as a result payload
    pub fn to_output(&self, dm: &DataManager) -> AnalysisOutput {
        AnalysisOutput {
            tables: Some(ModalTables {
                periods: self.period_rows(),
                participation_mass: self.participation_rows(),
            }),
            mode_shapes: Some(self.mode_shapes(dm)),
            assembled_mass: Some(self.mass.node_masses(dm)),
            total_mass: Some(TotalMass::from_array(self.total_mass)),
            ..AnalysisOutput::success()
        }
    }
}

/// Runs the eigen analysis for a model
pub struct ModalEngine<'a> {
    dm: &'a DataManager<'a>,
    options: &'a AnalysisOptions,
}

impl<'a> ModalEngine<'a> {
    pub fn new(dm: &'a DataManager<'a>, options: &'a AnalysisOptions) -> Self {
        Self { dm, options }
    }

    /// Extract modes with the dense shift-invert solver
    pub fn run(&self, num_modes: usize, mass_source: &str) -> FrameResult<ModalResults> {
        self.run_with(&DenseShiftInvert, num_modes, mass_source)
    }

    pub fn run_with(&self, solver: &dyn EigenSolver, num_modes: usize, mass_source: &str) -> FrameResult<ModalResults> {
        let (k, _) = GlobalAssembler::new(self.dm, self.options).assemble_stiffness()?;
        let mass = GlobalMassAssembler::new(self.dm, self.options).build(mass_source);

        let free = self.dm.free_dofs();
        let free_indices: Vec<usize> = (0..free.len()).filter(|&i| free[i]).collect();
        let n_free = free_indices.len();
        info!("Modal: {} free DOFs", n_free);
        if n_free == 0 {
            return Err(SolverError::EigenFailure("structure is fully restrained".into()));
        }

        let limit = n_free.saturating_sub(2).max(1);
        let mut n_modes = num_modes;
        if n_modes > limit {
            warn!("Requested {} modes, system has {} free DOFs; reducing to {}", num_modes, n_free, limit);
            n_modes = limit;
        }
        if n_modes == 0 {
            return Err(SolverError::EigenFailure("zero modes requested".into()));
        }

        let mut map = vec![None; free.len()];
        for (reduced, &global) in free_indices.iter().enumerate() {
            map[global] = Some(reduced);
        }
        let k_ff = submatrix(&k, &map, n_free);
        let m_ff = mass.reduced(&free_indices);

        let pairs = solver.solve(&k_ff, &m_ff, n_modes, self.options.eigen_shift)?;
        info!("Modal: converged, {} modes", pairs.values.len());

        let total_mass = mass.total_free_mass(&free);
        let modes = pairs
            .values
            .iter()
            .enumerate()
            .map(|(i, &lambda)| {
                let phi = pairs.vectors.column(i).into_owned();
                self.build_mode(i + 1, lambda, phi, &m_ff, &free_indices, total_mass)
            })
            .collect();

        Ok(ModalResults {
            modes,
            mass,
            total_mass,
        })
    }

    fn build_mode(
        &self,
        mode: usize,
        lambda: f64,
        mut phi: DVector<f64>,
        m_ff: &DVector<f64>,
        free_indices: &[usize],
        total_mass: [f64; 3],
    ) -> ModeResult {
        let generalized = |phi: &DVector<f64>| phi.iter().zip(m_ff.iter()).map(|(p, m)| m * p * p).sum::<f64>();

        let raw = generalized(&phi);
        if raw > 0.0 {
            phi /= raw.sqrt();
        }
        let mut mn = generalized(&phi);
        if mn == 0.0 {
            mn = 1.0;
        }

        let (omega, frequency, period) = if lambda < self.options.zero_eigenvalue {
            (0.0, 0.0, self.options.sentinel_period)
        } else {
            let omega = lambda.sqrt();
            let f = omega / (2.0 * PI);
            (omega, f, 1.0 / f)
        };

        let mut ratio = [0.0; 3];
        let mut gamma = [0.0; 3];
        for d in 0..3 {
            let l_d: f64 = free_indices
                .iter()
                .enumerate()
                .filter(|&(_, &global)| global % 6 == d)
                .map(|(reduced, _)| m_ff[reduced] * phi[reduced])
                .sum();
            if total_mass[d] > 0.0 {
                ratio[d] = l_d * l_d / mn / total_mass[d];
                gamma[d] = l_d / (total_mass[d] * mn).sqrt();
            }
        }
        debug!(
            "Mode {}: T = {:.4}, ratios = {:.4?}, gamma = {:.4?}",
            mode, period, ratio, gamma
        );

        let mut shape = DVector::zeros(self.dm.total_dofs());
        for (reduced, &global) in free_indices.iter().enumerate() {
            shape[global] = phi[reduced];
        }

        ModeResult {
            mode,
            eigenvalue: lambda,
            omega,
            frequency,
            period,
            shape,
            ratio,
            gamma,
        }
    }
}
