//! Linear static solver
//!
//! Partitions the global system into free and restrained DOFs, solves
//! `K_ff · U_f = P_f` and recovers reactions from the full stiffness matrix.

use log::{debug, info, warn};
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use thiserror::Error;

use super::assembler::GlobalSystem;
use super::data_manager::DataManager;
use super::AnalysisOptions;
use crate::error::{FrameResult, SolverError};
use crate::math::sparse::{submatrix, PivotFailure};
use crate::math::{csr_matvec, SparseCholeskySolver};
use crate::results::{AnalysisOutput, BaseReaction};

const DOF_LABELS: [&str; 6] = ["UX", "UY", "UZ", "RX", "RY", "RZ"];

/// Direct solver for the reduced stiffness system
pub trait LinearSolve {
    /// Solve `K_ff · x = p_f`
    fn solve(&self, k_ff: &CsrMatrix<f64>, p_f: &DVector<f64>) -> Result<DVector<f64>, LinearSolveError>;
}

/// Failure of a direct solve
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LinearSolveError {
    /// Factorization broke down at a reduced equation
    #[error(transparent)]
    Pivot(#[from] PivotFailure),
    #[error("solution contains non-finite values")]
    NonFinite,
}

/// Skyline Cholesky factorization
#[derive(Debug, Clone, Copy)]
pub struct SkylineCholesky {
    pub pivot_tolerance: f64,
}

impl Default for SkylineCholesky {
    fn default() -> Self {
        Self { pivot_tolerance: 1e-10 }
    }
}

impl LinearSolve for SkylineCholesky {
    fn solve(&self, k_ff: &CsrMatrix<f64>, p_f: &DVector<f64>) -> Result<DVector<f64>, LinearSolveError> {
        let mut solver = SparseCholeskySolver::new(k_ff).with_tolerance(self.pivot_tolerance);
        debug!("Skyline profile: {} stored entries", solver.profile());
        solver.factorize()?;
        let x = solver.solve(p_f);
        if x.iter().all(|v| v.is_finite()) {
            Ok(x)
        } else {
            Err(LinearSolveError::NonFinite)
        }
    }
}

/// Displacements and reactions over all global DOFs
#[derive(Debug, Clone)]
pub struct StaticSolution {
    pub displacements: DVector<f64>,
    /// `K·U − P`, zero on free DOFs
    pub reactions: DVector<f64>,
}

impl StaticSolution {
    /// Largest absolute displacement component
    pub fn max_displacement(&self) -> f64 {
        self.displacements.amax()
    }

    /// Resultant of all reactions about the global origin
    pub fn base_reaction(&self, dm: &DataManager) -> BaseReaction {
        let mut total = [0.0; 6];
        for node in dm.nodes() {
            let s = node.index * 6;
            let f = [self.reactions[s], self.reactions[s + 1], self.reactions[s + 2]];
            let m = [self.reactions[s + 3], self.reactions[s + 4], self.reactions[s + 5]];
            let (x, y, z) = (node.coords.x, node.coords.y, node.coords.z);

            total[0] += f[0];
            total[1] += f[1];
            total[2] += f[2];
            total[3] += m[0] + y * f[2] - z * f[1];
            total[4] += m[1] + z * f[0] - x * f[2];
            total[5] += m[2] + x * f[1] - y * f[0];
        }
        BaseReaction::from_array(total)
    }

    /// Displacements, reactions and base reaction as a result payload
    pub fn to_output(&self, dm: &DataManager) -> AnalysisOutput {
        AnalysisOutput {
            displacements: Some(dm.node_vectors(&self.displacements)),
            reactions: Some(dm.node_vectors(&self.reactions)),
            base_reaction: Some(self.base_reaction(dm)),
            ..AnalysisOutput::success()
        }
    }
}

/// Solves an assembled global system with the model's restraints
pub struct LinearSolver<'a> {
    dm: &'a DataManager<'a>,
    system: &'a GlobalSystem,
    options: &'a AnalysisOptions,
}

impl<'a> LinearSolver<'a> {
    pub fn new(dm: &'a DataManager<'a>, system: &'a GlobalSystem, options: &'a AnalysisOptions) -> Self {
        Self { dm, system, options }
    }

    /// Solve with the default skyline Cholesky
    pub fn solve(&self) -> FrameResult<StaticSolution> {
        self.solve_with(&SkylineCholesky::default())
    }

    /// Solve with a caller-supplied direct solver
    pub fn solve_with(&self, backend: &dyn LinearSolve) -> FrameResult<StaticSolution> {
        let n = self.dm.total_dofs();
        let free = self.dm.free_dofs();
        let k = &self.system.k;
        let p = &self.system.p;

        let free_indices: Vec<usize> = (0..n).filter(|&i| free[i]).collect();
        info!("Linear solver: {} equations ({} restrained DOFs)", free_indices.len(), n - free_indices.len());

        if free_indices.is_empty() {
            warn!("Structure is fully restrained, reactions balance the loads directly");
            return Ok(StaticSolution {
                displacements: DVector::zeros(n),
                reactions: -p,
            });
        }

        let mut map = vec![None; n];
        for (reduced, &global) in free_indices.iter().enumerate() {
            map[global] = Some(reduced);
        }
        let k_ff = submatrix(k, &map, free_indices.len());
        let p_f = DVector::from_iterator(free_indices.len(), free_indices.iter().map(|&i| p[i]));

        let u_f = backend.solve(&k_ff, &p_f).map_err(|e| match e {
            LinearSolveError::Pivot(failure) => self.mechanism_error(free_indices.get(failure.equation).copied(), failure.pivot),
            LinearSolveError::NonFinite => SolverError::Numerical(e.to_string()),
        })?;

        let mut u = DVector::zeros(n);
        for (reduced, &global) in free_indices.iter().enumerate() {
            u[global] = u_f[reduced];
        }

        let max_u = u.amax();
        if max_u > self.options.max_displacement {
            return Err(SolverError::ExcessiveDisplacement(format!(
                "max |U| = {:e} exceeds {:e}",
                max_u, self.options.max_displacement
            )));
        }
        info!("Linear solver: max displacement {:.6}", max_u);

        let mut reactions = csr_matvec(k, &u) - p;
        for &i in &free_indices {
            reactions[i] = 0.0;
        }

        Ok(StaticSolution {
            displacements: u,
            reactions,
        })
    }

    /// E301 naming the node and DOF where the factorization failed
    fn mechanism_error(&self, global_dof: Option<usize>, pivot: f64) -> SolverError {
        match global_dof.and_then(|dof| self.dm.nodes().get(dof / 6).map(|node| (node.id, dof % 6))) {
            Some((node_id, local)) => SolverError::Mechanism(format!(
                "zero or negative pivot ({:e}) at node {} {}",
                pivot, node_id, DOF_LABELS[local]
            )),
            None => SolverError::Mechanism(format!("zero or negative pivot ({:e})", pivot)),
        }
    }
}
