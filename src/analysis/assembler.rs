//! Global assembler - stiffness matrix and load vector
//!
//! Element stiffness is scattered into a COO builder and converted once to
//! CSR. Member loads become fixed end forces in local axes, are condensed for
//! releases and transformed to the global load vector.

use std::collections::BTreeMap;

use log::info;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use super::data_manager::{DataManager, ElementRecord};
use super::AnalysisOptions;
use crate::error::{FrameResult, SolverError};
use crate::loads::{CoordSystem, Load, MemberDistributedLoad, MemberPointLoad, PointLoadKind};
use crate::math::{
    condense_fef, condense_stiffness, eccentricity_matrix, expand_rotation, fef_point_force, fef_point_moment,
    fef_uniform_load, member_local_stiffness, Mat12, Mat6, SparseMatrixBuilder, Vec12, Vec3,
};

/// Per-element matrices kept for force recovery and the debug artifact
#[derive(Debug, Clone)]
pub struct ElementMatrices {
    /// Local stiffness after condensation
    pub k_local: Mat12,
    /// Global-to-member-end transformation (eccentricity x rotation)
    pub t_total: Mat12,
    /// Accumulated local fixed end forces of all member loads
    pub fef_local: Vec12,
}

/// Assembled global system for one load case
pub struct GlobalSystem {
    pub k: CsrMatrix<f64>,
    pub p: DVector<f64>,
    pub element_matrices: BTreeMap<u32, ElementMatrices>,
}

/// Builds K and P from the data manager's records
pub struct GlobalAssembler<'a> {
    dm: &'a DataManager<'a>,
    options: &'a AnalysisOptions,
}

impl<'a> GlobalAssembler<'a> {
    pub fn new(dm: &'a DataManager<'a>, options: &'a AnalysisOptions) -> Self {
        Self { dm, options }
    }

    /// Uncondensed local stiffness of an element
    fn raw_stiffness(el: &ElementRecord) -> Mat12 {
        member_local_stiffness(el.e, el.g, &el.props, el.l_clear, el.l_total)
    }

    /// Local stiffness with end releases condensed out
    pub fn local_stiffness(&self, el: &ElementRecord) -> FrameResult<Mat12> {
        let k = Self::raw_stiffness(el);
        if el.has_releases() {
            condense_stiffness(&k, &el.releases, self.options.condensation_penalty)
        } else {
            Ok(k)
        }
    }

    /// Transformation from global node DOFs to local member-end DOFs
    ///
    /// The rigid link at each end combines the joint offset (rotated into
    /// local axes) with the rigid end zone along axis 1.
    pub fn transformation(el: &ElementRecord) -> Mat12 {
        let r = &el.rotation;
        let e_i = r * el.off_i + Vec3::new(el.end_off_i, 0.0, 0.0);
        let e_j = r * el.off_j - Vec3::new(el.end_off_j, 0.0, 0.0);
        eccentricity_matrix(&e_i, &e_j) * expand_rotation(r)
    }

    /// Assemble the global stiffness matrix
    pub fn assemble_stiffness(&self) -> FrameResult<(CsrMatrix<f64>, BTreeMap<u32, ElementMatrices>)> {
        let mut builder = SparseMatrixBuilder::new(self.dm.total_dofs());
        let mut matrices = BTreeMap::new();

        for el in self.dm.elements() {
            let k_local = self.local_stiffness(el)?;
            let t_total = Self::transformation(el);
            let k_global = t_total.transpose() * k_local * t_total;

            let (start_i, start_j) = el.dof_starts();
            let blocks = [(0, 0, start_i, start_i), (0, 6, start_i, start_j), (6, 0, start_j, start_i), (6, 6, start_j, start_j)];
            for (r, c, row, col) in blocks {
                let block: Mat6 = k_global.fixed_view::<6, 6>(r, c).into_owned();
                builder.add_block(row, col, &block);
            }

            matrices.insert(
                el.id,
                ElementMatrices {
                    k_local,
                    t_total,
                    fef_local: Vec12::zeros(),
                },
            );
        }

        info!(
            "Assembler: {} elements, {} triplets, sparsity {:.2}%",
            self.dm.elements().len(),
            builder.nnz(),
            builder.sparsity() * 100.0
        );

        Ok((builder.to_csr(), matrices))
    }

    /// Assemble the global load vector
    ///
    /// Returns P and the accumulated local FEF of every loaded element.
    pub fn assemble_load_vector(&self) -> FrameResult<(DVector<f64>, BTreeMap<u32, Vec12>)> {
        let mut p = self.dm.nodal_load_vector()?;
        let mut fefs: BTreeMap<u32, Vec12> = BTreeMap::new();

        for load in self.dm.loads() {
            let Some(element_id) = load.element_id() else { continue };
            let Some(scale) = self.dm.active_scale(load.pattern()) else {
                continue;
            };
            let el = self.dm.element(element_id).ok_or_else(|| {
                SolverError::InvalidReference(format!(
                    "member load in pattern '{}' references unknown element {}",
                    load.pattern(),
                    element_id
                ))
            })?;

            let contribution = match load {
                Load::MemberDistributed(dist) => self.distributed_load(el, dist, scale)?,
                Load::MemberPoint(point) => self.point_load(el, point, scale)?,
                Load::Nodal(_) => continue,
            };

            let (start_i, start_j) = el.dof_starts();
            for k in 0..6 {
                p[start_i + k] -= contribution.fef_global[k];
                p[start_j + k] -= contribution.fef_global[6 + k];
            }
            *fefs.entry(el.id).or_insert_with(Vec12::zeros) += contribution.fef_local;
        }

        Ok((p, fefs))
    }

    /// Assemble K, P and the per-element matrices
    pub fn assemble_system(&self) -> FrameResult<GlobalSystem> {
        let (k, mut element_matrices) = self.assemble_stiffness()?;
        let (p, fefs) = self.assemble_load_vector()?;

        for (id, fef) in fefs {
            if let Some(m) = element_matrices.get_mut(&id) {
                m.fef_local = fef;
            }
        }

        Ok(GlobalSystem { k, p, element_matrices })
    }

    /// Condense a local FEF for releases and transform it to global node DOFs
    fn finish_fef(&self, el: &ElementRecord, fef_local: Vec12) -> FrameResult<LoadContribution> {
        let fef_local = if el.has_releases() {
            condense_fef(&Self::raw_stiffness(el), &fef_local, &el.releases)?
        } else {
            fef_local
        };
        let fef_global = Self::transformation(el).transpose() * fef_local;
        Ok(LoadContribution { fef_local, fef_global })
    }

    fn distributed_load(&self, el: &ElementRecord, load: &MemberDistributedLoad, scale: f64) -> FrameResult<LoadContribution> {
        let r = &el.rotation;
        let mut w = Vec3::from(load.components()) * scale;

        let w_local = match load.coord {
            CoordSystem::Global => {
                if load.projected {
                    for d in 0..3 {
                        let c = el.direction[d];
                        w[d] *= (1.0 - c * c).max(0.0).sqrt();
                    }
                }
                r * w
            }
            CoordSystem::Local => w,
        };

        let mut contribution = self.finish_fef(el, fef_uniform_load(&w_local, el.l_clear))?;

        // Load on the rigid end zones goes straight to the nodes
        let rigid_ends = [
            (el.end_off_i, el.end_off_i / 2.0, el.off_i, 0),
            (el.end_off_j, -el.end_off_j / 2.0, el.off_j, 6),
        ];
        for (length, centroid_x, offset, base) in rigid_ends {
            if length <= 0.0 {
                continue;
            }
            let force = w_local * length;
            let centroid = Vec3::new(centroid_x, 0.0, 0.0) + r * offset;
            let moment = centroid.cross(&force);
            let force_global = r.transpose() * force;
            let moment_global = r.transpose() * moment;
            for k in 0..3 {
                contribution.fef_global[base + k] -= force_global[k];
                contribution.fef_global[base + 3 + k] -= moment_global[k];
            }
        }

        Ok(contribution)
    }

    fn point_load(&self, el: &ElementRecord, load: &MemberPointLoad, scale: f64) -> FrameResult<LoadContribution> {
        let unit = load.dir.unit_vector().ok_or_else(|| {
            SolverError::InvalidReference(format!(
                "point load on element {} has unknown direction {:?}",
                el.id, load.dir
            ))
        })?;

        let r = &el.rotation;
        let value = Vec3::from(unit) * (load.force * scale);
        let local = match load.effective_coord() {
            CoordSystem::Global => r * value,
            CoordSystem::Local => value,
        };

        let dist = load.position(el.l_total);
        let tol = 1e-9 * el.l_total.max(1.0);
        if dist < -tol || dist > el.l_total + tol {
            return Err(SolverError::InvalidReference(format!(
                "point load on element {} at {} lies outside the member length {}",
                el.id, dist, el.l_total
            )));
        }

        let clear_end = el.l_total - el.end_off_j;
        if dist >= el.end_off_i - tol && dist <= clear_end + tol {
            let a = (dist - el.end_off_i).clamp(0.0, el.l_clear);
            let fef = match load.l_type {
                PointLoadKind::Force => fef_point_force(&local, a, el.l_clear, el.e, el.g, &el.props),
                PointLoadKind::Moment => fef_point_moment(&local, a, el.l_clear, el.e, el.g, &el.props),
            };
            return self.finish_fef(el, fef);
        }

        // Inside a rigid end zone: carry the load rigidly to the adjacent node
        let (arm, base) = if dist < el.end_off_i {
            (r * el.off_i + Vec3::new(dist, 0.0, 0.0), 0)
        } else {
            (r * el.off_j - Vec3::new(el.l_total - dist, 0.0, 0.0), 6)
        };
        let (force, moment) = match load.l_type {
            PointLoadKind::Force => (local, arm.cross(&local)),
            PointLoadKind::Moment => (Vec3::zeros(), local),
        };

        let mut fef_global = Vec12::zeros();
        let force_global = r.transpose() * force;
        let moment_global = r.transpose() * moment;
        for k in 0..3 {
            fef_global[base + k] = -force_global[k];
            fef_global[base + 3 + k] = -moment_global[k];
        }

        Ok(LoadContribution {
            fef_local: Vec12::zeros(),
            fef_global,
        })
    }
}

struct LoadContribution {
    fef_local: Vec12,
    fef_global: Vec12,
}
