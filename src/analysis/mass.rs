//! Lumped global mass matrix
//!
//! Mass comes from element self weight and, optionally, from the vertical
//! loads of selected patterns. Every node gets the same mass on its three
//! translations and a small fraction of it on the rotations.

use std::collections::BTreeMap;

use log::{info, warn};
use nalgebra::DVector;

use super::data_manager::DataManager;
use super::AnalysisOptions;
use crate::loads::{Load, MassSource};
use crate::results::NodeVector;

/// Diagonal mass matrix over all global DOFs
#[derive(Debug, Clone)]
pub struct MassMatrix {
    pub diag: DVector<f64>,
}

impl MassMatrix {
    pub fn zeros(n: usize) -> Self {
        Self { diag: DVector::zeros(n) }
    }

    /// Lumped mass per node, keyed by node id
    pub fn node_masses(&self, dm: &DataManager) -> BTreeMap<u32, NodeVector> {
        dm.node_vectors(&self.diag)
    }

    /// Total translational mass on free DOFs along X, Y and Z
    pub fn total_free_mass(&self, free: &[bool]) -> [f64; 3] {
        let mut total = [0.0; 3];
        for (dof, &is_free) in free.iter().enumerate() {
            if is_free && dof % 6 < 3 {
                total[dof % 6] += self.diag[dof];
            }
        }
        total
    }

    /// Mass on the given DOFs, in order
    pub fn reduced(&self, dofs: &[usize]) -> DVector<f64> {
        DVector::from_iterator(dofs.len(), dofs.iter().map(|&i| self.diag[i]))
    }
}

/// Builds the mass matrix for a mass source
pub struct GlobalMassAssembler<'a> {
    dm: &'a DataManager<'a>,
    options: &'a AnalysisOptions,
}

impl<'a> GlobalMassAssembler<'a> {
    pub fn new(dm: &'a DataManager<'a>, options: &'a AnalysisOptions) -> Self {
        Self { dm, options }
    }

    /// Resolve a mass source by name
    ///
    /// "Default" falls back to the first defined source; any other unknown
    /// name falls back to self mass only.
    pub fn find_source(&self, name: &str) -> MassSource {
        let sources = &self.dm.model().mass_sources;
        if let Some(source) = sources.iter().find(|s| s.name == name) {
            return source.clone();
        }
        if name == "Default" {
            if let Some(first) = sources.first() {
                return first.clone();
            }
        } else {
            warn!("Mass source '{}' not found, using self mass only", name);
        }
        MassSource::default()
    }

    /// Assemble the lumped mass matrix for a named source
    pub fn build(&self, source_name: &str) -> MassMatrix {
        let source = self.find_source(source_name);
        let mut mass = MassMatrix::zeros(self.dm.total_dofs());

        if source.include_self_mass {
            self.add_self_mass(&mut mass);
        }
        if source.include_patterns && !source.load_patterns.is_empty() {
            self.add_load_mass(&mut mass, &source);
        }

        info!(
            "Mass assembler: source '{}', total mass {:.4}",
            source.name,
            mass.diag.iter().step_by(6).sum::<f64>()
        );
        mass
    }

    /// Lump `mass` equally on the translations of a node
    fn lump(&self, mass: &mut MassMatrix, node_index: usize, value: f64) {
        let start = node_index * 6;
        for k in 0..3 {
            mass.diag[start + k] += value;
            mass.diag[start + 3 + k] += value * self.options.rotational_inertia_factor;
        }
    }

    fn add_self_mass(&self, mass: &mut MassMatrix) {
        for el in self.dm.elements() {
            let total = el.props.a * (el.gamma / self.options.gravity) * el.l_total;
            self.lump(mass, el.node_i, total / 2.0);
            self.lump(mass, el.node_j, total / 2.0);
        }
    }

    fn add_load_mass(&self, mass: &mut MassMatrix, source: &MassSource) {
        let g = self.options.gravity;
        for load in self.dm.user_loads() {
            let Some(mult) = source
                .load_patterns
                .iter()
                .find(|m| m.pattern == load.pattern())
                .map(|m| m.multiplier)
            else {
                continue;
            };

            match load {
                Load::Nodal(nodal) => {
                    let Some(index) = self.dm.node_position(nodal.node_id) else {
                        warn!("Mass source: skipping load on unknown node {}", nodal.node_id);
                        continue;
                    };
                    let value = nodal.fz.abs() * mult / g;
                    if value > 0.0 {
                        self.lump(mass, index, value);
                    }
                }
                Load::MemberDistributed(dist) => {
                    let Some(el) = self.dm.element(dist.element_id) else {
                        warn!("Mass source: skipping load on unknown element {}", dist.element_id);
                        continue;
                    };
                    let value = dist.wz.abs() * el.l_total * mult / g;
                    if value > 0.0 {
                        self.lump(mass, el.node_i, value / 2.0);
                        self.lump(mass, el.node_j, value / 2.0);
                    }
                }
                Load::MemberPoint(_) => {}
            }
        }
    }
}
