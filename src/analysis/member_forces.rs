//! Member end forces from the static solution

use std::collections::BTreeMap;

use nalgebra::DVector;

use super::assembler::ElementMatrices;
use super::data_manager::{DataManager, ElementRecord};
use crate::math::Vec12;
use crate::results::MemberForces;

/// Local end forces of one element: `k_local · (T · u) + fef_local`
pub fn element_end_forces(el: &ElementRecord, matrices: &ElementMatrices, u: &DVector<f64>) -> Vec12 {
    let (start_i, start_j) = el.dof_starts();
    let mut u_el = Vec12::zeros();
    for k in 0..6 {
        u_el[k] = u[start_i + k];
        u_el[6 + k] = u[start_j + k];
    }
    matrices.k_local * (matrices.t_total * u_el) + matrices.fef_local
}

/// End forces of every element, keyed by element id
pub fn member_end_forces(
    dm: &DataManager,
    matrices: &BTreeMap<u32, ElementMatrices>,
    u: &DVector<f64>,
) -> BTreeMap<u32, MemberForces> {
    dm.elements()
        .iter()
        .filter_map(|el| {
            let m = matrices.get(&el.id)?;
            let f = element_end_forces(el, m, u);
            Some((el.id, MemberForces::from_local(f.as_slice())))
        })
        .collect()
}
