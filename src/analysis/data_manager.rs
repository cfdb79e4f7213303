//! Data manager - validates the model and prepares solver-ready records
//!
//! Node ids are mapped to dense indices in ascending id order, elements are
//! resolved against their section and material, the load case is selected
//! and self-weight loads are synthesized for its patterns.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};
use nalgebra::DVector;

use super::AnalysisOptions;
use crate::elements::SectionProperties;
use crate::error::{FrameResult, SolverError};
use crate::loads::{Load, LoadCase, MemberDistributedLoad};
use crate::math::{member_rotation_matrix, Mat3, Vec3};
use crate::model::ModelInput;
use crate::results::NodeVector;

/// A node with its dense position in the global system
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: u32,
    /// Position in sorted id order; DOFs are `6 * index .. 6 * index + 6`
    pub index: usize,
    pub coords: Vec3,
    pub restraints: [bool; 6],
}

/// A frame element resolved against its section and material
#[derive(Debug, Clone)]
pub struct ElementRecord {
    pub id: u32,
    pub node_i: usize,
    pub node_j: usize,
    pub e: f64,
    pub g: f64,
    /// Unit weight of the material
    pub gamma: f64,
    pub props: SectionProperties,
    pub beta: f64,
    pub releases: [bool; 12],
    pub off_i: Vec3,
    pub off_j: Vec3,
    pub end_off_i: f64,
    pub end_off_j: f64,
    /// Distance between the offset member ends
    pub l_total: f64,
    /// Flexible length between the rigid end zones
    pub l_clear: f64,
    /// Local axes, built from the offset member ends
    pub rotation: Mat3,
    /// Unit chord vector from the i-end to the j-end
    pub direction: Vec3,
}

impl ElementRecord {
    pub fn has_releases(&self) -> bool {
        self.releases.iter().any(|&r| r)
    }

    /// Global DOF index of the first DOF at each end
    pub fn dof_starts(&self) -> (usize, usize) {
        (self.node_i * 6, self.node_j * 6)
    }
}

/// Solver-ready view of a model for one load case
pub struct DataManager<'a> {
    model: &'a ModelInput,
    nodes: Vec<NodeRecord>,
    node_index: HashMap<u32, usize>,
    elements: Vec<ElementRecord>,
    element_index: HashMap<u32, usize>,
    case: LoadCase,
    loads: Vec<Load>,
}

impl<'a> DataManager<'a> {
    /// Prepare the model for the named load case
    pub fn new(model: &'a ModelInput, case_name: &str, options: &AnalysisOptions) -> FrameResult<Self> {
        let (nodes, node_index) = map_nodes(model)?;
        info!("Data manager: {} nodes, {} DOFs", nodes.len(), nodes.len() * 6);

        let mut dm = Self {
            model,
            nodes,
            node_index,
            elements: Vec::with_capacity(model.elements.len()),
            element_index: HashMap::new(),
            case: LoadCase::default(),
            loads: model.loads.clone(),
        };

        dm.parse_elements(options)?;
        dm.case = select_load_case(model, case_name)?;
        dm.generate_self_weight();

        Ok(dm)
    }

    fn parse_elements(&mut self, options: &AnalysisOptions) -> FrameResult<()> {
        let model = self.model;
        for el in &model.elements {
            let node_i = self.node_position(el.n1_id).ok_or_else(|| {
                SolverError::InvalidReference(format!("element {} references unknown node {}", el.id, el.n1_id))
            })?;
            let node_j = self.node_position(el.n2_id).ok_or_else(|| {
                SolverError::InvalidReference(format!("element {} references unknown node {}", el.id, el.n2_id))
            })?;

            let section = model.section(&el.sec_name).ok_or_else(|| {
                SolverError::MissingProperty(format!("element {} references missing section '{}'", el.id, el.sec_name))
            })?;
            let material = model.material(&section.mat_name).ok_or_else(|| {
                SolverError::MissingProperty(format!(
                    "section '{}' references missing material '{}'",
                    section.name, section.mat_name
                ))
            })?;

            let props = section.properties;
            if props.a <= 0.0 || props.i22 <= 0.0 || props.i33 <= 0.0 {
                return Err(SolverError::InvalidSection(format!(
                    "section '{}' (element {}): A = {}, I22 = {}, I33 = {}",
                    section.name, el.id, props.a, props.i22, props.i33
                )));
            }

            if el.end_off_i < 0.0 || el.end_off_j < 0.0 {
                return Err(SolverError::ZeroLengthElement(format!(
                    "element {} has negative end offsets ({}, {})",
                    el.id, el.end_off_i, el.end_off_j
                )));
            }

            let off_i = Vec3::from(el.off_i);
            let off_j = Vec3::from(el.off_j);
            let p_i = self.nodes[node_i].coords + off_i;
            let p_j = self.nodes[node_j].coords + off_j;

            let l_total = (p_j - p_i).norm();
            if l_total < 1e-9 {
                return Err(SolverError::ZeroLengthElement(format!(
                    "element {} connects coincident member ends",
                    el.id
                )));
            }

            let l_clear = l_total - el.end_off_i - el.end_off_j;
            if l_clear <= options.min_clear_length {
                return Err(SolverError::ZeroLengthElement(format!(
                    "element {}: rigid end zones ({} + {}) consume the whole length {}",
                    el.id, el.end_off_i, el.end_off_j, l_total
                )));
            }

            let rotation = member_rotation_matrix(&p_i, &p_j, el.beta, options.vertical_tolerance);
            debug!(
                "Element {}: axis 1 = {:?}, axis 2 = {:?}, axis 3 = {:?}",
                el.id,
                rotation.row(0).iter().collect::<Vec<_>>(),
                rotation.row(1).iter().collect::<Vec<_>>(),
                rotation.row(2).iter().collect::<Vec<_>>()
            );

            self.element_index.insert(el.id, self.elements.len());
            self.elements.push(ElementRecord {
                id: el.id,
                node_i,
                node_j,
                e: material.e,
                g: material.shear_modulus(),
                gamma: material.rho,
                props,
                beta: el.beta,
                releases: el.releases().as_array(),
                off_i,
                off_j,
                end_off_i: el.end_off_i,
                end_off_j: el.end_off_j,
                l_total,
                l_clear,
                rotation,
                direction: (p_j - p_i) / l_total,
            });
        }

        Ok(())
    }

    /// Append a distributed self-weight load per element for every active
    /// pattern with a non-zero self-weight multiplier
    fn generate_self_weight(&mut self) {
        let targets: Vec<(String, f64)> = self
            .model
            .load_patterns
            .iter()
            .filter(|p| p.sw_mult != 0.0 && self.case.pattern_scale(&p.name).is_some())
            .map(|p| (p.name.clone(), p.sw_mult))
            .collect();

        if targets.is_empty() {
            return;
        }

        let mut count = 0;
        for el in &self.elements {
            let w_per_length = el.props.a * el.gamma;
            if w_per_length <= 1e-9 {
                continue;
            }
            for (pattern, mult) in &targets {
                let load = MemberDistributedLoad::global(pattern, el.id, 0.0, 0.0, -w_per_length * mult);
                self.loads.push(Load::MemberDistributed(load));
                count += 1;
            }
        }

        info!("Data manager: injected {} self-weight loads", count);
    }

    pub fn model(&self) -> &'a ModelInput {
        self.model
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn elements(&self) -> &[ElementRecord] {
        &self.elements
    }

    /// The selected load case
    pub fn load_case(&self) -> &LoadCase {
        &self.case
    }

    /// User loads followed by the synthesized self-weight loads
    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    /// Loads as given in the model, without self-weight
    pub fn user_loads(&self) -> &[Load] {
        &self.model.loads
    }

    pub fn total_dofs(&self) -> usize {
        self.nodes.len() * 6
    }

    /// Dense index of a node id
    pub fn node_position(&self, id: u32) -> Option<usize> {
        self.node_index.get(&id).copied()
    }

    pub fn element(&self, id: u32) -> Option<&ElementRecord> {
        self.element_index.get(&id).map(|&i| &self.elements[i])
    }

    /// Scale factor of a pattern in the selected case, if active
    pub fn active_scale(&self, pattern: &str) -> Option<f64> {
        self.case.pattern_scale(pattern)
    }

    /// Free/restrained flag per global DOF (true = free)
    pub fn free_dofs(&self) -> Vec<bool> {
        let mut free = vec![true; self.total_dofs()];
        for node in &self.nodes {
            for (i, &restrained) in node.restraints.iter().enumerate() {
                if restrained {
                    free[node.index * 6 + i] = false;
                }
            }
        }
        free
    }

    /// Split a global DOF vector into per-node 6-vectors keyed by node id
    pub fn node_vectors(&self, values: &DVector<f64>) -> BTreeMap<u32, NodeVector> {
        self.nodes
            .iter()
            .map(|node| {
                let mut v = [0.0; 6];
                for (k, item) in v.iter_mut().enumerate() {
                    *item = values[node.index * 6 + k];
                }
                (node.id, v)
            })
            .collect()
    }

    /// Global load vector from the nodal loads of the active patterns
    pub fn nodal_load_vector(&self) -> FrameResult<DVector<f64>> {
        let mut p = DVector::zeros(self.total_dofs());

        for load in &self.loads {
            let Load::Nodal(nodal) = load else { continue };
            let Some(scale) = self.active_scale(&nodal.pattern) else {
                continue;
            };
            let index = self.node_position(nodal.node_id).ok_or_else(|| {
                SolverError::InvalidReference(format!("nodal load references unknown node {}", nodal.node_id))
            })?;
            for (i, value) in nodal.as_array().iter().enumerate() {
                p[index * 6 + i] += value * scale;
            }
        }

        Ok(p)
    }
}

fn map_nodes(model: &ModelInput) -> FrameResult<(Vec<NodeRecord>, HashMap<u32, usize>)> {
    let mut ids: Vec<u32> = model.nodes.iter().map(|n| n.id).collect();
    ids.sort_unstable();
    if let Some(dup) = ids.windows(2).find(|w| w[0] == w[1]) {
        return Err(SolverError::InvalidReference(format!("duplicate node id {}", dup[0])));
    }

    let node_index: HashMap<u32, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut nodes: Vec<NodeRecord> = model
        .nodes
        .iter()
        .map(|n| NodeRecord {
            id: n.id,
            index: node_index[&n.id],
            coords: n.coords(),
            restraints: n.restraints,
        })
        .collect();
    nodes.sort_by_key(|n| n.index);

    Ok((nodes, node_index))
}

/// Pick the case by exact name; "DEAD" falls back to the first defined case
fn select_load_case(model: &ModelInput, case_name: &str) -> FrameResult<LoadCase> {
    let case = match model.load_case(case_name) {
        Some(case) => case,
        None if case_name == "DEAD" && !model.load_cases.is_empty() => {
            let first = &model.load_cases[0];
            warn!("Load case 'DEAD' not found, using first case '{}'", first.name);
            first
        }
        None => return Err(SolverError::LoadCaseNotFound(case_name.to_string())),
    };

    if case.p_delta {
        return Err(SolverError::UnsupportedAnalysis(format!(
            "load case '{}' requests P-Delta, which this solver does not perform",
            case.name
        )));
    }

    Ok(case.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{FrameElement, Material, Node, Section};
    use crate::loads::{LoadPattern, NodalLoad};

    fn two_node_model() -> ModelInput {
        let mut model = ModelInput::new();
        model.add_node(Node::new(7, 4.0, 0.0, 0.0)).unwrap();
        model.add_node(Node::new(3, 0.0, 0.0, 0.0).fixed()).unwrap();
        model.add_material(Material::isotropic("C", 30e9, 0.2, 25.0));
        model.add_section(Section::rectangular("R", "C", 0.3, 0.5)).unwrap();
        model.add_element(FrameElement::new(1, 3, 7, "R")).unwrap();
        model.add_load_pattern(LoadPattern::dead("DEAD"));
        model.add_load_case(LoadCase::linear_static("DEAD", "DEAD"));
        model
    }

    #[test]
    fn test_nodes_sorted_by_id() {
        let model = two_node_model();
        let dm = DataManager::new(&model, "DEAD", &AnalysisOptions::default()).unwrap();
        assert_eq!(dm.node_position(3), Some(0));
        assert_eq!(dm.node_position(7), Some(1));
        assert_eq!(dm.nodes()[0].id, 3);
        assert_eq!(dm.total_dofs(), 12);
        assert_eq!(dm.free_dofs().iter().filter(|&&f| f).count(), 6);
    }

    #[test]
    fn test_self_weight_injected() {
        let model = two_node_model();
        let dm = DataManager::new(&model, "DEAD", &AnalysisOptions::default()).unwrap();
        assert_eq!(dm.loads().len(), 1);
        match &dm.loads()[0] {
            Load::MemberDistributed(l) => assert!((l.wz + 0.15 * 25.0).abs() < 1e-12),
            other => panic!("unexpected load {:?}", other),
        }
    }

    #[test]
    fn test_dead_falls_back_to_first_case() {
        let mut model = two_node_model();
        model.load_cases = vec![LoadCase::linear_static("G", "DEAD")];
        let dm = DataManager::new(&model, "DEAD", &AnalysisOptions::default()).unwrap();
        assert_eq!(dm.load_case().name, "G");

        let err = DataManager::new(&model, "LIVE", &AnalysisOptions::default()).err().unwrap();
        assert_eq!(err.code(), "E104");
    }

    #[test]
    fn test_p_delta_rejected() {
        let mut model = two_node_model();
        model.load_cases[0].p_delta = true;
        let err = DataManager::new(&model, "DEAD", &AnalysisOptions::default()).err().unwrap();
        assert_eq!(err.code(), "E106");
    }

    #[test]
    fn test_rigid_zones_consuming_member() {
        let mut model = two_node_model();
        model.elements[0].end_off_i = 2.0;
        model.elements[0].end_off_j = 2.0;
        let err = DataManager::new(&model, "DEAD", &AnalysisOptions::default()).err().unwrap();
        assert_eq!(err.code(), "E201");
    }

    #[test]
    fn test_zero_area_section_rejected() {
        let mut model = two_node_model();
        model.sections[0].properties.a = 0.0;
        let err = DataManager::new(&model, "DEAD", &AnalysisOptions::default()).err().unwrap();
        assert_eq!(err.code(), "E202");
    }

    #[test]
    fn test_nodal_load_on_unknown_node() {
        let mut model = two_node_model();
        model.add_load(NodalLoad::force("DEAD", 99, 0.0, 0.0, -1.0));
        let dm = DataManager::new(&model, "DEAD", &AnalysisOptions::default()).unwrap();
        assert_eq!(dm.nodal_load_vector().unwrap_err().code(), "E105");
    }

    #[test]
    fn test_joint_offsets_shorten_member() {
        let mut model = two_node_model();
        model.elements[0].off_i = [0.5, 0.0, 0.0];
        model.elements[0].end_off_j = 0.5;
        let dm = DataManager::new(&model, "DEAD", &AnalysisOptions::default()).unwrap();
        let el = dm.element(1).unwrap();
        assert!((el.l_total - 3.5).abs() < 1e-12);
        assert!((el.l_clear - 3.0).abs() < 1e-12);
    }
}
