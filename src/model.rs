//! Analysis model - the numeric input consumed by the solver

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::SpectrumFunction;
use crate::elements::{FrameElement, Material, Node, Section};
use crate::error::{FrameResult, SolverError};
use crate::loads::{Load, LoadCase, LoadPattern, MassSource};

/// The full structural model as exported by the modelling layer
///
/// Units must be consistent; the solver never converts them. Unknown fields
/// (grid, slabs, graphics, ...) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelInput {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub elements: Vec<FrameElement>,
    #[serde(default)]
    pub load_patterns: Vec<LoadPattern>,
    #[serde(default)]
    pub load_cases: Vec<LoadCase>,
    #[serde(default)]
    pub loads: Vec<Load>,
    #[serde(default)]
    pub mass_sources: Vec<MassSource>,
    /// Response spectrum function definitions
    #[serde(default)]
    pub functions: Vec<SpectrumFunction>,
}

impl ModelInput {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a model from a JSON string
    pub fn from_json_str(json: &str) -> FrameResult<Self> {
        serde_json::from_str(json).map_err(|e| SolverError::InvalidJson(e.to_string()))
    }

    /// Read and parse a model file
    pub fn from_json_file(path: impl AsRef<Path>) -> FrameResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SolverError::InputNotFound(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Serialize the model back to JSON
    pub fn to_json(&self) -> FrameResult<String> {
        serde_json::to_string_pretty(self).map_err(SolverError::from)
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node to the model
    pub fn add_node(&mut self, node: Node) -> FrameResult<()> {
        if self.node(node.id).is_some() {
            return Err(SolverError::InvalidReference(format!("duplicate node id {}", node.id)));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Add a material to the model
    pub fn add_material(&mut self, material: Material) {
        self.materials.push(material);
    }

    /// Add a section to the model
    pub fn add_section(&mut self, section: Section) -> FrameResult<()> {
        if self.material(&section.mat_name).is_none() {
            return Err(SolverError::MissingProperty(format!(
                "section '{}' references unknown material '{}'",
                section.name, section.mat_name
            )));
        }
        self.sections.push(section);
        Ok(())
    }

    /// Add a frame element to the model
    pub fn add_element(&mut self, element: FrameElement) -> FrameResult<()> {
        for nid in [element.n1_id, element.n2_id] {
            if self.node(nid).is_none() {
                return Err(SolverError::InvalidReference(format!(
                    "element {} references unknown node {}",
                    element.id, nid
                )));
            }
        }
        if self.section(&element.sec_name).is_none() {
            return Err(SolverError::MissingProperty(format!(
                "element {} references unknown section '{}'",
                element.id, element.sec_name
            )));
        }
        self.elements.push(element);
        Ok(())
    }

    pub fn add_load_pattern(&mut self, pattern: LoadPattern) {
        self.load_patterns.push(pattern);
    }

    pub fn add_load_case(&mut self, case: LoadCase) {
        self.load_cases.push(case);
    }

    /// Add any load (nodal, distributed or point)
    pub fn add_load(&mut self, load: impl Into<Load>) {
        self.loads.push(load.into());
    }

    pub fn add_mass_source(&mut self, source: MassSource) {
        self.mass_sources.push(source);
    }

    pub fn add_function(&mut self, function: SpectrumFunction) {
        self.functions.push(function);
    }

    // ========================
    // Lookups
    // ========================

    pub fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn element(&self, id: u32) -> Option<&FrameElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn load_case(&self, name: &str) -> Option<&LoadCase> {
        self.load_cases.iter().find(|c| c.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&SpectrumFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Number of nodes in the model
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of frame elements in the model
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }
}
