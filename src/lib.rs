//! Frame Solver - 3D frame analysis with Timoshenko beam elements
//!
//! This library analyzes spatial frame models described by a JSON input
//! file, supporting:
//! - Frame elements with shear deformation, end releases and rigid end zones
//! - Linear static analysis on a sparse global stiffness matrix
//! - Modal analysis (shift-invert eigen solve, participation factors)
//! - Response spectrum analysis with the TSC-2018 design spectrum (CQC/SRSS)
//!
//! ## Example
//! ```rust
//! use frame_solver::prelude::*;
//!
//! let mut model = ModelInput::new();
//!
//! // Material and section
//! model.add_material(Material::steel("S355"));
//! model.add_section(Section::rectangular("R300x500", "S355", 0.3, 0.5)).unwrap();
//!
//! // Nodes and member
//! model.add_node(Node::new(1, 0.0, 0.0, 0.0).fixed()).unwrap();
//! model.add_node(Node::new(2, 3.0, 0.0, 0.0)).unwrap();
//! model.add_element(FrameElement::new(1, 1, 2, "R300x500")).unwrap();
//!
//! // Loads
//! model.add_load_pattern(LoadPattern::live("LIVE"));
//! model.add_load_case(LoadCase::linear_static("LIVE", "LIVE"));
//! model.add_load(NodalLoad::force("LIVE", 2, 0.0, 0.0, -10_000.0));
//!
//! // Analyze
//! let output = analyze(&model, &AnalysisOptions::for_case("LIVE"));
//! assert!(output.is_success());
//!
//! // Tip deflection
//! let uz = output.displacements.as_ref().unwrap()[&2][2];
//! assert!(uz < 0.0);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{
        analyze, run_analysis, AnalysisOptions, AnalysisType, SiteClass, SpectrumFunction,
    };
    pub use crate::elements::{FrameElement, Material, MemberReleases, Node, Section, SectionProperties};
    pub use crate::error::{FrameResult, SolverError};
    pub use crate::loads::{
        DirectionalCombination, ExcitationDirection, LoadCase, LoadDirection, LoadPattern, MassSource,
        MemberDistributedLoad, MemberPointLoad, ModalCombination, NodalLoad,
    };
    pub use crate::model::ModelInput;
    pub use crate::results::{AnalysisOutput, AnalysisStatus, BaseReaction, MemberForces};
}

#[cfg(feature = "wasm")]
pub mod wasm;
