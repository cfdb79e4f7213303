//! Analysis types, options and the top-level driver

mod assembler;
mod data_manager;
mod linear;
mod mass;
mod member_forces;
mod modal;
mod rsa;
mod spectrum;

use std::collections::BTreeMap;

use log::{error, info};
use serde::{Deserialize, Serialize};

pub use assembler::{ElementMatrices, GlobalAssembler, GlobalSystem};
pub use data_manager::{DataManager, ElementRecord, NodeRecord};
pub use linear::{LinearSolve, LinearSolveError, LinearSolver, SkylineCholesky, StaticSolution};
pub use mass::{GlobalMassAssembler, MassMatrix};
pub use member_forces::{element_end_forces, member_end_forces};
pub use modal::{DenseShiftInvert, EigenPairs, EigenSolver, ModalEngine, ModalResults, ModeResult};
pub use rsa::{cqc_rho, combine_directional, combine_modal, RsaEngine, RsaResults};
pub use spectrum::{Interpolation, SiteClass, SpectrumDirection, SpectrumFunction, SpectrumGenerator};

use crate::error::{FrameResult, SolverError};
use crate::loads::{LoadCase, LoadCaseType};
use crate::model::ModelInput;
use crate::results::{AnalysisInfo, AnalysisOutput};

/// Type of structural analysis to perform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisType {
    /// First-order linear static analysis
    #[default]
    LinearStatic,
    /// Natural periods and mode shapes
    Modal,
    /// Modal response spectrum analysis
    ResponseSpectrum,
}

impl AnalysisType {
    /// Analysis requested by a load case
    pub fn for_case(case: &LoadCase) -> FrameResult<Self> {
        match case.case_type {
            LoadCaseType::LinearStatic => Ok(Self::LinearStatic),
            LoadCaseType::Modal => Ok(Self::Modal),
            LoadCaseType::ResponseSpectrum => Ok(Self::ResponseSpectrum),
            LoadCaseType::Unsupported => Err(SolverError::UnsupportedAnalysis(format!(
                "load case '{}' has an unsupported analysis type",
                case.name
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LinearStatic => "Linear Static",
            Self::Modal => "Modal Analysis",
            Self::ResponseSpectrum => "Response Spectrum",
        }
    }
}

/// Options for structural analysis
///
/// Defaults reproduce the reference behaviour; the regularization constants
/// are exposed so they can be tuned per model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Load case to run
    pub case_name: String,
    /// Gravity used to convert weights into mass
    pub gravity: f64,
    /// Gravity used to scale spectral accelerations and base shear
    pub rsa_gravity: f64,
    /// Rotational mass as a fraction of the lumped translational mass
    pub rotational_inertia_factor: f64,
    /// Penalty on released rotations, relative to the largest stiffness term
    pub condensation_penalty: f64,
    /// Shift for the shift-invert eigen solve
    pub eigen_shift: f64,
    /// Period reported for rigid-body modes
    pub sentinel_period: f64,
    /// Smallest clear length left between rigid end zones
    pub min_clear_length: f64,
    /// |cos| above which a member is treated as vertical
    pub vertical_tolerance: f64,
    /// Largest displacement accepted before the model is declared unstable
    pub max_displacement: f64,
    /// Last period of the generated spectrum curve
    pub spectrum_t_max: f64,
    /// Eigenvalues below this are rigid-body modes
    pub zero_eigenvalue: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            case_name: "DEAD".to_string(),
            gravity: 9.80665,
            rsa_gravity: 9.81,
            rotational_inertia_factor: 1e-4,
            condensation_penalty: 1e-8,
            eigen_shift: -0.1,
            sentinel_period: 999.99,
            min_clear_length: 1e-9,
            vertical_tolerance: 0.999,
            max_displacement: 1e6,
            spectrum_t_max: 10.0,
            zero_eigenvalue: 1e-6,
        }
    }
}

impl AnalysisOptions {
    /// Options for running a named load case
    pub fn for_case(case_name: &str) -> Self {
        Self::default().with_case(case_name)
    }

    pub fn with_case(mut self, case_name: &str) -> Self {
        self.case_name = case_name.to_string();
        self
    }

    /// Set gravity for mass conversion
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_rsa_gravity(mut self, gravity: f64) -> Self {
        self.rsa_gravity = gravity;
        self
    }

    pub fn with_condensation_penalty(mut self, penalty: f64) -> Self {
        self.condensation_penalty = penalty;
        self
    }

    pub fn with_rotational_inertia(mut self, factor: f64) -> Self {
        self.rotational_inertia_factor = factor;
        self
    }

    pub fn with_eigen_shift(mut self, shift: f64) -> Self {
        self.eigen_shift = shift;
        self
    }

    pub fn with_max_displacement(mut self, limit: f64) -> Self {
        self.max_displacement = limit;
        self
    }
}

/// Run the analysis requested by the selected load case
pub fn run_analysis(model: &ModelInput, options: &AnalysisOptions) -> FrameResult<AnalysisOutput> {
    let start = clock_ms();

    let dm = DataManager::new(model, &options.case_name, options)?;
    let analysis_type = AnalysisType::for_case(dm.load_case())?;
    info!(
        "Running {} for load case '{}' ({} nodes, {} elements)",
        analysis_type.label(),
        dm.load_case().name,
        dm.nodes().len(),
        dm.elements().len()
    );

    let mut output = match analysis_type {
        AnalysisType::LinearStatic => run_linear_static(&dm, options)?,
        AnalysisType::Modal => {
            let case = dm.load_case();
            ModalEngine::new(&dm, options)
                .run(case.num_modes, &case.mass_source)?
                .to_output(&dm)
        }
        AnalysisType::ResponseSpectrum => run_response_spectrum(&dm, options)?,
    };

    let elapsed = (clock_ms() - start) / 1000.0;
    output.info = Some(AnalysisInfo {
        analysis_type: analysis_type.label().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        time_elapsed: format!("{:.4} sec", elapsed),
        dofs: dm.total_dofs(),
        case_name: dm.load_case().name.clone(),
    });

    info!("Analysis completed in {:.4}s", elapsed);
    Ok(output)
}

/// Wall clock in milliseconds; `Instant` is unavailable in the browser
fn clock_ms() -> f64 {
    #[cfg(all(target_arch = "wasm32", feature = "wasm"))]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
    #[cfg(all(target_arch = "wasm32", not(feature = "wasm")))]
    {
        0.0
    }
}

/// Run the analysis and fold any error into a FAILED output
pub fn analyze(model: &ModelInput, options: &AnalysisOptions) -> AnalysisOutput {
    match run_analysis(model, options) {
        Ok(output) => output,
        Err(e) => {
            error!("Analysis failed: {}", e);
            AnalysisOutput::failed(&e)
        }
    }
}

/// Linear static analysis of the case held by `dm`
pub fn run_linear_static(dm: &DataManager, options: &AnalysisOptions) -> FrameResult<AnalysisOutput> {
    let system = GlobalAssembler::new(dm, options).assemble_system()?;
    let solution = LinearSolver::new(dm, &system, options).solve()?;

    let mut output = solution.to_output(dm);
    output.member_forces = Some(member_end_forces(dm, &system.element_matrices, &solution.displacements));
    Ok(output)
}

/// Element matrices `{k, t, fef}` of the selected case, for export
pub fn element_matrices(model: &ModelInput, options: &AnalysisOptions) -> FrameResult<BTreeMap<u32, ElementMatrices>> {
    let dm = DataManager::new(model, &options.case_name, options)?;
    Ok(GlobalAssembler::new(&dm, options).assemble_system()?.element_matrices)
}

fn run_response_spectrum(dm: &DataManager, options: &AnalysisOptions) -> FrameResult<AnalysisOutput> {
    let case = dm.load_case();
    if case.rsa_loads.is_empty() {
        return Err(SolverError::NoSpectrumLoads(case.name.clone()));
    }

    let modal_case = modal_case_for(dm.model(), case);
    info!("Response spectrum: modal basis from case '{}'", modal_case.name);
    let modal = ModalEngine::new(dm, options).run(modal_case.num_modes, &modal_case.mass_source)?;

    let rsa = RsaEngine::new(dm, &modal, options).run(case)?;

    let mut output = modal.to_output(dm);
    rsa.apply_to(&mut output);
    Ok(output)
}

/// Modal case used as the basis of a response spectrum case
fn modal_case_for<'m>(model: &'m ModelInput, case: &'m LoadCase) -> &'m LoadCase {
    case.modal_case
        .as_deref()
        .and_then(|name| model.load_case(name))
        .or_else(|| model.load_cases.iter().find(|c| c.case_type == LoadCaseType::Modal))
        .unwrap_or(case)
}
