//! WASM bindings for the frame solver
//!
//! Runs an analysis on a model JSON string directly in the browser and
//! returns the same JSON document the command line solver writes.

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::analysis::{analyze, AnalysisOptions};
use crate::model::ModelInput;
use crate::results::AnalysisOutput;

// Use wee_alloc for smaller WASM binary
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Request accepted by [`analyze_request`]
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub model: ModelInput,
    #[serde(default)]
    pub case: Option<String>,
    #[serde(default)]
    pub options: Option<AnalysisOptions>,
}

impl AnalysisRequest {
    /// Options with the requested case applied on top
    pub fn resolved_options(&self) -> AnalysisOptions {
        let options = self.options.clone().unwrap_or_default();
        match &self.case {
            Some(case) => options.with_case(case),
            None => options,
        }
    }
}

fn to_json(output: &AnalysisOutput) -> String {
    output
        .to_json()
        .unwrap_or_else(|e| format!(r#"{{"status":"FAILED","error":{{"code":"{}","title":"Serialization failed","desc":"","fix":""}}}}"#, e.code()))
}

/// Analyze a model JSON string for one load case
///
/// Returns the result document as JSON; failures are reported in the
/// document's `error` section rather than thrown.
#[wasm_bindgen]
pub fn analyze_json(model_json: &str, case_name: &str) -> String {
    let output = match ModelInput::from_json_str(model_json) {
        Ok(model) => analyze(&model, &AnalysisOptions::for_case(case_name)),
        Err(e) => AnalysisOutput::failed(&e),
    };
    to_json(&output)
}

/// Analyze a `{model, case, options}` request
///
/// This function is designed to be called from a Web Worker.
#[wasm_bindgen]
pub fn analyze_request(request_json: &str) -> String {
    let output = match serde_json::from_str::<AnalysisRequest>(request_json) {
        Ok(request) => analyze(&request.model, &request.resolved_options()),
        Err(e) => AnalysisOutput::failed(&crate::error::SolverError::InvalidJson(e.to_string())),
    };
    to_json(&output)
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
