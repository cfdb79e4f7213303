use frame_solver::analysis::element_matrices;
use frame_solver::prelude::*;
use frame_solver::results::write_matrices;
use serde_json::Value;

const MODEL: &str = r#"{
    "nodes": [
        {"id": 10, "x": 0.0, "y": 0.0, "z": 0.0, "restraints": [true, true, true, true, true, true]},
        {"id": 20, "x": 0.0, "y": 0.0, "z": 3.0},
        {"id": 30, "x": 5.0, "y": 0.0, "z": 3.0},
        {"id": 40, "x": 5.0, "y": 0.0, "z": 0.0, "restraints": [true, true, true, true, true, true]}
    ],
    "materials": [
        {"name": "C30", "type": "Concrete", "E": 3.2e10, "nu": 0.2, "rho": 25000.0}
    ],
    "sections": [
        {"name": "COL", "mat_name": "C30",
         "properties": {"A": 0.16, "J": 0.0036, "I33": 0.002133, "I22": 0.002133, "As2": 0.1333, "As3": 0.1333}},
        {"name": "BEAM", "mat_name": "C30",
         "properties": {"A": 0.15, "J": 0.0028, "I33": 0.001125, "I22": 0.003125}}
    ],
    "elements": [
        {"id": 1, "n1_id": 10, "n2_id": 20, "sec_name": "COL", "end_off_j": 0.25},
        {"id": 2, "n1_id": 20, "n2_id": 30, "sec_name": "BEAM", "end_off_i": 0.2, "end_off_j": 0.2},
        {"id": 3, "n1_id": 40, "n2_id": 30, "sec_name": "COL", "end_off_j": 0.25}
    ],
    "load_patterns": [
        {"name": "DEAD", "type": "DEAD", "sw_mult": 1.0},
        {"name": "EQX", "type": "QUAKE"}
    ],
    "load_cases": [
        {"name": "DEAD", "type": "Linear Static", "loads": [["DEAD", 1.0]]},
        {"name": "PUSH", "type": "Linear Static", "loads": [["DEAD", 1.0], ["EQX", 1.0]]},
        {"name": "MODAL", "type": "Modal", "num_modes": 6, "mass_source": "MS"},
        {"name": "RSX", "type": "Response Spectrum", "modal_comb": "CQC", "dir_comb": "SRSS",
         "rsa_loads": [["U1", "TSC", 9.81]]},
        {"name": "TH", "type": "Nonlinear Direct Integration History"}
    ],
    "loads": [
        {"type": "member_dist", "pattern": "DEAD", "element_id": 2, "wz": -20000.0},
        {"type": "nodal", "pattern": "EQX", "node_id": 20, "fx": 50000.0},
        {"type": "member_point", "pattern": "DEAD", "element_id": 2, "force": 10000.0,
         "dist": 0.5, "is_rel": true, "dir": "Gravity"}
    ],
    "mass_sources": [
        {"name": "MS", "include_self_mass": true, "include_patterns": true, "load_patterns": [["DEAD", 1.0]]}
    ],
    "functions": [
        {"name": "TSC", "Ss": 1.0, "S1": 0.3, "SiteClass": "ZC", "R": 8.0, "D": 3.0, "I": 1.0}
    ],
    "grid": {"ignored": true}
}"#;

fn model() -> ModelInput {
    ModelInput::from_json_str(MODEL).unwrap()
}

fn run_json(case: &str) -> Value {
    let output = analyze(&model(), &AnalysisOptions::for_case(case));
    serde_json::from_str(&output.to_json().unwrap()).unwrap()
}

#[test]
fn static_case_document_layout() {
    let json = run_json("DEAD");

    assert_eq!(json["status"], "SUCCESS");
    assert!(json.get("error").is_none());
    assert_eq!(json["info"]["type"], "Linear Static");
    assert_eq!(json["info"]["case_name"], "DEAD");
    assert_eq!(json["info"]["dofs"], 24);
    assert!(json["info"]["time_elapsed"].as_str().unwrap().ends_with(" sec"));

    // Node ids become string keys
    let disp = json["displacements"].as_object().unwrap();
    assert_eq!(disp.len(), 4);
    assert_eq!(disp["20"].as_array().unwrap().len(), 6);
    assert!(disp["20"][2].as_f64().unwrap() < 0.0);
    assert!(json["reactions"]["10"][2].as_f64().unwrap() > 0.0);
    assert!(json["member_forces"]["2"]["i_end"].is_array());

    // Vertical equilibrium: self-weight, line load and point load
    let weight = 25000.0 * (0.16 * 3.0 * 2.0 + 0.15 * 5.0);
    let applied = weight + 20000.0 * 5.0 + 10000.0;
    let fz = json["base_reaction"]["Fz"].as_f64().unwrap();
    assert!((fz - applied).abs() < 1e-6 * applied, "Fz = {}, applied = {}", fz, applied);

    for absent in ["tables", "mode_shapes", "rsa_info", "rsa_detailed"] {
        assert!(json.get(absent).is_none(), "{} should be omitted", absent);
    }
}

#[test]
fn lateral_load_produces_overturning_reactions() {
    let json = run_json("PUSH");
    let fx = json["base_reaction"]["Fx"].as_f64().unwrap();
    assert!((fx + 50000.0).abs() < 1e-6 * 50000.0);

    let left = json["reactions"]["10"][2].as_f64().unwrap();
    let right = json["reactions"]["40"][2].as_f64().unwrap();
    assert!(right > left, "push to +X should load the right column");
}

#[test]
fn modal_and_spectrum_documents() {
    let modal = run_json("MODAL");
    assert_eq!(modal["status"], "SUCCESS");
    assert_eq!(modal["tables"]["periods"].as_array().unwrap().len(), 6);
    let row = &modal["tables"]["participation_mass"][0];
    for key in ["Ux", "SumUx", "Uy", "SumUy", "Uz", "SumUz", "Gamma_x", "Gamma_y", "Gamma_z"] {
        assert!(row.get(key).is_some(), "missing {}", key);
    }
    assert!(modal["mode_shapes"]["Mode 1"]["20"].is_array());
    assert!(modal["total_mass"]["x"].as_f64().unwrap() > 0.0);

    let rsa = run_json("RSX");
    assert_eq!(rsa["status"], "SUCCESS");
    assert_eq!(rsa["info"]["type"], "Response Spectrum");
    assert_eq!(rsa["rsa_info"]["method"], "SRSS");
    let rows = rsa["rsa_detailed"]["X"].as_array().unwrap();
    assert_eq!(rows.len(), 6);
    for key in ["mode", "T", "Damping", "SaR_g", "SaR_ms2", "Sd", "Ratio", "V_coeff"] {
        assert!(rows[0].get(key).is_some(), "missing {}", key);
    }
    assert!(rsa["base_shear_coeff"].as_f64().unwrap() > 0.0);
    assert!(rsa["base_reaction"]["Fx"].as_f64().unwrap() > 0.0);
    assert!(rsa["displacements"]["30"][0].as_f64().unwrap() > 0.0);
}

#[test]
fn failures_are_reported_in_the_document() {
    let missing = run_json("WIND");
    assert_eq!(missing["status"], "FAILED");
    assert_eq!(missing["error"]["code"], "E104");
    assert!(!missing["error"]["title"].as_str().unwrap().is_empty());
    assert!(missing.get("displacements").is_none());

    let unsupported = run_json("TH");
    assert_eq!(unsupported["error"]["code"], "E106");

    let err = ModelInput::from_json_str("{ not json").unwrap_err();
    assert_eq!(err.code(), "E102");
}

#[test]
fn bad_references_are_rejected_before_solving() {
    let mut model = model();
    model.elements[1].sec_name = "NOPE".to_string();
    let err = run_analysis(&model, &AnalysisOptions::for_case("DEAD")).unwrap_err();
    assert_eq!(err.code(), "E103");

    let mut model = self::model();
    model.nodes[1].x = 0.0;
    model.nodes[1].z = 0.0;
    let err = run_analysis(&model, &AnalysisOptions::for_case("DEAD")).unwrap_err();
    assert_eq!(err.code(), "E201");
}

#[test]
fn element_matrix_artifact() {
    let model = model();
    let matrices = element_matrices(&model, &AnalysisOptions::for_case("DEAD")).unwrap();
    assert_eq!(matrices.len(), 3);

    let path = std::env::temp_dir().join(format!("frame_solver_matrices_{}.json", std::process::id()));
    write_matrices(&matrices, &path).unwrap();
    let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).ok();

    let beam = &json["2"];
    assert_eq!(beam["k"].as_array().unwrap().len(), 12);
    assert_eq!(beam["k"][0].as_array().unwrap().len(), 12);
    assert_eq!(beam["t"].as_array().unwrap().len(), 12);
    assert_eq!(beam["fef"].as_array().unwrap().len(), 12);
    // Beam carries a gravity line load, so its fixed end forces are non-zero
    assert!(beam["fef"].as_array().unwrap().iter().any(|v| v.as_f64().unwrap().abs() > 0.0));
}
