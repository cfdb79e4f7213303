use approx::assert_relative_eq;
use frame_solver::analysis::{DataManager, GlobalAssembler, ModalEngine, ModalResults, SpectrumGenerator};
use frame_solver::math::csr_matvec;
use frame_solver::prelude::*;

const E: f64 = 2.0e11;
const GAMMA: f64 = 78_500.0;
const G: f64 = 9.80665;
const HEIGHT: f64 = 3.0;
const SIDE: f64 = 0.4;

fn square_column() -> Section {
    let rect = Section::rectangular("C40", "Steel", SIDE, SIDE);
    Section::new("C40", "Steel", rect.properties.without_shear_deformation())
}

/// Single fixed-base column; all of its free mass sits at the top node
fn column_model() -> ModelInput {
    let mut model = ModelInput::new();
    model.add_material(Material::isotropic("Steel", E, 0.3, GAMMA));
    model.add_section(square_column()).unwrap();
    model.add_node(Node::new(1, 0.0, 0.0, 0.0).fixed()).unwrap();
    model.add_node(Node::new(2, 0.0, 0.0, HEIGHT)).unwrap();
    model.add_element(FrameElement::new(1, 1, 2, "C40")).unwrap();

    model.add_load_case(LoadCase::modal("MODAL", 4));
    model.add_function(SpectrumFunction::tsc2018("TSC", 1.0, 0.3, SiteClass::ZC, 8.0, 3.0, 1.0));
    model.add_load_case(
        LoadCase::response_spectrum("RSX", ModalCombination::CQC, DirectionalCombination::SRSS)
            .with_rsa_load(ExcitationDirection::U1, "TSC", 9.81),
    );
    model
}

/// Two-story, one-bay space frame with slab load converted to mass
fn space_frame() -> ModelInput {
    let mut model = ModelInput::new();
    model.add_material(Material::isotropic("Steel", E, 0.3, GAMMA));
    model.add_section(Section::rectangular("COL", "Steel", 0.4, 0.4)).unwrap();
    model.add_section(Section::rectangular("BEAM", "Steel", 0.3, 0.6)).unwrap();

    let corners = [(0.0, 0.0), (6.0, 0.0), (6.0, 5.0), (0.0, 5.0)];
    for level in 0..3u32 {
        for (k, &(x, y)) in corners.iter().enumerate() {
            let node = Node::new(level * 4 + k as u32 + 1, x, y, level as f64 * HEIGHT);
            model.add_node(if level == 0 { node.fixed() } else { node }).unwrap();
        }
    }

    let mut id = 1;
    for level in 0..2u32 {
        for k in 0..4u32 {
            let bottom = level * 4 + k + 1;
            model.add_element(FrameElement::new(id, bottom, bottom + 4, "COL")).unwrap();
            id += 1;
        }
    }
    for level in 1..3u32 {
        for k in 0..4u32 {
            let a = level * 4 + k + 1;
            let b = level * 4 + (k + 1) % 4 + 1;
            model.add_element(FrameElement::new(id, a, b, "BEAM")).unwrap();
            model.add_load(MemberDistributedLoad::gravity("SDL", id, 15_000.0));
            id += 1;
        }
    }

    model.add_load_pattern(LoadPattern::new("SDL", "SUPERDEAD", 0.0));
    model.add_mass_source(MassSource::new("MS").with_pattern("SDL", 1.0));
    model.add_load_case(LoadCase::modal("MODAL", 12).with_mass_source("MS"));
    model.add_function(SpectrumFunction::tsc2018("TSC", 1.2, 0.35, SiteClass::ZD, 8.0, 3.0, 1.0));
    model.add_load_case(
        LoadCase::response_spectrum("RSXY", ModalCombination::CQC, DirectionalCombination::SRSS)
            .with_rsa_load(ExcitationDirection::U1, "TSC", 9.81)
            .with_rsa_load(ExcitationDirection::U2, "TSC", 9.81),
    );
    model
}

fn modal_results(model: &ModelInput, case: &str) -> (ModalResults, AnalysisOptions) {
    let options = AnalysisOptions::for_case(case);
    let dm = DataManager::new(model, case, &options).unwrap();
    let lc = dm.load_case();
    let results = ModalEngine::new(&dm, &options).run(lc.num_modes, &lc.mass_source).unwrap();
    (results, options)
}

#[test]
fn column_fundamental_period_matches_lumped_mass_estimate() {
    let model = column_model();
    let (modal, _) = modal_results(&model, "MODAL");

    let i = SIDE.powi(4) / 12.0;
    let tip_mass = SIDE * SIDE * GAMMA / G * HEIGHT / 2.0;
    let omega = (3.0 * E * i / HEIGHT.powi(3) / tip_mass).sqrt();

    // Two equal lateral modes come first
    assert_relative_eq!(modal.modes[0].omega, omega, max_relative = 1e-3);
    assert_relative_eq!(modal.modes[1].omega, omega, max_relative = 1e-3);
    assert_relative_eq!(modal.modes[0].period, 2.0 * std::f64::consts::PI / omega, max_relative = 1e-3);
    assert_relative_eq!(modal.total_mass[0], tip_mass, max_relative = 1e-12);
}

#[test]
fn mode_count_is_capped_by_free_dofs() {
    let mut model = column_model();
    model.load_cases[0].num_modes = 12;
    let (modal, _) = modal_results(&model, "MODAL");
    // Six free DOFs leave room for four modes
    assert_eq!(modal.num_modes(), 4);
}

#[test]
fn mode_shapes_are_mass_and_stiffness_orthogonal() {
    let model = space_frame();
    let (modal, options) = modal_results(&model, "MODAL");
    let dm = DataManager::new(&model, "MODAL", &options).unwrap();
    let (k, _) = GlobalAssembler::new(&dm, &options).assemble_stiffness().unwrap();

    assert_eq!(modal.num_modes(), 12);
    let m = &modal.mass.diag;
    for a in &modal.modes {
        let k_phi = csr_matvec(&k, &a.shape);
        for b in &modal.modes {
            let m_ab: f64 = a.shape.iter().zip(b.shape.iter()).zip(m.iter()).map(|((x, y), w)| x * y * w).sum();
            let k_ab = b.shape.dot(&k_phi);
            if a.mode == b.mode {
                assert_relative_eq!(m_ab, 1.0, max_relative = 1e-8);
                assert_relative_eq!(k_ab, a.eigenvalue, max_relative = 1e-6);
            } else {
                assert!(m_ab.abs() < 1e-8, "modes {} and {}: phi'M phi = {}", a.mode, b.mode, m_ab);
                assert!(k_ab.abs() < 1e-6 * a.eigenvalue.max(b.eigenvalue));
            }
        }
    }
}

#[test]
fn periods_descend_and_participation_accumulates() {
    let model = space_frame();
    let (modal, _) = modal_results(&model, "MODAL");

    for pair in modal.modes.windows(2) {
        assert!(pair[0].eigenvalue <= pair[1].eigenvalue);
        assert!(pair[0].period >= pair[1].period);
    }

    let rows = modal.participation_rows();
    let mut previous = [0.0; 3];
    for row in &rows {
        let sums = [row.sum_ux, row.sum_uy, row.sum_uz];
        for d in 0..3 {
            assert!(sums[d] >= previous[d] - 1e-12);
            assert!(sums[d] <= 1.0 + 1e-9, "cumulative ratio above one: {}", sums[d]);
        }
        previous = sums;
    }
    // The lateral modes of a regular two-story frame carry most of the mass
    assert!(previous[0] > 0.9 && previous[1] > 0.9, "sums {:?}", previous);
}

#[test]
fn complete_mode_set_recovers_total_mass() {
    // Two-segment column; without rotary inertia only the six translations carry mass
    let mut model = column_model();
    model.add_node(Node::new(3, 0.0, 0.0, 2.0 * HEIGHT)).unwrap();
    model.add_element(FrameElement::new(2, 2, 3, "C40")).unwrap();
    model.load_cases[0].num_modes = 12;

    let options = AnalysisOptions::for_case("MODAL").with_rotational_inertia(0.0);
    let dm = DataManager::new(&model, "MODAL", &options).unwrap();
    let lc = dm.load_case();
    let modal = ModalEngine::new(&dm, &options).run(lc.num_modes, &lc.mass_source).unwrap();
    assert_eq!(modal.num_modes(), 6);

    let rows = modal.participation_rows();
    let last = rows.last().unwrap();
    for (d, sum) in [last.sum_ux, last.sum_uy, last.sum_uz].into_iter().enumerate() {
        assert!(sum <= 1.0 + 1e-9, "axis {} sums to {}", d, sum);
        assert_relative_eq!(sum, 1.0, max_relative = 1e-8);
    }

    let m = &modal.mass.diag;
    for d in 0..3 {
        let gamma_sq: f64 = modal.modes.iter().map(|mode| mode.gamma[d] * mode.gamma[d]).sum();
        assert_relative_eq!(gamma_sq, 1.0, max_relative = 1e-8);

        // Squared modal excitation factors of unit-mass modes add up to the mass
        let excited: f64 = modal
            .modes
            .iter()
            .map(|mode| {
                let l: f64 = (0..m.len()).filter(|i| i % 6 == d).map(|i| m[i] * mode.shape[i]).sum();
                l * l
            })
            .sum();
        assert_relative_eq!(excited, modal.total_mass[d], max_relative = 1e-8);
    }
}

#[test]
fn modal_output_sections() {
    let model = space_frame();
    let output = run_analysis(&model, &AnalysisOptions::for_case("MODAL")).unwrap();

    let tables = output.tables.as_ref().unwrap();
    assert_eq!(tables.periods.len(), 12);
    assert_eq!(tables.participation_mass.len(), 12);
    let shapes = output.mode_shapes.as_ref().unwrap();
    assert!(shapes.contains_key("Mode 1") && shapes.contains_key("Mode 12"));
    // Restrained base nodes do not move
    assert_eq!(shapes["Mode 1"][&1], [0.0; 6]);

    let total = output.total_mass.unwrap();
    let assembled = output.assembled_mass.as_ref().unwrap();
    let free_mass: f64 = assembled.iter().filter(|&(&id, _)| id > 4).map(|(_, m)| m[0]).sum();
    assert_relative_eq!(total.x, free_mass, max_relative = 1e-12);
    assert_eq!(output.info.unwrap().analysis_type, "Modal Analysis");
    assert!(output.displacements.is_none());
}

#[test]
fn column_spectrum_response_matches_single_mode() {
    let model = column_model();
    let output = run_analysis(&model, &AnalysisOptions::for_case("RSX")).unwrap();
    let (modal, options) = modal_results(&model, "MODAL");

    let function = model.function("TSC").unwrap();
    let spectrum = SpectrumGenerator::new(function, options.spectrum_t_max);
    let first = &modal.modes[0];
    let sa = spectrum.spectral_acceleration(first.period);

    // The two lateral modes are fully correlated and share the whole mass
    let coeff = output.base_shear_coeff.unwrap();
    assert_relative_eq!(coeff, sa, max_relative = 1e-2);

    let base = output.base_reaction.unwrap();
    let total = output.total_mass.unwrap();
    assert_relative_eq!(base.fx, coeff * total.x * 9.81, max_relative = 1e-12);
    assert_eq!(base.fy, 0.0);

    let sd = sa * 9.81 / (first.omega * first.omega);
    let tip = output.displacements.as_ref().unwrap()[&2];
    assert_relative_eq!(tip[0], sd / total.x.sqrt(), max_relative = 1e-2);
    assert!(tip[1].abs() < 1e-3 * tip[0]);

    let detailed = output.rsa_detailed.as_ref().unwrap();
    let rows = &detailed["X"];
    assert_eq!(rows.len(), 4);
    assert_relative_eq!(rows[0].sa_g, sa, max_relative = 1e-12);
    assert_relative_eq!(rows[0].sa_ms2, sa * 9.81, max_relative = 1e-12);
    assert_eq!(rows[0].damping, 0.05);
}

#[test]
fn zero_scale_falls_back_to_gravity() {
    let model = column_model();
    let mut unscaled = model.clone();
    unscaled.load_cases[1].rsa_loads[0].2 = 0.0;

    let a = run_analysis(&model, &AnalysisOptions::for_case("RSX")).unwrap();
    let b = run_analysis(&unscaled, &AnalysisOptions::for_case("RSX")).unwrap();
    assert_relative_eq!(
        a.displacements.as_ref().unwrap()[&2][0],
        b.displacements.as_ref().unwrap()[&2][0],
        max_relative = 1e-12
    );
    assert_relative_eq!(a.base_reaction.unwrap().fx, b.base_reaction.unwrap().fx, max_relative = 1e-12);
    assert_relative_eq!(a.base_shear_coeff.unwrap(), b.base_shear_coeff.unwrap(), max_relative = 1e-12);
}

#[test]
fn spectrum_scale_moves_shear_and_displacement_together() {
    let model = column_model();
    let mut doubled = model.clone();
    doubled.load_cases[1].rsa_loads[0].2 = 19.62;

    let one_g = run_analysis(&model, &AnalysisOptions::for_case("RSX")).unwrap();
    let two_g = run_analysis(&doubled, &AnalysisOptions::for_case("RSX")).unwrap();

    let ux = |o: &AnalysisOutput| o.displacements.as_ref().unwrap()[&2][0];
    assert_relative_eq!(ux(&two_g), 2.0 * ux(&one_g), max_relative = 1e-12);
    assert_relative_eq!(
        two_g.base_reaction.unwrap().fx,
        2.0 * one_g.base_reaction.unwrap().fx,
        max_relative = 1e-12
    );
    assert_relative_eq!(two_g.base_shear_coeff.unwrap(), 2.0 * one_g.base_shear_coeff.unwrap(), max_relative = 1e-12);

    let (a, b) = (&one_g.rsa_detailed.as_ref().unwrap()["X"][0], &two_g.rsa_detailed.as_ref().unwrap()["X"][0]);
    assert_relative_eq!(b.sa_ms2, 2.0 * a.sa_ms2, max_relative = 1e-12);
    assert_relative_eq!(b.sd, 2.0 * a.sd, max_relative = 1e-12);
    assert_relative_eq!(b.v_coeff, 2.0 * a.v_coeff, max_relative = 1e-12);
}

#[test]
fn two_direction_spectrum_combination() {
    let model = space_frame();
    let srss = run_analysis(&model, &AnalysisOptions::for_case("RSXY")).unwrap();

    let mut abs_model = model.clone();
    abs_model.load_cases[1].dir_comb = DirectionalCombination::Absolute;
    let abs = run_analysis(&abs_model, &AnalysisOptions::for_case("RSXY")).unwrap();

    let base = srss.base_reaction.unwrap();
    assert!(base.fx > 0.0 && base.fy > 0.0);
    assert_eq!(base.mx, 0.0);

    let detailed = srss.rsa_detailed.as_ref().unwrap();
    assert!(detailed.contains_key("X") && detailed.contains_key("Y"));
    let summary = srss.rsa_summary.as_ref().unwrap();
    assert_eq!(summary.len(), 2);

    // Directional SRSS of the per-direction coefficients
    let cx = summary[0].value;
    let cy = summary[1].value;
    assert_relative_eq!(srss.base_shear_coeff.unwrap(), (cx * cx + cy * cy).sqrt(), max_relative = 1e-12);
    assert_relative_eq!(abs.base_shear_coeff.unwrap(), cx + cy, max_relative = 1e-12);
    assert_eq!(srss.rsa_info.as_ref().unwrap().method, "SRSS");
    assert_eq!(abs.rsa_info.as_ref().unwrap().method, "ABS");

    // Roof displacement never decreases from SRSS to the absolute sum
    let top_srss = srss.displacements.as_ref().unwrap()[&9];
    let top_abs = abs.displacements.as_ref().unwrap()[&9];
    for k in 0..6 {
        assert!(top_abs[k] >= top_srss[k] - 1e-15);
    }
}

#[test]
fn spectrum_case_errors() {
    let mut model = column_model();
    model.load_cases[1].rsa_loads[0].1 = "MISSING".to_string();
    let err = run_analysis(&model, &AnalysisOptions::for_case("RSX")).unwrap_err();
    assert_eq!(err.code(), "E107");

    model.load_cases[1].rsa_loads.clear();
    let err = run_analysis(&model, &AnalysisOptions::for_case("RSX")).unwrap_err();
    assert_eq!(err.code(), "E108");
}
