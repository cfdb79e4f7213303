//! Element library: frame stiffness, transformations, releases and fixed end forces
//!
//! Local DOF order for a frame element is `[u1 u2 u3 r1 r2 r3]` at the i-end
//! followed by the same six at the j-end. Axis 1 runs along the member, I33
//! couples (u2, r3) and I22 couples (u3, r2).

pub mod sparse;

use nalgebra::{DMatrix, DVector, Matrix3, Matrix4, Matrix6, RowVector4, SMatrix, SVector, Vector3};

use crate::elements::SectionProperties;
use crate::error::{FrameResult, SolverError};

pub use sparse::{csr_matvec, SparseCholeskySolver, SparseMatrixBuilder};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Mat6 = Matrix6<f64>;
pub type Vec3 = Vector3<f64>;

/// 12x12 matrix for member stiffness
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for member forces/displacements
pub type Vec12 = SVector<f64, 12>;

/// Shear deformation parameter `12EI / (G As L^2)`, zero without shear area
pub fn shear_parameter(e: f64, g: f64, i: f64, shear_area: f64, length: f64) -> f64 {
    if shear_area > 0.0 && g > 0.0 && length > 0.0 {
        12.0 * e * i / (g * shear_area * length * length)
    } else {
        0.0
    }
}

/// Compute the local Timoshenko stiffness matrix for a 3D frame element
///
/// # Arguments
/// * `e` - Modulus of elasticity
/// * `g` - Shear modulus
/// * `props` - Section properties
/// * `length` - Clear (flexible) length, used for bending and shear
/// * `torsion_length` - Length used for the axial and torsional terms
pub fn member_local_stiffness(e: f64, g: f64, props: &SectionProperties, length: f64, torsion_length: f64) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;

    let ea_l = e * props.a / torsion_length;
    let gj_l = g * props.j / torsion_length;

    // Bending about axis 3 (in the 1-2 plane)
    let phi_y = shear_parameter(e, g, props.i33, props.as2, l);
    let ei33 = e * props.i33;
    let z1 = 12.0 * ei33 / (l3 * (1.0 + phi_y));
    let z2 = 6.0 * ei33 / (l2 * (1.0 + phi_y));
    let z3 = (4.0 + phi_y) * ei33 / (l * (1.0 + phi_y));
    let z4 = (2.0 - phi_y) * ei33 / (l * (1.0 + phi_y));

    // Bending about axis 2 (in the 1-3 plane)
    let phi_z = shear_parameter(e, g, props.i22, props.as3, l);
    let ei22 = e * props.i22;
    let y1 = 12.0 * ei22 / (l3 * (1.0 + phi_z));
    let y2 = 6.0 * ei22 / (l2 * (1.0 + phi_z));
    let y3 = (4.0 + phi_z) * ei22 / (l * (1.0 + phi_z));
    let y4 = (2.0 - phi_z) * ei22 / (l * (1.0 + phi_z));

    #[rustfmt::skip]
    let data = [
        ea_l,  0.0,  0.0,  0.0,   0.0,  0.0,  -ea_l, 0.0,  0.0,  0.0,   0.0,  0.0,
        0.0,   z1,   0.0,  0.0,   0.0,  z2,   0.0,   -z1,  0.0,  0.0,   0.0,  z2,
        0.0,   0.0,  y1,   0.0,   -y2,  0.0,  0.0,   0.0,  -y1,  0.0,   -y2,  0.0,
        0.0,   0.0,  0.0,  gj_l,  0.0,  0.0,  0.0,   0.0,  0.0,  -gj_l, 0.0,  0.0,
        0.0,   0.0,  -y2,  0.0,   y3,   0.0,  0.0,   0.0,  y2,   0.0,   y4,   0.0,
        0.0,   z2,   0.0,  0.0,   0.0,  z3,   0.0,   -z2,  0.0,  0.0,   0.0,  z4,
        -ea_l, 0.0,  0.0,  0.0,   0.0,  0.0,  ea_l,  0.0,  0.0,  0.0,   0.0,  0.0,
        0.0,   -z1,  0.0,  0.0,   0.0,  -z2,  0.0,   z1,   0.0,  0.0,   0.0,  -z2,
        0.0,   0.0,  -y1,  0.0,   y2,   0.0,  0.0,   0.0,  y1,   0.0,   y2,   0.0,
        0.0,   0.0,  0.0,  -gj_l, 0.0,  0.0,  0.0,   0.0,  0.0,  gj_l,  0.0,  0.0,
        0.0,   0.0,  -y2,  0.0,   y4,   0.0,  0.0,   0.0,  y2,   0.0,   y3,   0.0,
        0.0,   z2,   0.0,  0.0,   0.0,  z4,   0.0,   -z2,  0.0,  0.0,   0.0,  z3,
    ];

    Mat12::from_row_slice(&data)
}

/// Compute the 3x3 direction cosine matrix of a frame element
///
/// Rows are the local axes 1, 2 and 3 in global coordinates. The reference
/// vector is global Z, or global X when the member is within
/// `vertical_tolerance` of vertical. `beta` (degrees) rotates axes 2 and 3
/// about axis 1.
pub fn member_rotation_matrix(p1: &Vec3, p2: &Vec3, beta: f64, vertical_tolerance: f64) -> Mat3 {
    let chord = p2 - p1;
    let length = chord.norm();
    if length < 1e-12 {
        return Mat3::identity();
    }
    let vx = chord / length;

    let reference = if vx.z.abs() > vertical_tolerance {
        Vec3::x()
    } else {
        Vec3::z()
    };

    let vy = reference.cross(&vx).normalize();
    let vz = vx.cross(&vy);

    let (s, c) = beta.to_radians().sin_cos();
    let vy_rot = vy * c + vz * s;
    let vz_rot = -vy * s + vz * c;

    Mat3::from_rows(&[vx.transpose(), vy_rot.transpose(), vz_rot.transpose()])
}

/// Expand a 3x3 rotation into the 12x12 element transformation
pub fn expand_rotation(r: &Mat3) -> Mat12 {
    let mut t = Mat12::zeros();
    for i in 0..4 {
        t.fixed_view_mut::<3, 3>(i * 3, i * 3).copy_from(r);
    }
    t
}

fn rigid_link_block(offset: &Vec3) -> Mat6 {
    let (ex, ey, ez) = (offset.x, offset.y, offset.z);
    let mut block = Mat6::identity();
    block[(0, 4)] = ez;
    block[(0, 5)] = -ey;
    block[(1, 3)] = -ez;
    block[(1, 5)] = ex;
    block[(2, 3)] = ey;
    block[(2, 4)] = -ex;
    block
}

/// Rigid-link transformation from node DOFs to member-end DOFs
///
/// `e_i` and `e_j` are the vectors from each node to its member end, in the
/// same axes as the DOFs being transformed. The end translation becomes
/// `u_node + theta x e`.
pub fn eccentricity_matrix(e_i: &Vec3, e_j: &Vec3) -> Mat12 {
    let mut t = Mat12::identity();
    t.fixed_view_mut::<6, 6>(0, 0).copy_from(&rigid_link_block(e_i));
    t.fixed_view_mut::<6, 6>(6, 6).copy_from(&rigid_link_block(e_j));
    t
}

/// Split the 12 local DOFs into (kept, released) index lists
fn partition_dofs(releases: &[bool; 12]) -> (std::vec::Vec<usize>, std::vec::Vec<usize>) {
    (0..12).partition(|&i| !releases[i])
}

/// Invert the released-DOF block, rejecting singular configurations
fn invert_released_block(k: &Mat12, released: &[usize]) -> FrameResult<Mat> {
    let n = released.len();
    let k_cc = Mat::from_fn(n, n, |i, j| k[(released[i], released[j])]);

    let lu = k_cc.clone().lu();
    let pivots = lu.u().diagonal();
    let max_pivot = pivots.iter().fold(0.0_f64, |m, p| m.max(p.abs()));
    let min_pivot = pivots.iter().fold(f64::INFINITY, |m, p| m.min(p.abs()));
    if max_pivot == 0.0 || min_pivot <= 1e-12 * max_pivot {
        return Err(SolverError::UnstableRelease(format!(
            "released DOFs {:?} leave no stiffness to condense against",
            released
        )));
    }

    match lu.try_inverse() {
        Some(inv) if inv.iter().all(|v| v.is_finite()) => Ok(inv),
        _ => Err(SolverError::UnstableRelease(format!(
            "released DOF block {:?} is singular",
            released
        ))),
    }
}

/// Apply static condensation for released DOFs
///
/// Computes `K_rr - K_rc K_cc^-1 K_cr` and expands it back to 12x12. Released
/// rotational DOFs receive `penalty_factor * max|k|` on their diagonal so the
/// global matrix stays non-singular when every member at a joint is pinned.
///
/// # Arguments
/// * `k` - Full stiffness matrix
/// * `releases` - Boolean array indicating which DOFs are released
/// * `penalty_factor` - Relative stiffness left on released rotations
pub fn condense_stiffness(k: &Mat12, releases: &[bool; 12], penalty_factor: f64) -> FrameResult<Mat12> {
    let (kept, released) = partition_dofs(releases);

    if released.is_empty() {
        return Ok(*k);
    }

    let n1 = kept.len();
    let n2 = released.len();

    let k11 = Mat::from_fn(n1, n1, |i, j| k[(kept[i], kept[j])]);
    let k12 = Mat::from_fn(n1, n2, |i, j| k[(kept[i], released[j])]);
    let k21 = Mat::from_fn(n2, n1, |i, j| k[(released[i], kept[j])]);
    let k22_inv = invert_released_block(k, &released)?;

    let k_condensed = &k11 - &k12 * &k22_inv * &k21;

    let mut k_result = Mat12::zeros();
    for (i, &ui) in kept.iter().enumerate() {
        for (j, &uj) in kept.iter().enumerate() {
            k_result[(ui, uj)] = k_condensed[(i, j)];
        }
    }

    let penalty = penalty_factor * k.amax();
    for &dof in &released {
        if matches!(dof, 3 | 4 | 5 | 9 | 10 | 11) {
            k_result[(dof, dof)] += penalty;
        }
    }

    Ok(k_result)
}

/// Apply static condensation to a fixed end force vector
///
/// `fef_k - K_kc K_cc^-1 fef_c` on the kept DOFs, zero on released DOFs.
/// `k` must be the uncondensed local stiffness.
pub fn condense_fef(k: &Mat12, fef: &Vec12, releases: &[bool; 12]) -> FrameResult<Vec12> {
    let (kept, released) = partition_dofs(releases);

    if released.is_empty() {
        return Ok(*fef);
    }

    let n1 = kept.len();
    let n2 = released.len();

    let k12 = Mat::from_fn(n1, n2, |i, j| k[(kept[i], released[j])]);
    let k22_inv = invert_released_block(k, &released)?;
    let fef1 = Vec::from_fn(n1, |i, _| fef[kept[i]]);
    let fef2 = Vec::from_fn(n2, |i, _| fef[released[i]]);

    let fef_condensed = &fef1 - &k12 * (&k22_inv * &fef2);

    let mut fef_result = Vec12::zeros();
    for (i, &ui) in kept.iter().enumerate() {
        fef_result[ui] = fef_condensed[i];
    }

    Ok(fef_result)
}

/// Fixed end forces for a uniform load over the full clear length
///
/// # Arguments
/// * `w` - Load intensity along local axes 1, 2 and 3
/// * `length` - Clear length
pub fn fef_uniform_load(w: &Vec3, length: f64) -> Vec12 {
    let l = length;
    let l2 = l * l;

    let mut fef = Vec12::zeros();

    fef[0] = -w.x * l / 2.0;
    fef[6] = -w.x * l / 2.0;

    fef[1] = -w.y * l / 2.0;
    fef[5] = -w.y * l2 / 12.0;
    fef[7] = -w.y * l / 2.0;
    fef[11] = w.y * l2 / 12.0;

    fef[2] = -w.z * l / 2.0;
    fef[4] = w.z * l2 / 12.0;
    fef[8] = -w.z * l / 2.0;
    fef[10] = -w.z * l2 / 12.0;

    fef
}

/// Timoshenko beam interpolation at a point `a` along the span
///
/// Solves `A c = [v_i, theta_i, v_j, theta_j]` for the cubic deflection
/// coefficients, where `omega = phi L^2 / 12` couples shear into the rotation.
/// Returns the displacement and rotation interpolation rows at `a`. A singular
/// system gives zeros.
pub fn timoshenko_point_shape(length: f64, a: f64, omega: f64) -> ([f64; 4], [f64; 4]) {
    let l = length;

    #[rustfmt::skip]
    let system = Matrix4::new(
        1.0, 0.0, 0.0,     0.0,
        0.0, 1.0, 0.0,     -6.0 * omega,
        1.0, l,   l * l,   l * l * l,
        0.0, 1.0, 2.0 * l, 3.0 * l * l - 6.0 * omega,
    );

    let Some(inv) = system.try_inverse() else {
        return ([0.0; 4], [0.0; 4]);
    };

    let n = RowVector4::new(1.0, a, a * a, a * a * a) * inv;
    let n_theta = RowVector4::new(0.0, 1.0, 2.0 * a, 3.0 * a * a - 6.0 * omega) * inv;

    ([n[0], n[1], n[2], n[3]], [n_theta[0], n_theta[1], n_theta[2], n_theta[3]])
}

/// Shear coupling terms for the (1-2, 1-3) bending planes
fn shear_omegas(e: f64, g: f64, props: &SectionProperties, length: f64) -> (f64, f64) {
    let l2 = length * length;
    let omega_y = shear_parameter(e, g, props.i33, props.as2, length) * l2 / 12.0;
    let omega_z = shear_parameter(e, g, props.i22, props.as3, length) * l2 / 12.0;
    (omega_y, omega_z)
}

/// Fixed end forces for a concentrated force at distance `a` from the i-end
///
/// # Arguments
/// * `p` - Force components along local axes 1, 2 and 3
/// * `a` - Distance from the start of the clear span
/// * `length` - Clear length
pub fn fef_point_force(p: &Vec3, a: f64, length: f64, e: f64, g: f64, props: &SectionProperties) -> Vec12 {
    let mut fef = Vec12::zeros();
    let ratio = a / length;

    fef[0] = -p.x * (1.0 - ratio);
    fef[6] = -p.x * ratio;

    let (omega_y, omega_z) = shear_omegas(e, g, props, length);

    let (n, _) = timoshenko_point_shape(length, a, omega_y);
    fef[1] = -p.y * n[0];
    fef[5] = -p.y * n[1];
    fef[7] = -p.y * n[2];
    fef[11] = -p.y * n[3];

    // Rotation about axis 2 is -dw/dx
    let (n, _) = timoshenko_point_shape(length, a, omega_z);
    fef[2] = -p.z * n[0];
    fef[4] = p.z * n[1];
    fef[8] = -p.z * n[2];
    fef[10] = p.z * n[3];

    fef
}

/// Fixed end forces for a concentrated couple at distance `a` from the i-end
///
/// # Arguments
/// * `m` - Moment components about local axes 1, 2 and 3
/// * `a` - Distance from the start of the clear span
/// * `length` - Clear length
pub fn fef_point_moment(m: &Vec3, a: f64, length: f64, e: f64, g: f64, props: &SectionProperties) -> Vec12 {
    let mut fef = Vec12::zeros();
    let ratio = a / length;

    fef[3] = -m.x * (1.0 - ratio);
    fef[9] = -m.x * ratio;

    let (omega_y, omega_z) = shear_omegas(e, g, props, length);

    let (_, n_theta) = timoshenko_point_shape(length, a, omega_y);
    fef[1] = -m.z * n_theta[0];
    fef[5] = -m.z * n_theta[1];
    fef[7] = -m.z * n_theta[2];
    fef[11] = -m.z * n_theta[3];

    let (_, n_theta) = timoshenko_point_shape(length, a, omega_z);
    fef[2] = m.y * n_theta[0];
    fef[4] = -m.y * n_theta[1];
    fef[8] = m.y * n_theta[2];
    fef[10] = -m.y * n_theta[3];

    fef
}
