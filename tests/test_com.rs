use approx::assert_abs_diff_eq;
use kinetree::{
    compute_com, dof_to_vector, euler_integration, forward_kinematics, forward_velocity, s_compute_com, Body,
    CoMJacobianDummy, Joint, JointType, MultiBody, MultiBodyConfig, MultiBodyGraph, PTransform, PreconditionViolation,
    RBInertia,
};
use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_8};

const TOLERANCE: f64 = 1e-6;

fn body(mass: f64, id: i32) -> Body {
    Body::new(RBInertia::new(mass, Vector3::zeros(), Matrix3::identity()), id, format!("b{id}"))
}

fn translation(x: f64, y: f64, z: f64) -> PTransform {
    PTransform::from_translation(Vector3::new(x, y, z))
}

//  Root     j0      j1     j2
//  ---- b0 ---- b1 ---- b2 ----b3
//  Fixed    RevX   RevY    RevZ
fn chain() -> MultiBody {
    let mut graph = MultiBodyGraph::new();
    for (id, mass) in [1.0, 1.0, 2.0, 1.0].into_iter().enumerate() {
        graph.add_body(body(mass, id as i32)).unwrap();
    }
    graph.add_joint(Joint::new(JointType::RevoluteX, true, 0, "j0")).unwrap();
    graph.add_joint(Joint::new(JointType::RevoluteY, true, 1, "j1")).unwrap();
    graph.add_joint(Joint::new(JointType::RevoluteZ, true, 2, "j2")).unwrap();

    let to = translation(0.0, 0.5, 0.0);
    let from = PTransform::identity();
    graph.link_bodies(0, to, 1, from, 0).unwrap();
    graph.link_bodies(1, to, 2, from, 1).unwrap();
    graph.link_bodies(2, to, 3, from, 2).unwrap();
    graph.make_multibody(0, true).unwrap()
}

//                b4
//             j3 | Spherical
//  Root     j0   |   j1     j2
//  ---- b0 ---- b1 ---- b2 ----b3
//  Fixed    RevX   RevY    RevZ
fn tree(fixed_base: bool) -> MultiBody {
    let mut graph = MultiBodyGraph::new();
    for (id, mass) in [2.0, 3.5, 1.2, 4.0, 0.7].into_iter().enumerate() {
        graph.add_body(body(mass, id as i32)).unwrap();
    }
    graph.add_joint(Joint::new(JointType::RevoluteX, true, 0, "j0")).unwrap();
    graph.add_joint(Joint::new(JointType::RevoluteY, true, 1, "j1")).unwrap();
    graph.add_joint(Joint::new(JointType::RevoluteZ, true, 2, "j2")).unwrap();
    graph.add_joint(Joint::new(JointType::Spherical, true, 3, "j3")).unwrap();

    let to = translation(0.0, 0.5, 0.0);
    let from = translation(0.0, -0.5, 0.0);
    graph.link_bodies(0, to, 1, from, 0).unwrap();
    graph.link_bodies(1, to, 2, from, 1).unwrap();
    graph.link_bodies(2, to, 3, from, 2).unwrap();
    graph
        .link_bodies(1, translation(0.5, 0.0, 0.0), 4, translation(-0.5, 0.0, 0.0), 3)
        .unwrap();
    graph.make_multibody(0, fixed_base).unwrap()
}

/// CoM velocity estimated by integrating the configuration over a small step
fn com_velocity_from_step(mb: &MultiBody, mbc: &MultiBodyConfig) -> Vector3<f64> {
    let step = 1e-8;
    let mut next = mbc.clone();

    let before = compute_com(mb, &next);
    euler_integration(mb, &mut next, step);
    forward_kinematics(mb, &mut next);
    forward_velocity(mb, &mut next);
    let after = compute_com(mb, &next);

    (after - before) / step
}

/// Compares the Jacobian with finite differences, first for every single dof and then with the dof
/// switched on one after another.
fn check_jacobian(mb: &MultiBody, mbc: &mut MultiBodyConfig, jacobian: &mut CoMJacobianDummy, checked: bool) {
    for accumulate in [false, true] {
        for i in 0..mb.nr_joints() {
            for k in 0..mb.joint(i).dof() {
                mbc.alpha[i][k] = 1.0;
                forward_velocity(mb, mbc);

                let expected = com_velocity_from_step(mb, mbc);
                let matrix = if checked {
                    jacobian.s_jacobian(mb, mbc).unwrap()
                } else {
                    jacobian.jacobian(mb, mbc)
                };
                assert_eq!(matrix.nrows(), 6);
                assert_eq!(matrix.ncols(), mb.nr_dof());

                let velocity = matrix.rows(3, 3) * dof_to_vector(mb, &mbc.alpha);
                assert_abs_diff_eq!(velocity[0], expected.x, epsilon = TOLERANCE);
                assert_abs_diff_eq!(velocity[1], expected.y, epsilon = TOLERANCE);
                assert_abs_diff_eq!(velocity[2], expected.z, epsilon = TOLERANCE);

                if !accumulate {
                    mbc.alpha[i][k] = 0.0;
                }
            }
        }
        mbc.alpha = mb.joints().iter().map(Joint::zero_dof).collect();
    }
}

fn quaternion(angle: f64, axis: &nalgebra::Unit<Vector3<f64>>) -> Vec<f64> {
    let q = UnitQuaternion::from_axis_angle(axis, angle);
    vec![q.w, q.i, q.j, q.k]
}

#[test_log::test]
fn test_compute_com() {
    let mb = chain();
    let mut mbc = MultiBodyConfig::new(&mb);

    mbc.q = vec![vec![], vec![0.0], vec![0.0], vec![0.0]];
    forward_kinematics(&mb, &mut mbc);
    let expected = Vector3::new(0.0, (0.5 * 1.0 + 1.0 * 2.0 + 1.5 * 1.0) / 4.0, 0.0);
    assert_abs_diff_eq!(compute_com(&mb, &mbc), expected, epsilon = 1e-12);

    mbc.q = vec![vec![], vec![FRAC_PI_2], vec![0.0], vec![0.0]];
    forward_kinematics(&mb, &mut mbc);
    let expected = Vector3::new(
        0.0,
        (0.5 * 1.0 + 0.5 * 2.0 + 0.5 * 1.0) / 4.0,
        (0.5 * 2.0 + 1.0 * 1.0) / 4.0,
    );
    assert_abs_diff_eq!(s_compute_com(&mb, &mbc).unwrap(), expected, epsilon = 1e-12);

    mbc.body_pos_w = vec![PTransform::identity(); 3];
    assert_eq!(
        s_compute_com(&mb, &mbc),
        Err(PreconditionViolation::BodyCountMismatch {
            name: "body_pos_w",
            expected: 4,
            actual: 3
        })
    );
}

#[test_log::test]
fn test_com_jacobian() {
    let mb = tree(true);
    let mut jacobian = CoMJacobianDummy::new(&mb);
    let mut mbc = MultiBodyConfig::new(&mb);

    mbc.q = vec![vec![], vec![0.0], vec![0.0], vec![0.0], vec![1.0, 0.0, 0.0, 0.0]];
    forward_kinematics(&mb, &mut mbc);
    check_jacobian(&mb, &mut mbc, &mut jacobian, false);

    mbc.q = vec![
        vec![],
        vec![0.4],
        vec![0.2],
        vec![-0.1],
        quaternion(FRAC_PI_8, &Vector3::z_axis()),
    ];
    forward_kinematics(&mb, &mut mbc);
    check_jacobian(&mb, &mut mbc, &mut jacobian, true);

    mbc.body_pos_w = vec![PTransform::identity(); 3];
    assert!(matches!(
        jacobian.s_jacobian(&mb, &mbc),
        Err(PreconditionViolation::BodyCountMismatch { .. })
    ));
}

#[test_log::test]
fn test_com_jacobian_floating_base() {
    let mb = tree(false);
    assert_eq!(mb.nr_dof(), 12);
    let mut jacobian = CoMJacobianDummy::new(&mb);
    let mut mbc = MultiBodyConfig::new(&mb);

    let mut root = quaternion(0.6, &nalgebra::Unit::new_normalize(Vector3::new(1.0, -2.0, 0.5)));
    root.extend([0.3, -0.2, 1.0]);
    mbc.q = vec![
        root,
        vec![-0.3],
        vec![1.1],
        vec![0.25],
        quaternion(-0.9, &Vector3::x_axis()),
    ];
    forward_kinematics(&mb, &mut mbc);
    check_jacobian(&mb, &mut mbc, &mut jacobian, true);
}

#[test]
fn test_jacobian_of_welded_mechanism_is_zero() {
    // every body is welded to the fixed root
    let mut graph = MultiBodyGraph::new();
    graph.add_body(body(1.0, 0)).unwrap();
    graph.add_body(body(1.0, 1)).unwrap();
    graph.add_joint(Joint::new(JointType::Fixed, true, 0, "weld")).unwrap();
    graph
        .link_bodies(0, translation(1.0, 0.0, 0.0), 1, PTransform::identity(), 0)
        .unwrap();
    let mb = graph.make_multibody(0, true).unwrap();
    assert_eq!(mb.nr_bodies(), 1);
    assert_eq!(mb.nr_dof(), 0);

    let mbc = MultiBodyConfig::new(&mb);
    let mut jacobian = CoMJacobianDummy::new(&mb);
    assert_eq!(jacobian.jacobian(&mb, &mbc).shape(), (6, 0));
    assert_eq!(s_compute_com(&mb, &mbc), Err(PreconditionViolation::NonPositiveMass(0.0)));
}
