use nalgebra::Vector3;

use crate::jacobian::{JacobianSolver, Step};
use crate::utils::{dump_joints, dump_position};

/// Planar arm with two unit links rotating about Z. The end effector offset (2, 0, 0) is
/// given in the shoulder frame; the elbow pivots at (1, 0, 0).
pub(crate) fn two_link_arm() -> JacobianSolver {
    let mut arm = JacobianSolver::new(2);
    arm.push_rot_v(0, 0.0, 0.0, 1.0).unwrap();
    arm.push_trans_c(1.0, 0.0, 0.0).unwrap();
    arm.push_rot_v(1, 0.0, 0.0, 1.0).unwrap();
    arm.push_trans_c(-1.0, 0.0, 0.0).unwrap();
    arm.set_init_vec(2.0, 0.0, 0.0).unwrap();
    arm
}

/// Leg-like chain in 3D: hip swings about X and Y, knee about X, with a fixed tilt
/// between the hip and the thigh.
pub(crate) fn leg() -> JacobianSolver {
    let mut leg = JacobianSolver::new(3);
    leg.push_trans_c(0.1, -1.4, 0.0).unwrap();
    leg.push_rot_v(0, 1.0, 0.0, 0.0).unwrap();
    leg.push_rot_v(1, 0.0, 1.0, 0.0).unwrap();
    leg.push_rot_c(15.0, 0.0, 0.0, 1.0).unwrap();
    leg.push_trans_c(0.0, -1.6, 0.0).unwrap();
    leg.push_rot_v(2, 1.0, 0.0, 0.0).unwrap();
    leg.set_init_vec(0.0, -1.5, 0.2).unwrap();
    leg
}

pub(crate) fn apply(theta: &mut [f64], step: &Step) {
    for (t, d) in theta.iter_mut().zip(step.delta.iter()) {
        *t += d;
    }
}

/// Closed form position of the two link arm, for cross-checking.
pub(crate) fn two_link_position(theta: &[f64]) -> Vector3<f64> {
    let a = theta[0].to_radians();
    let b = (theta[0] + theta[1]).to_radians();
    Vector3::new(a.cos() + b.cos(), a.sin() + b.sin(), 0.0)
}

pub(crate) fn assert_position_eq(actual: &Vector3<f64>, expected: &Vector3<f64>, tolerance: f64) {
    if (actual - expected).norm() > tolerance {
        println!("Expected:");
        dump_position(expected);
        println!("Actual:");
        dump_position(actual);
        panic!("Positions do not match");
    }
}

/// Iterates the solver the way a caller would. Returns the joints, whether it finished,
/// the number of steps and the error of every step.
pub(crate) fn drive(solver: &JacobianSolver, start: &[f64], target: &Vector3<f64>, distance: f64,
                    max_iterations: usize) -> (Vec<f64>, bool, usize, Vec<f64>) {
    let mut theta = start.to_vec();
    let mut errors = Vec::new();
    for iteration in 0..max_iterations {
        let step = solver.step_delta(&theta, target, distance).unwrap();
        errors.push(step.error);
        if step.finished {
            return (theta, true, iteration, errors);
        }
        apply(&mut theta, &step);
    }
    dump_joints(&theta);
    (theta, false, max_iterations, errors)
}
