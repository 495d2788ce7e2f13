//! Incremental inverse kinematics for articulated chains, driven by a Jacobian that is derived
//! symbolically rather than by numeric perturbation.
//!
//! The chain is described as a sequence of homogeneous transforms: rotations about an axis by
//! a joint variable, rotations by a fixed angle and fixed translations, applied to an initial
//! end effector offset. From this description the end effector position is built as a
//! symbolic expression of all joint variables and differentiated exactly, giving a
//! 3 x N Jacobian of expressions. At run time the Jacobian is evaluated at the current joint
//! values and used for a damped least squares step towards the desired position.
//!
//! # Features
//!
//! - Exact partial derivatives (chain rule through sine and cosine), no finite differences.
//! - Damped least squares step `J^T (J J^T + lambda^2 I)^-1 e`: singular configurations produce
//!   smaller steps, never errors or divergence.
//! - Optional cap on the step length in joint space.
//! - Joint limits: the returned increment never moves a joint out of its range.
//! - Explicit two-state life cycle: configure, then `preprocess` once, then step.
//! - Preprocessed chains are immutable and can be stepped from many threads at once;
//!   independent chains (limbs) can be stepped in parallel (feature `parallel`).
//! - Chain descriptions can be read from YAML files (feature `allow_filesystem`).
//!
//! All angles crossing the API (joint values, increments, constant rotations, limits) are in
//! degrees.
//!
//! # Example
//!
//! ```
//! use nalgebra::Vector3;
//! use rs_jacobian_ik::jacobian::JacobianSolver;
//!
//! let mut arm = JacobianSolver::new(1);
//! arm.push_rot_v(0, 0.0, 0.0, 1.0).unwrap();
//! arm.set_init_vec(1.0, 0.0, 0.0).unwrap();
//! arm.set_constraint(0, 0.0, 90.0).unwrap();
//! arm.preprocess().unwrap();
//!
//! let result = arm.solve(&[0.0], &Vector3::new(0.0, 1.0, 0.0), 1e-4, 100).unwrap();
//! assert!(result.converged);
//! assert!((result.joints[0] - 90.0).abs() < 0.01);
//! ```

pub mod solver_error;

pub mod expression;
pub mod symbolic;
pub mod transform;

pub mod parameters;
pub mod constraints;

pub mod jacobian;

#[path = "utils/utils.rs"]
pub mod utils;

#[cfg(feature = "allow_filesystem")]
pub mod parameter_error;
#[cfg(feature = "allow_filesystem")]
pub mod chain_from_file;

#[cfg(feature = "parallel")]
pub mod batch;

#[cfg(test)]
mod tests;
