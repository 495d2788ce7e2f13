//! Chain configuration, symbolic Jacobian and the incremental damped least squares step.
//!
//! The solver is configured with a sequence of transforms (rotations driven by joint variables,
//! fixed rotations and fixed translations) and an initial end effector offset. `preprocess`
//! composes these into a symbolic end effector position and differentiates it with respect to
//! every joint variable. After that the chain is frozen and `step_delta` can be called
//! any number of times, from any number of threads, with caller-supplied joint vectors.
//!
//! All angles (joint values, constant rotations, limits, returned deltas) are in degrees.
//!
//! ```
//! use nalgebra::Vector3;
//! use rs_jacobian_ik::jacobian::JacobianSolver;
//!
//! // Planar arm of two unit links, both rotating about Z
//! let mut arm = JacobianSolver::new(2);
//! arm.push_rot_v(0, 0.0, 0.0, 1.0).unwrap();   // shoulder
//! arm.push_trans_c(1.0, 0.0, 0.0).unwrap();
//! arm.push_rot_v(1, 0.0, 0.0, 1.0).unwrap();   // elbow
//! arm.push_trans_c(-1.0, 0.0, 0.0).unwrap();
//! arm.set_init_vec(2.0, 0.0, 0.0).unwrap();
//! arm.preprocess().unwrap();
//!
//! let target = Vector3::new(1.0, 1.0, 0.0);
//! let mut theta = vec![0.0, 0.0];
//! for _ in 0..50 {
//!     let step = arm.step_delta(&theta, &target, 0.01).unwrap();
//!     if step.finished {
//!         break;
//!     }
//!     for (t, d) in theta.iter_mut().zip(step.delta.iter()) {
//!         *t += d;
//!     }
//! }
//! assert!((arm.position(&theta).unwrap() - target).norm() <= 0.01);
//! ```

use nalgebra::{DMatrix, DVector, Vector3};
use tracing::{debug, trace, warn};

use crate::constraints::Constraints;
use crate::expression::{DEGREES_TO_RADIANS, Evaluator, Expr, VarId};
use crate::parameters::jacobian_ik::SolverParameters;
use crate::solver_error::{SolverError, check_finite};
use crate::symbolic::{SymMatrix, SymVector};
use crate::transform::TransformStep;
use crate::utils::format_joints;

/// Result of one incremental step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Joint increments (degrees) to add to the joint vector the step was computed for.
    pub delta: DVector<f64>,
    /// True if the end effector was already within the requested distance of the target.
    /// The delta is zero in this case.
    pub finished: bool,
    /// Distance between the target and the end effector at the joint vector the step was computed for.
    pub error: f64,
}

/// Outcome of [JacobianSolver::solve].
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub joints: DVector<f64>,
    pub converged: bool,
    /// Number of steps applied.
    pub iterations: usize,
    /// Final distance between the target and the end effector.
    pub error: f64,
}

/// Symbolic position and Jacobian, fixed by preprocessing.
#[derive(Debug, Clone)]
struct Preprocessed {
    position: SymVector,
    jacobian: SymMatrix,
}

#[derive(Debug, Clone)]
enum SolverState {
    NotInitialized,
    Ready(Preprocessed),
}

/// Kinematic chain with a symbolically derived Jacobian. See the module documentation.
#[derive(Debug, Clone)]
pub struct JacobianSolver {
    degrees_of_freedom: usize,
    init_vec: [f64; 3],
    steps: Vec<TransformStep>,
    constraints: Constraints,
    parameters: SolverParameters,
    state: SolverState,
}

impl JacobianSolver {
    /// Creates an empty chain with `degrees_of_freedom` joint variables and default solver parameters.
    pub fn new(degrees_of_freedom: usize) -> Self {
        JacobianSolver {
            degrees_of_freedom,
            init_vec: [0.0; 3],
            steps: Vec::new(),
            constraints: Constraints::unconstrained(degrees_of_freedom),
            parameters: SolverParameters::default(),
            state: SolverState::NotInitialized,
        }
    }

    /// Creates an empty chain with the given solver parameters, checking them first.
    pub fn with_parameters(degrees_of_freedom: usize, parameters: SolverParameters) -> Result<Self, SolverError> {
        parameters.validate()?;
        Ok(JacobianSolver { parameters, ..JacobianSolver::new(degrees_of_freedom) })
    }

    pub fn degrees_of_freedom(&self) -> usize {
        self.degrees_of_freedom
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SolverState::Ready(_))
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn parameters(&self) -> &SolverParameters {
        &self.parameters
    }

    pub fn init_vec(&self) -> [f64; 3] {
        self.init_vec
    }

    fn ensure_configurable(&self) -> Result<(), SolverError> {
        match self.state {
            SolverState::NotInitialized => Ok(()),
            SolverState::Ready(_) => Err(SolverError::AlreadyPreprocessed),
        }
    }

    fn ensure_variable(&self, var: VarId) -> Result<(), SolverError> {
        if var < self.degrees_of_freedom {
            Ok(())
        } else {
            Err(SolverError::InvalidVariable { var, degrees_of_freedom: self.degrees_of_freedom })
        }
    }

    fn ready(&self) -> Result<&Preprocessed, SolverError> {
        match self.state {
            SolverState::Ready(ref preprocessed) => Ok(preprocessed),
            SolverState::NotInitialized => Err(SolverError::NotReady),
        }
    }

    /// Sets the end effector offset in the frame of the last transform. Zero if never called.
    pub fn set_init_vec(&mut self, x: f64, y: f64, z: f64) -> Result<(), SolverError> {
        self.ensure_configurable()?;
        check_finite("initial offset", &[x, y, z])?;
        self.init_vec = [x, y, z];
        Ok(())
    }

    /// Appends a rotation about the given axis by the angle held in joint variable `var`.
    pub fn push_rot_v(&mut self, var: VarId, x: f64, y: f64, z: f64) -> Result<(), SolverError> {
        self.ensure_configurable()?;
        self.ensure_variable(var)?;
        self.push(TransformStep::rotation_by_variable(var, x, y, z)?)
    }

    /// Appends a rotation about the given axis by a fixed angle in degrees.
    pub fn push_rot_c(&mut self, angle: f64, x: f64, y: f64, z: f64) -> Result<(), SolverError> {
        self.ensure_configurable()?;
        self.push(TransformStep::rotation_constant(angle, x, y, z)?)
    }

    /// Appends a fixed translation.
    pub fn push_trans_c(&mut self, x: f64, y: f64, z: f64) -> Result<(), SolverError> {
        self.ensure_configurable()?;
        self.push(TransformStep::translation_constant(x, y, z)?)
    }

    /// Appends an already built step. Steps pushed later are applied first to the end effector
    /// offset, in the local frame established by the steps before them.
    pub fn push(&mut self, step: TransformStep) -> Result<(), SolverError> {
        self.ensure_configurable()?;
        if let Some(var) = step.variable() {
            self.ensure_variable(var)?;
        }
        self.steps.push(step);
        Ok(())
    }

    /// Limits joint variable `var` to the inclusive range `[min, max]` (degrees).
    pub fn set_constraint(&mut self, var: VarId, min: f64, max: f64) -> Result<(), SolverError> {
        self.ensure_configurable()?;
        self.ensure_variable(var)?;
        if let Some(previous) = self.constraints.set(var, min, max)? {
            warn!(var, previous_min = previous.min, previous_max = previous.max, min, max,
                "joint limit redefined");
        }
        Ok(())
    }

    /// Composes the chain into the symbolic end effector position and derives the Jacobian.
    /// Afterwards the chain can no longer be changed.
    pub fn preprocess(&mut self) -> Result<(), SolverError> {
        self.ensure_configurable()?;

        // Fold from the end effector outwards: the last pushed step acts on the offset first.
        let mut point = SymVector::from_constants(&self.init_vec).extended(Expr::one());
        for step in self.steps.iter().rev() {
            point = step.homogeneous().mul_vector(&point)?;
        }
        let position = point.truncated(3)?;

        let columns: Vec<SymVector> = (0..self.degrees_of_freedom)
            .map(|var| position.derivative(var))
            .collect();
        let jacobian = SymMatrix::from_columns(3, &columns)?;

        for (var, column) in columns.iter().enumerate() {
            if column.iter().all(|e| e.is_zero()) {
                debug!(var, "joint variable does not move the end effector");
            }
        }
        debug!(
            steps = self.steps.len(),
            degrees_of_freedom = self.degrees_of_freedom,
            position_nodes = position.iter().map(|e| e.node_count()).sum::<usize>(),
            jacobian_nodes = jacobian.node_count(),
            "chain preprocessed"
        );

        self.state = SolverState::Ready(Preprocessed { position, jacobian });
        Ok(())
    }

    fn check_joints(&self, theta: &[f64]) -> Result<(), SolverError> {
        if theta.len() != self.degrees_of_freedom {
            return Err(SolverError::DimensionMismatch {
                expected: self.degrees_of_freedom,
                found: theta.len(),
            });
        }
        check_finite("joint values", theta)
    }

    /// End effector position for the given joint values (forward kinematics).
    pub fn position(&self, theta: &[f64]) -> Result<Vector3<f64>, SolverError> {
        let preprocessed = self.ready()?;
        self.check_joints(theta)?;
        let p = preprocessed.position.eval(theta)?;
        Ok(Vector3::new(p[0], p[1], p[2]))
    }

    /// Numeric 3 x N Jacobian for the given joint values, in length units per degree.
    pub fn jacobian_at(&self, theta: &[f64]) -> Result<DMatrix<f64>, SolverError> {
        let preprocessed = self.ready()?;
        self.check_joints(theta)?;
        preprocessed.jacobian.eval(theta)
    }

    /// Computes the joint increment that moves the end effector towards the desired position.
    ///
    /// # Arguments
    ///
    /// * `c_theta` - current joint values, exactly `degrees_of_freedom` of them (degrees)
    /// * `des_pos` - desired end effector position, in the frame of the chain base
    /// * `distance` - if the end effector is this close to `des_pos` or closer, no motion is needed
    ///
    /// # Returns
    ///
    /// A [Step] with `finished` set and zero delta if the end effector is already close enough.
    /// Otherwise, the damped least squares increment `J^T (J J^T + lambda^2 I)^-1 e`, capped in length
    /// by `max_step` if configured and clamped so that `c_theta + delta` respects all joint limits.
    ///
    /// Degenerate (singular) configurations never produce an error, only smaller or zero steps.
    pub fn step_delta(&self, c_theta: &[f64], des_pos: &Vector3<f64>, distance: f64) -> Result<Step, SolverError> {
        let preprocessed = self.ready()?;
        self.check_joints(c_theta)?;
        check_finite("desired position", des_pos.as_slice())?;
        if !(distance >= 0.0) {
            return Err(SolverError::InvalidParameter(format!(
                "distance must be non-negative (got {})", distance
            )));
        }

        let mut evaluator = Evaluator::new(c_theta);
        let current = preprocessed.position.eval_with(&mut evaluator)?;
        let error = DVector::from_column_slice(des_pos.as_slice()) - current;
        let error_norm = error.norm();

        if error_norm <= distance {
            trace!(error = error_norm, "target reached");
            return Ok(Step {
                delta: DVector::zeros(self.degrees_of_freedom),
                finished: true,
                error: error_norm,
            });
        }

        let jacobian = preprocessed.jacobian.eval_with(&mut evaluator)?;
        let mut delta = damped_least_squares(&jacobian, &error, self.parameters.damping);

        if let Some(max_step) = self.parameters.max_step {
            let length = delta.norm();
            if length > max_step {
                debug!(length, max_step, "step shortened");
                delta *= max_step / length;
            }
        }

        let mut target: Vec<f64> = c_theta.iter().zip(delta.iter()).map(|(t, d)| t + d).collect();
        self.constraints.clamp(&mut target);
        let clamped = DVector::from_iterator(
            self.degrees_of_freedom,
            target.iter().zip(c_theta.iter()).map(|(t, c)| t - c),
        );
        if clamped != delta {
            debug!(requested = %format_joints(delta.as_slice()), allowed = %format_joints(clamped.as_slice()),
                "step clamped by joint limits");
        }

        trace!(error = error_norm, step = clamped.norm(), "step computed");
        Ok(Step { delta: clamped, finished: false, error: error_norm })
    }

    /// Repeats [JacobianSolver::step_delta] from `initial` until the target is within `distance`,
    /// `max_iterations` steps are applied, or a step comes out all zero (joint limits block
    /// further motion, or the configuration is singular with respect to the target).
    pub fn solve(&self, initial: &[f64], des_pos: &Vector3<f64>, distance: f64, max_iterations: usize)
                 -> Result<SolveResult, SolverError> {
        let mut joints = DVector::from_column_slice(initial);
        for iteration in 0..max_iterations {
            let step = self.step_delta(joints.as_slice(), des_pos, distance)?;
            if step.finished {
                return Ok(SolveResult { joints, converged: true, iterations: iteration, error: step.error });
            }
            if step.delta.iter().all(|d| *d == 0.0) {
                debug!(iteration, error = step.error, "no further motion possible");
                return Ok(SolveResult { joints, converged: false, iterations: iteration, error: step.error });
            }
            joints += step.delta;
        }
        let error = (des_pos - self.position(joints.as_slice())?).norm();
        Ok(SolveResult { joints, converged: error <= distance, iterations: max_iterations, error })
    }
}

/// Damped least squares step for a Jacobian given per degree, returned in degrees.
/// Internally the Jacobian is taken per radian so that the damping does not depend on the angle unit.
fn damped_least_squares(jacobian: &DMatrix<f64>, error: &DVector<f64>, damping: f64) -> DVector<f64> {
    let columns = jacobian.ncols();
    let per_radian = jacobian / DEGREES_TO_RADIANS;
    let rows = per_radian.nrows();
    let damped = &per_radian * per_radian.transpose() + DMatrix::identity(rows, rows) * (damping * damping);

    // J J^T + lambda^2 I is symmetric positive definite for lambda > 0
    let weights = match damped.clone().cholesky() {
        Some(cholesky) => cholesky.solve(error),
        None => match damped.try_inverse() {
            Some(inverse) => inverse * error,
            None => {
                warn!("damped system not invertible, no step taken");
                return DVector::zeros(columns);
            }
        },
    };

    let step = (per_radian.transpose() * weights) / DEGREES_TO_RADIANS;
    if step.iter().all(|d| d.is_finite()) {
        step
    } else {
        warn!("non-finite step, no step taken");
        DVector::zeros(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    /// One joint rotating about Z, end effector one unit along X.
    fn single_joint() -> JacobianSolver {
        let mut solver = JacobianSolver::new(1);
        solver.push_rot_v(0, 0.0, 0.0, 1.0).unwrap();
        solver.set_init_vec(1.0, 0.0, 0.0).unwrap();
        solver
    }

    #[test]
    fn test_state_machine() {
        let mut solver = single_joint();
        let target = Vector3::new(0.0, 1.0, 0.0);
        assert!(!solver.is_ready());
        assert_eq!(solver.step_delta(&[0.0], &target, 0.01), Err(SolverError::NotReady));
        assert_eq!(solver.position(&[0.0]).err(), Some(SolverError::NotReady));

        solver.preprocess().unwrap();
        assert!(solver.is_ready());
        assert_eq!(solver.preprocess(), Err(SolverError::AlreadyPreprocessed));
        assert_eq!(solver.push_trans_c(1.0, 0.0, 0.0), Err(SolverError::AlreadyPreprocessed));
        assert_eq!(solver.push_rot_v(0, 1.0, 0.0, 0.0), Err(SolverError::AlreadyPreprocessed));
        assert_eq!(solver.push_rot_c(10.0, 1.0, 0.0, 0.0), Err(SolverError::AlreadyPreprocessed));
        assert_eq!(solver.set_init_vec(0.0, 0.0, 0.0), Err(SolverError::AlreadyPreprocessed));
        assert_eq!(solver.set_constraint(0, 0.0, 1.0), Err(SolverError::AlreadyPreprocessed));
        assert!(solver.step_delta(&[0.0], &target, 0.01).is_ok());
    }

    #[test]
    fn test_invalid_variables() {
        let mut solver = JacobianSolver::new(2);
        assert_eq!(solver.push_rot_v(2, 0.0, 0.0, 1.0),
                   Err(SolverError::InvalidVariable { var: 2, degrees_of_freedom: 2 }));
        assert_eq!(solver.set_constraint(5, 0.0, 1.0),
                   Err(SolverError::InvalidVariable { var: 5, degrees_of_freedom: 2 }));
        assert_eq!(solver.set_constraint(1, 1.0, 0.0),
                   Err(SolverError::InvalidRange { var: 1, min: 1.0, max: 0.0 }));
        assert!(solver.steps().is_empty());
    }

    #[test]
    fn test_variable_and_state_checked_before_axis() {
        let mut solver = JacobianSolver::new(2);
        assert_eq!(solver.push_rot_v(5, 0.0, 0.0, 0.0),
                   Err(SolverError::InvalidVariable { var: 5, degrees_of_freedom: 2 }));
        assert_eq!(solver.push_rot_v(1, 0.0, 0.0, 0.0),
                   Err(SolverError::InvalidAxis { x: 0.0, y: 0.0, z: 0.0 }));

        let mut solver = single_joint();
        solver.preprocess().unwrap();
        assert_eq!(solver.push_rot_v(0, 0.0, 0.0, 0.0), Err(SolverError::AlreadyPreprocessed));
        assert_eq!(solver.push_rot_c(f64::NAN, 0.0, 0.0, 0.0), Err(SolverError::AlreadyPreprocessed));
        assert_eq!(solver.push_trans_c(f64::NAN, 0.0, 0.0), Err(SolverError::AlreadyPreprocessed));
    }

    #[test]
    fn test_dimension_checks() {
        let mut solver = single_joint();
        solver.preprocess().unwrap();
        let target = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(solver.step_delta(&[0.0, 1.0], &target, 0.01),
                   Err(SolverError::DimensionMismatch { expected: 1, found: 2 }));
        assert!(solver.step_delta(&[f64::NAN], &target, 0.01).is_err());
        assert!(solver.step_delta(&[0.0], &target, -1.0).is_err());
    }

    #[test]
    fn test_default_init_vec_is_origin() {
        let mut solver = JacobianSolver::new(1);
        solver.push_rot_v(0, 0.0, 0.0, 1.0).unwrap();
        solver.push_trans_c(1.0, 2.0, 3.0).unwrap();
        solver.preprocess().unwrap();
        let p = solver.position(&[90.0]).unwrap();
        // (1, 2, 3) rotated by 90 degrees about Z
        assert!((p - Vector3::new(-2.0, 1.0, 3.0)).norm() < EPSILON);
    }

    #[test]
    fn test_order_of_composition() {
        // Translation pushed after rotation is applied first, in the rotated frame
        let mut rotate_then_move = JacobianSolver::new(1);
        rotate_then_move.push_rot_c(90.0, 0.0, 0.0, 1.0).unwrap();
        rotate_then_move.push_trans_c(1.0, 0.0, 0.0).unwrap();
        rotate_then_move.preprocess().unwrap();
        let p = rotate_then_move.position(&[0.0]).unwrap();
        assert!((p - Vector3::new(0.0, 1.0, 0.0)).norm() < EPSILON);

        let mut move_then_rotate = JacobianSolver::new(1);
        move_then_rotate.push_trans_c(1.0, 0.0, 0.0).unwrap();
        move_then_rotate.push_rot_c(90.0, 0.0, 0.0, 1.0).unwrap();
        move_then_rotate.preprocess().unwrap();
        let p = move_then_rotate.position(&[0.0]).unwrap();
        assert!((p - Vector3::new(1.0, 0.0, 0.0)).norm() < EPSILON);
    }

    #[test]
    fn test_jacobian_of_single_joint() {
        let mut solver = single_joint();
        solver.preprocess().unwrap();
        let j = solver.jacobian_at(&[0.0]).unwrap();
        assert_eq!(j.shape(), (3, 1));
        // One degree moves the tip by pi / 180 along Y
        assert!(j[(0, 0)].abs() < EPSILON);
        assert!((j[(1, 0)] - DEGREES_TO_RADIANS).abs() < EPSILON);
        assert!(j[(2, 0)].abs() < EPSILON);
    }

    #[test]
    fn test_finished_at_target() {
        let mut solver = single_joint();
        solver.preprocess().unwrap();
        let step = solver.step_delta(&[30.0], &Vector3::new(30f64.to_radians().cos(), 30f64.to_radians().sin(), 0.0), 1e-9).unwrap();
        assert!(step.finished);
        assert!(step.delta.iter().all(|d| *d == 0.0));
    }

    #[test]
    fn test_step_moves_towards_target() {
        let mut solver = single_joint();
        solver.preprocess().unwrap();
        let target = Vector3::new(0.0, 1.0, 0.0);
        let step = solver.step_delta(&[60.0], &target, 1e-6).unwrap();
        assert!(!step.finished);
        assert!(step.delta[0] > 0.0);
        let after = solver.position(&[60.0 + step.delta[0]]).unwrap();
        assert!((after - target).norm() < step.error);
    }

    #[test]
    fn test_step_length_cap() {
        let mut solver = JacobianSolver::with_parameters(1, SolverParameters { damping: 0.1, max_step: Some(1.5) }).unwrap();
        solver.push_rot_v(0, 0.0, 0.0, 1.0).unwrap();
        solver.set_init_vec(1.0, 0.0, 0.0).unwrap();
        solver.preprocess().unwrap();
        let step = solver.step_delta(&[0.0], &Vector3::new(0.0, 1.0, 0.0), 1e-6).unwrap();
        assert!((step.delta[0] - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_damping_enters_squared() {
        // J per radian is (0, 1, 0) and e = (-1, 1, 0): the step is 1 / (1 + damping^2) radians
        let mut solver = JacobianSolver::with_parameters(1, SolverParameters::uncapped(0.5)).unwrap();
        solver.push_rot_v(0, 0.0, 0.0, 1.0).unwrap();
        solver.set_init_vec(1.0, 0.0, 0.0).unwrap();
        solver.preprocess().unwrap();
        let step = solver.step_delta(&[0.0], &Vector3::new(0.0, 1.0, 0.0), 1e-6).unwrap();
        let expected = (1.0_f64 / (1.0 + 0.5 * 0.5)).to_degrees();
        assert!((step.delta[0] - expected).abs() < 1e-9, "{} != {}", step.delta[0], expected);
    }

    #[test]
    fn test_variable_without_effect_gets_zero_delta() {
        // Joint 1 rotates about the axis the end effector lies on
        let mut solver = JacobianSolver::new(2);
        solver.push_rot_v(0, 0.0, 0.0, 1.0).unwrap();
        solver.push_rot_v(1, 1.0, 0.0, 0.0).unwrap();
        solver.set_init_vec(1.0, 0.0, 0.0).unwrap();
        solver.preprocess().unwrap();
        let step = solver.step_delta(&[0.0, 0.0], &Vector3::new(0.0, 1.0, 0.0), 1e-6).unwrap();
        assert!(step.delta[0] > 0.0);
        assert!(step.delta[1].abs() < EPSILON);
    }

    #[test]
    fn test_singular_configuration_does_not_fail() {
        // Target straight behind: the Jacobian is orthogonal to the error
        let mut solver = single_joint();
        solver.preprocess().unwrap();
        let step = solver.step_delta(&[0.0], &Vector3::new(-1.0, 0.0, 0.0), 1e-6).unwrap();
        assert!(!step.finished);
        assert!(step.delta[0].abs() < EPSILON);
    }

    #[test]
    fn test_solve_stops_at_singular_configuration() {
        let mut solver = single_joint();
        solver.preprocess().unwrap();
        let result = solver.solve(&[0.0], &Vector3::new(-1.0, 0.0, 0.0), 1e-3, 100).unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.joints[0], 0.0);
        assert!((result.error - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_zero_degrees_of_freedom() {
        let mut solver = JacobianSolver::new(0);
        solver.push_trans_c(0.0, 0.0, 1.0).unwrap();
        solver.preprocess().unwrap();
        assert_eq!(solver.position(&[]).unwrap(), Vector3::new(0.0, 0.0, 1.0));
        let step = solver.step_delta(&[], &Vector3::new(1.0, 0.0, 0.0), 0.01).unwrap();
        assert!(!step.finished);
        assert_eq!(step.delta.len(), 0);
    }

    #[test]
    fn test_solve_reports_blocked_target() {
        let mut solver = single_joint();
        solver.set_constraint(0, 0.0, 45.0).unwrap();
        solver.preprocess().unwrap();
        let result = solver.solve(&[0.0], &Vector3::new(0.0, 1.0, 0.0), 1e-3, 200).unwrap();
        assert!(!result.converged);
        assert!((result.joints[0] - 45.0).abs() < EPSILON);
        assert!(result.iterations < 200);
    }
}
