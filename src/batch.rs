//! Stepping several independent chains (e.g. one per limb) in parallel.
//!
//! After preprocessing, a [JacobianSolver] is immutable, so any number of threads can
//! step it at the same time. Each request carries its own joint vector and target.

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::jacobian::{JacobianSolver, SolveResult, Step};
use crate::solver_error::SolverError;

/// One step (or solve) request against a preprocessed chain.
#[derive(Debug, Clone)]
pub struct StepRequest<'a> {
    pub solver: &'a JacobianSolver,
    pub theta: Vec<f64>,
    pub target: Vector3<f64>,
    pub distance: f64,
}

/// Computes one step for every request. Results are in the order of requests.
pub fn step_all(requests: &[StepRequest<'_>]) -> Vec<Result<Step, SolverError>> {
    requests.par_iter()
        .map(|r| r.solver.step_delta(&r.theta, &r.target, r.distance))
        .collect()
}

/// Runs [JacobianSolver::solve] for every request. Results are in the order of requests.
pub fn solve_all(requests: &[StepRequest<'_>], max_iterations: usize) -> Vec<Result<SolveResult, SolverError>> {
    requests.par_iter()
        .map(|r| r.solver.solve(&r.theta, &r.target, r.distance, max_iterations))
        .collect()
}
