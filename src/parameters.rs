//! Defines the tunable parameters of the incremental solver

pub mod jacobian_ik {
    use crate::solver_error::SolverError;

    /// Tunables of the damped least squares step. These are not part of any contract:
    /// different chains may converge better with different values.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct SolverParameters {
        /// Damping factor (lambda). The step is computed as `J^T (J J^T + lambda^2 I)^-1 e` with
        /// the Jacobian taken per radian, so the regularization term added to `J J^T` is
        /// `damping * damping`. A formula written as `J J^T + mu I` has `mu = damping^2`.
        /// Higher values are more robust near singular configurations but converge slower.
        pub damping: f64,

        /// Upper bound on the Euclidean norm of one joint-space step, in degrees.
        /// Longer steps are scaled down, keeping their direction. `None` disables the cap.
        pub max_step: Option<f64>,
    }

    impl Default for SolverParameters {
        fn default() -> Self {
            SolverParameters {
                damping: 0.1,
                max_step: Some(10.0),
            }
        }
    }

    impl SolverParameters {
        /// Parameters without the step cap, relying on damping alone.
        pub fn uncapped(damping: f64) -> Self {
            SolverParameters { damping, max_step: None }
        }

        /// Parameters with a tighter step cap, for chains with long links where
        /// a few degrees move the end effector far.
        pub fn cautious() -> Self {
            SolverParameters { damping: 0.2, max_step: Some(2.0) }
        }

        pub fn validate(&self) -> Result<(), SolverError> {
            if !(self.damping.is_finite() && self.damping > 0.0) {
                return Err(SolverError::InvalidParameter(format!(
                    "damping must be positive and finite (got {})", self.damping
                )));
            }
            if let Some(step) = self.max_step {
                if !(step.is_finite() && step > 0.0) {
                    return Err(SolverError::InvalidParameter(format!(
                        "max_step must be positive and finite (got {})", step
                    )));
                }
            }
            Ok(())
        }

        /// Convert to string yaml representation (quick viewing, etc).
        pub fn to_yaml(&self) -> String {
            let max_step = match self.max_step {
                Some(step) => format!("{}", step),
                None => "~".to_string(),
            };
            format!("solver:\n  damping: {}\n  max_step: {}\n", self.damping, max_step)
        }
    }

}
