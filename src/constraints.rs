use crate::expression::VarId;
use crate::solver_error::SolverError;

/// Inclusive angle range (degrees) a joint variable must stay within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimit {
    pub min: f64,
    pub max: f64,
}

impl JointLimit {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-variable joint limits. Variables without a limit are unconstrained.
#[derive(Debug, Clone)]
pub struct Constraints {
    limits: Vec<Option<JointLimit>>,
}

impl Constraints {
    /// No limits for any of the `degrees_of_freedom` variables.
    pub fn unconstrained(degrees_of_freedom: usize) -> Self {
        Constraints { limits: vec![None; degrees_of_freedom] }
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Sets the limit for one variable, replacing the previous one if any. Returns the replaced limit.
    pub fn set(&mut self, var: VarId, min: f64, max: f64) -> Result<Option<JointLimit>, SolverError> {
        let degrees_of_freedom = self.limits.len();
        let slot = self.limits.get_mut(var)
            .ok_or(SolverError::InvalidVariable { var, degrees_of_freedom })?;
        // NaN bounds fail this check too
        if !(min <= max) {
            return Err(SolverError::InvalidRange { var, min, max });
        }
        Ok(slot.replace(JointLimit { min, max }))
    }

    pub fn limit(&self, var: VarId) -> Option<JointLimit> {
        self.limits.get(var).copied().flatten()
    }

    /// Clamps every constrained value into its range, unconstrained values pass through.
    /// Values past the number of variables are left alone.
    pub fn clamp(&self, angles: &mut [f64]) {
        for (angle, limit) in angles.iter_mut().zip(self.limits.iter()) {
            if let Some(limit) = limit {
                *angle = limit.clamp(*angle);
            }
        }
    }

    pub fn compliant(&self, angles: &[f64]) -> bool {
        angles.iter().zip(self.limits.iter()).all(|(&angle, limit)| match limit {
            Some(limit) => limit.contains(angle),
            None => true,
        })
    }
}
