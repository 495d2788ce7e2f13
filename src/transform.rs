//! Homogeneous transforms of the kinematic chain, as symbolic 4x4 matrices.
//!
//! Rotations use the axis-angle (Rodrigues) form
//! `R = cos(a) I + sin(a) [k]x + (1 - cos(a)) k k^T` with a normalized axis `k`, regrouped so
//! that entries along the axis fold into constants.
//! Angles are in degrees; the conversion to radians is folded into the expression, so
//! derivatives of variable rotations come out per degree.

use crate::expression::{DEGREES_TO_RADIANS, Expr, VarId};
use crate::solver_error::{SolverError, check_finite};
use crate::symbolic::SymMatrix;

/// Rotation axis as given, any non-zero length. Normalized when the rotation is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    x: f64,
    y: f64,
    z: f64,
    norm: f64,
}

impl Axis {
    /// Fails on zero length or non-finite components.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self, SolverError> {
        let norm = (x * x + y * y + z * z).sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(SolverError::InvalidAxis { x, y, z });
        }
        Ok(Axis { x, y, z, norm })
    }

    /// Components exactly as given to [Axis::new].
    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Unit vector along the axis.
    pub fn unit(&self) -> [f64; 3] {
        [self.x / self.norm, self.y / self.norm, self.z / self.norm]
    }
}

/// One step of the chain. Steps pushed later sit closer to the end effector.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformStep {
    /// Rotation about `axis` by the angle held in the joint variable.
    RotationByVariable { var: VarId, axis: Axis },
    /// Rotation about `axis` by a fixed angle in degrees.
    RotationConstant { angle: f64, axis: Axis },
    TranslationConstant { offset: [f64; 3] },
}

impl TransformStep {
    pub fn rotation_by_variable(var: VarId, x: f64, y: f64, z: f64) -> Result<Self, SolverError> {
        Ok(TransformStep::RotationByVariable { var, axis: Axis::new(x, y, z)? })
    }

    pub fn rotation_constant(angle: f64, x: f64, y: f64, z: f64) -> Result<Self, SolverError> {
        check_finite("rotation angle", &[angle])?;
        Ok(TransformStep::RotationConstant { angle, axis: Axis::new(x, y, z)? })
    }

    pub fn translation_constant(x: f64, y: f64, z: f64) -> Result<Self, SolverError> {
        check_finite("translation", &[x, y, z])?;
        Ok(TransformStep::TranslationConstant { offset: [x, y, z] })
    }

    /// The variable this step depends on, if any.
    pub fn variable(&self) -> Option<VarId> {
        match *self {
            TransformStep::RotationByVariable { var, .. } => Some(var),
            _ => None,
        }
    }

    /// 4x4 homogeneous matrix of this step.
    pub fn homogeneous(&self) -> SymMatrix {
        match *self {
            TransformStep::RotationByVariable { var, axis } => {
                rotation(&axis, &(Expr::var(var) * DEGREES_TO_RADIANS))
            }
            TransformStep::RotationConstant { angle, axis } => {
                rotation(&axis, &Expr::constant(angle * DEGREES_TO_RADIANS))
            }
            TransformStep::TranslationConstant { offset } => {
                SymMatrix::from_fn(4, 4, |r, c| {
                    if r == c {
                        Expr::one()
                    } else if c == 3 && r < 3 {
                        Expr::constant(offset[r])
                    } else {
                        Expr::zero()
                    }
                })
            }
        }
    }
}

/// Rodrigues rotation about a unit axis by `radians`.
fn rotation(axis: &Axis, radians: &Expr) -> SymMatrix {
    let k = axis.unit();
    let c = radians.cos();
    let s = radians.sin();

    // Cross-product matrix [k]x
    let cross = [
        [0.0, -k[2], k[1]],
        [k[2], 0.0, -k[0]],
        [-k[1], k[0], 0.0],
    ];

    SymMatrix::from_fn(4, 4, |r, col| {
        if r == 3 || col == 3 {
            return if r == col { Expr::one() } else { Expr::zero() };
        }
        // k_r k_c + (delta_rc - k_r k_c) cos(a) + [k]x_rc sin(a), folds exactly for axis-aligned k
        let kk = k[r] * k[col];
        let delta = if r == col { 1.0 } else { 0.0 };
        Expr::constant(kk) + c.clone() * (delta - kk) + s.clone() * cross[r][col]
    })
}
