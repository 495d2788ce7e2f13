//! Scalar symbolic expressions over joint variables.
//!
//! An [Expr] is an immutable tree (more precisely, a DAG: subexpressions are shared through
//! `Arc` and never mutated) built from constants, variable references, sums, differences,
//! products, negation, sine and cosine. Expressions can be evaluated at a numeric assignment
//! and differentiated exactly with respect to any variable.
//!
//! Trigonometric functions take their argument in radians. Angles in degrees are turned into
//! radians by multiplying with [DEGREES_TO_RADIANS] before wrapping into `sin`/`cos`, which makes
//! the chain rule produce derivatives per degree.
//!
//! ```
//! use rs_jacobian_ik::expression::Expr;
//!
//! let x = Expr::var(0);
//! let f = x.clone() * x.sin(); // x * sin(x)
//! let df = f.derivative(0);    // sin(x) + x * cos(x)
//! let v = df.eval(&[1.0]).unwrap();
//! assert!((v - (1.0f64.sin() + 1.0f64.cos())).abs() < 1e-12);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

use crate::solver_error::SolverError;

/// Identifier of a free variable (joint), dense in `0..degrees_of_freedom`.
pub type VarId = usize;

/// Multiplier that converts degrees into radians.
pub const DEGREES_TO_RADIANS: f64 = std::f64::consts::PI / 180.0;

#[derive(Debug)]
enum Node {
    Const(f64),
    Var(VarId),
    Neg(Expr),
    Add(Expr, Expr),
    Sub(Expr, Expr),
    Mul(Expr, Expr),
    Sin(Expr),
    Cos(Expr),
}

/// Immutable symbolic scalar expression. Cloning is cheap and shares structure.
#[derive(Clone)]
pub struct Expr(Arc<Node>);

impl Expr {
    fn from_node(node: Node) -> Self {
        Expr(Arc::new(node))
    }

    pub fn constant(value: f64) -> Self {
        Expr::from_node(Node::Const(value))
    }

    pub fn zero() -> Self {
        Expr::constant(0.0)
    }

    pub fn one() -> Self {
        Expr::constant(1.0)
    }

    /// Reference to the free variable `var`.
    pub fn var(var: VarId) -> Self {
        Expr::from_node(Node::Var(var))
    }

    /// Returns the value if this expression is a plain constant.
    pub fn as_constant(&self) -> Option<f64> {
        match *self.0 {
            Node::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_constant() == Some(0.0)
    }

    fn is_one(&self) -> bool {
        self.as_constant() == Some(1.0)
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn sin(&self) -> Expr {
        match self.as_constant() {
            Some(c) => Expr::constant(c.sin()),
            None => Expr::from_node(Node::Sin(self.clone())),
        }
    }

    pub fn cos(&self) -> Expr {
        match self.as_constant() {
            Some(c) => Expr::constant(c.cos()),
            None => Expr::from_node(Node::Cos(self.clone())),
        }
    }

    fn negate(&self) -> Expr {
        match *self.0 {
            Node::Const(c) => Expr::constant(-c),
            Node::Neg(ref inner) => inner.clone(),
            _ => Expr::from_node(Node::Neg(self.clone())),
        }
    }

    fn sum(a: &Expr, b: &Expr) -> Expr {
        match (a.as_constant(), b.as_constant()) {
            (Some(x), Some(y)) => Expr::constant(x + y),
            (Some(x), _) if x == 0.0 => b.clone(),
            (_, Some(y)) if y == 0.0 => a.clone(),
            _ => Expr::from_node(Node::Add(a.clone(), b.clone())),
        }
    }

    fn difference(a: &Expr, b: &Expr) -> Expr {
        match (a.as_constant(), b.as_constant()) {
            (Some(x), Some(y)) => Expr::constant(x - y),
            (Some(x), _) if x == 0.0 => b.negate(),
            (_, Some(y)) if y == 0.0 => a.clone(),
            _ => Expr::from_node(Node::Sub(a.clone(), b.clone())),
        }
    }

    fn product(a: &Expr, b: &Expr) -> Expr {
        if a.is_zero() || b.is_zero() {
            return Expr::zero();
        }
        if a.is_one() {
            return b.clone();
        }
        if b.is_one() {
            return a.clone();
        }
        match (a.as_constant(), b.as_constant()) {
            (Some(x), Some(y)) => Expr::constant(x * y),
            (Some(x), _) if x == -1.0 => b.negate(),
            (_, Some(y)) if y == -1.0 => a.negate(),
            _ => Expr::from_node(Node::Mul(a.clone(), b.clone())),
        }
    }

    /// Evaluates the expression, with `assignment[v]` being the value of variable `v`.
    /// Fails with [SolverError::UnboundVariable] if the expression refers to a variable
    /// past the end of the assignment.
    pub fn eval(&self, assignment: &[f64]) -> Result<f64, SolverError> {
        Evaluator::new(assignment).eval(self)
    }

    /// Exact partial derivative with respect to `var`. The result is the zero constant
    /// if the expression does not depend on `var`.
    pub fn derivative(&self, var: VarId) -> Expr {
        Differentiator::new(var).derive(self)
    }

    /// True if `var` occurs anywhere in the expression.
    pub fn references(&self, var: VarId) -> bool {
        let mut seen = HashSet::new();
        self.any_node(&mut seen, &|node: &Node| matches!(node, Node::Var(v) if *v == var))
    }

    fn any_node(&self, seen: &mut HashSet<usize>, pred: &dyn Fn(&Node) -> bool) -> bool {
        if !seen.insert(self.key()) {
            return false;
        }
        if pred(&self.0) {
            return true;
        }
        match *self.0 {
            Node::Const(_) | Node::Var(_) => false,
            Node::Neg(ref a) | Node::Sin(ref a) | Node::Cos(ref a) => a.any_node(seen, pred),
            Node::Add(ref a, ref b) | Node::Sub(ref a, ref b) | Node::Mul(ref a, ref b) => {
                a.any_node(seen, pred) || b.any_node(seen, pred)
            }
        }
    }

    /// Number of distinct nodes, counting shared subexpressions once.
    pub fn node_count(&self) -> usize {
        let mut seen = HashSet::new();
        self.any_node(&mut seen, &|_: &Node| false);
        seen.len()
    }
}

/// Evaluates expressions against one assignment, computing every shared node only once.
/// Reuse the same evaluator for several expressions that share structure (matrix entries).
pub(crate) struct Evaluator<'a> {
    assignment: &'a [f64],
    memo: HashMap<usize, f64>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(assignment: &'a [f64]) -> Self {
        Evaluator { assignment, memo: HashMap::new() }
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<f64, SolverError> {
        if let Some(&value) = self.memo.get(&expr.key()) {
            return Ok(value);
        }
        let value = match *expr.0 {
            Node::Const(c) => c,
            Node::Var(v) => *self.assignment.get(v).ok_or(SolverError::UnboundVariable(v))?,
            Node::Neg(ref a) => -self.eval(a)?,
            Node::Add(ref a, ref b) => self.eval(a)? + self.eval(b)?,
            Node::Sub(ref a, ref b) => self.eval(a)? - self.eval(b)?,
            Node::Mul(ref a, ref b) => self.eval(a)? * self.eval(b)?,
            Node::Sin(ref a) => self.eval(a)?.sin(),
            Node::Cos(ref a) => self.eval(a)?.cos(),
        };
        self.memo.insert(expr.key(), value);
        Ok(value)
    }
}

/// Differentiates with respect to one variable. Shared subexpressions are differentiated
/// once and their derivatives are shared in the result as well.
pub(crate) struct Differentiator {
    var: VarId,
    memo: HashMap<usize, Expr>,
}

impl Differentiator {
    pub(crate) fn new(var: VarId) -> Self {
        Differentiator { var, memo: HashMap::new() }
    }

    pub(crate) fn derive(&mut self, expr: &Expr) -> Expr {
        if let Some(known) = self.memo.get(&expr.key()) {
            return known.clone();
        }
        let derived = match *expr.0 {
            Node::Const(_) => Expr::zero(),
            Node::Var(v) => {
                if v == self.var { Expr::one() } else { Expr::zero() }
            }
            Node::Neg(ref a) => self.derive(a).negate(),
            Node::Add(ref a, ref b) => Expr::sum(&self.derive(a), &self.derive(b)),
            Node::Sub(ref a, ref b) => Expr::difference(&self.derive(a), &self.derive(b)),
            Node::Mul(ref a, ref b) => {
                let da = self.derive(a);
                let db = self.derive(b);
                Expr::sum(&Expr::product(&da, b), &Expr::product(a, &db))
            }
            // d sin(f) = cos(f) * f'
            Node::Sin(ref a) => Expr::product(&self.derive(a), &a.cos()),
            // d cos(f) = -sin(f) * f'
            Node::Cos(ref a) => Expr::product(&self.derive(a), &a.sin()).negate(),
        };
        self.memo.insert(expr.key(), derived.clone());
        derived
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.0 {
            Node::Const(c) => write!(f, "{}", c),
            Node::Var(v) => write!(f, "v{}", v),
            Node::Neg(ref a) => write!(f, "-{}", a),
            Node::Add(ref a, ref b) => write!(f, "({} + {})", a, b),
            Node::Sub(ref a, ref b) => write!(f, "({} - {})", a, b),
            Node::Mul(ref a, ref b) => write!(f, "{} * {}", a, b),
            Node::Sin(ref a) => write!(f, "sin({})", a),
            Node::Cos(ref a) => write!(f, "cos({})", a),
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self)
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $build:ident) => {
        impl $trait for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::$build(&self, &rhs)
            }
        }

        impl<'a> $trait<&'a Expr> for &'a Expr {
            type Output = Expr;
            fn $method(self, rhs: &'a Expr) -> Expr {
                Expr::$build(self, rhs)
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::$build(&self, &Expr::constant(rhs))
            }
        }
    };
}

binary_op!(Add, add, sum);
binary_op!(Sub, sub, difference);
binary_op!(Mul, mul, product);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.negate()
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn assert_close(actual: f64, expected: f64, what: &str) {
        assert!((actual - expected).abs() < EPSILON, "{}: {} != {}", what, actual, expected);
    }

    #[test]
    fn test_eval_basic_operators() {
        let x = Expr::var(0);
        let y = Expr::var(1);
        let e = (&x + &y) * (&x - &y) + (-x.clone()) * 2.0;
        // (3 + 4) * (3 - 4) - 6
        assert_close(e.eval(&[3.0, 4.0]).unwrap(), -13.0, "polynomial");

        let t = x.sin() * x.sin() + x.cos() * x.cos();
        assert_close(t.eval(&[0.7]).unwrap(), 1.0, "pythagorean identity");
    }

    #[test]
    fn test_unbound_variable() {
        let e = Expr::var(0) + Expr::var(2);
        assert_eq!(e.eval(&[1.0, 2.0]), Err(SolverError::UnboundVariable(2)));
        assert!(e.eval(&[1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn test_constant_folding() {
        let x = Expr::var(0);
        assert!((x.clone() * 0.0).is_zero());
        assert_eq!((Expr::constant(2.0) * Expr::constant(3.0)).as_constant(), Some(6.0));
        assert_eq!(Expr::constant(0.0).cos().as_constant(), Some(1.0));
        // x * 1 + 0 is the same node as x
        let folded = x.clone() * 1.0 + 0.0;
        assert_eq!(folded.key(), x.key());
        // double negation cancels
        assert_eq!((-(-x.clone())).key(), x.key());
    }

    #[test]
    fn test_derivative_of_variable_and_constant() {
        let x = Expr::var(0);
        assert_eq!(x.derivative(0).as_constant(), Some(1.0));
        assert!(x.derivative(1).is_zero());
        assert!(Expr::constant(5.0).derivative(0).is_zero());
    }

    #[test]
    fn test_derivative_absent_variable_is_zero() {
        let x = Expr::var(0);
        let e = (x.clone() * 3.0).sin() * x.cos() + x.clone();
        assert!(!e.references(1));
        assert!(e.derivative(1).is_zero());
    }

    #[test]
    fn test_chain_rule_trig() {
        // d/dx cos(2x) = -2 sin(2x)
        let x = Expr::var(0);
        let e = (x.clone() * 2.0).cos();
        let d = e.derivative(0);
        for &v in &[-1.3, 0.0, 0.4, 2.9] {
            assert_close(d.eval(&[v]).unwrap(), -2.0 * (2.0 * v).sin(), "cos chain rule");
        }

        // d/dx sin(x * y) = y cos(x * y)
        let y = Expr::var(1);
        let e = (&x * &y).sin();
        let d = e.derivative(0);
        assert_close(d.eval(&[0.5, 3.0]).unwrap(), 3.0 * (1.5f64).cos(), "sin chain rule");
    }

    #[test]
    fn test_product_rule() {
        // d/dx x^2 sin(x) = 2x sin(x) + x^2 cos(x)
        let x = Expr::var(0);
        let e = &x * &x * x.sin();
        let d = e.derivative(0);
        let v: f64 = 1.1;
        assert_close(d.eval(&[v]).unwrap(), 2.0 * v * v.sin() + v * v * v.cos(), "product rule");
    }

    #[test]
    fn test_shared_nodes_counted_once() {
        let x = Expr::var(0);
        let s = x.sin();
        let e = &s * &s;
        // x, sin(x), product
        assert_eq!(e.node_count(), 3);
    }

    #[test]
    fn test_deep_sharing_stays_linear() {
        // Each level refers to the previous one twice. As a tree this doubles every level,
        // as a DAG it only grows by a constant.
        let mut e = Expr::var(0);
        for _ in 0..60 {
            e = &e.sin() + &e.cos();
        }
        assert!(e.node_count() < 300);
        assert!(e.eval(&[0.3]).unwrap().is_finite());
        assert!(e.derivative(0).eval(&[0.3]).unwrap().is_finite());
    }

    #[test]
    fn test_display() {
        let e = Expr::var(1).sin() + Expr::constant(2.0);
        assert_eq!(format!("{}", e), "(sin(v1) + 2)");
    }
}
