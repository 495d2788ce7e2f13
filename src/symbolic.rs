//! Vectors and matrices with symbolic entries.
//!
//! This layer only assembles expression trees and evaluates them, it does no numeric
//! approximation on its own. Evaluated results are plain nalgebra `DVector<f64>` / `DMatrix<f64>`,
//! so numeric x numeric products are left to nalgebra.

use nalgebra::{DMatrix, DVector};

use crate::expression::{Differentiator, Evaluator, Expr, VarId};
use crate::solver_error::SolverError;

/// Column vector of expressions.
#[derive(Clone, Debug)]
pub struct SymVector {
    entries: Vec<Expr>,
}

/// Dense row-major matrix of expressions.
#[derive(Clone, Debug)]
pub struct SymMatrix {
    rows: usize,
    cols: usize,
    entries: Vec<Expr>,
}

fn ensure_dimension(expected: usize, found: usize) -> Result<(), SolverError> {
    if expected == found {
        Ok(())
    } else {
        Err(SolverError::DimensionMismatch { expected, found })
    }
}

/// Sum of pairwise products. Zero terms are folded away by the expression constructors.
fn dot<'a>(pairs: impl Iterator<Item = (&'a Expr, Expr)>) -> Expr {
    pairs.fold(Expr::zero(), |acc, (a, b)| acc + a * &b)
}

impl SymVector {
    pub fn new(entries: Vec<Expr>) -> Self {
        SymVector { entries }
    }

    pub fn from_constants(values: &[f64]) -> Self {
        SymVector::new(values.iter().map(|&v| Expr::constant(v)).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Expr> {
        self.entries.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expr> {
        self.entries.iter()
    }

    /// Evaluates every entry. Subexpressions shared between entries are computed once.
    pub fn eval(&self, assignment: &[f64]) -> Result<DVector<f64>, SolverError> {
        self.eval_with(&mut Evaluator::new(assignment))
    }

    pub(crate) fn eval_with(&self, evaluator: &mut Evaluator) -> Result<DVector<f64>, SolverError> {
        let values = self.entries.iter()
            .map(|e| evaluator.eval(e))
            .collect::<Result<Vec<f64>, SolverError>>()?;
        Ok(DVector::from_vec(values))
    }

    /// Entry-wise partial derivative with respect to `var`.
    pub fn derivative(&self, var: VarId) -> SymVector {
        let mut differentiator = Differentiator::new(var);
        SymVector::new(self.entries.iter().map(|e| differentiator.derive(e)).collect())
    }

    /// Returns a vector with `value` appended (homogeneous coordinates).
    pub fn extended(&self, value: Expr) -> SymVector {
        let mut entries = self.entries.clone();
        entries.push(value);
        SymVector::new(entries)
    }

    /// Returns the first `n` entries.
    pub fn truncated(&self, n: usize) -> Result<SymVector, SolverError> {
        if n > self.entries.len() {
            return Err(SolverError::DimensionMismatch { expected: n, found: self.entries.len() });
        }
        Ok(SymVector::new(self.entries[..n].to_vec()))
    }
}

impl SymMatrix {
    /// Builds a matrix from row-major entries.
    pub fn from_row_major(rows: usize, cols: usize, entries: Vec<Expr>) -> Result<Self, SolverError> {
        ensure_dimension(rows * cols, entries.len())?;
        Ok(SymMatrix { rows, cols, entries })
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Expr) -> Self {
        let mut entries = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                entries.push(f(r, c));
            }
        }
        SymMatrix { rows, cols, entries }
    }

    pub fn identity(n: usize) -> Self {
        SymMatrix::from_fn(n, n, |r, c| if r == c { Expr::one() } else { Expr::zero() })
    }

    /// Matrix whose columns are the given vectors, all of length `rows`.
    pub fn from_columns(rows: usize, columns: &[SymVector]) -> Result<Self, SolverError> {
        for column in columns {
            ensure_dimension(rows, column.len())?;
        }
        Ok(SymMatrix::from_fn(rows, columns.len(), |r, c| columns[c].entries[r].clone()))
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Expr> {
        if row < self.rows && col < self.cols {
            self.entries.get(row * self.cols + col)
        } else {
            None
        }
    }

    fn at(&self, row: usize, col: usize) -> &Expr {
        &self.entries[row * self.cols + col]
    }

    pub fn transpose(&self) -> SymMatrix {
        SymMatrix::from_fn(self.cols, self.rows, |r, c| self.at(c, r).clone())
    }

    /// Symbolic product `self * other`.
    pub fn mul(&self, other: &SymMatrix) -> Result<SymMatrix, SolverError> {
        ensure_dimension(self.cols, other.rows)?;
        Ok(SymMatrix::from_fn(self.rows, other.cols, |r, c| {
            dot((0..self.cols).map(|k| (self.at(r, k), other.at(k, c).clone())))
        }))
    }

    /// Product with a numeric matrix. The numeric entries are folded in as constants.
    pub fn mul_numeric(&self, other: &DMatrix<f64>) -> Result<SymMatrix, SolverError> {
        ensure_dimension(self.cols, other.nrows())?;
        Ok(SymMatrix::from_fn(self.rows, other.ncols(), |r, c| {
            dot((0..self.cols).map(|k| (self.at(r, k), Expr::constant(other[(k, c)]))))
        }))
    }

    /// Matrix-vector product `self * v`.
    pub fn mul_vector(&self, v: &SymVector) -> Result<SymVector, SolverError> {
        ensure_dimension(self.cols, v.len())?;
        Ok(SymVector::new((0..self.rows)
            .map(|r| dot((0..self.cols).map(|k| (self.at(r, k), v.entries[k].clone()))))
            .collect()))
    }

    /// Product with a numeric vector.
    pub fn mul_numeric_vector(&self, v: &DVector<f64>) -> Result<SymVector, SolverError> {
        ensure_dimension(self.cols, v.len())?;
        Ok(SymVector::new((0..self.rows)
            .map(|r| dot((0..self.cols).map(|k| (self.at(r, k), Expr::constant(v[k])))))
            .collect()))
    }

    /// Entry-wise partial derivative with respect to `var`.
    pub fn derivative(&self, var: VarId) -> SymMatrix {
        let mut differentiator = Differentiator::new(var);
        SymMatrix {
            rows: self.rows,
            cols: self.cols,
            entries: self.entries.iter().map(|e| differentiator.derive(e)).collect(),
        }
    }

    /// Evaluates every entry. Subexpressions shared between entries are computed once.
    pub fn eval(&self, assignment: &[f64]) -> Result<DMatrix<f64>, SolverError> {
        self.eval_with(&mut Evaluator::new(assignment))
    }

    pub(crate) fn eval_with(&self, evaluator: &mut Evaluator) -> Result<DMatrix<f64>, SolverError> {
        let values = self.entries.iter()
            .map(|e| evaluator.eval(e))
            .collect::<Result<Vec<f64>, SolverError>>()?;
        Ok(DMatrix::from_row_slice(self.rows, self.cols, &values))
    }

    /// Total number of distinct expression nodes over all entries (per-entry sharing only).
    pub fn node_count(&self) -> usize {
        self.entries.iter().map(|e| e.node_count()).sum()
    }
}
