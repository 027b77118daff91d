//! Diagonal matrix adapter

use super::entry::EntryWrite;
use super::is_diagonal;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::eval;
use crate::expr::{Ex, Expr};
use crate::matrix::{BufferId, Matrix, Shape};
use std::fmt;

/// Square matrix constrained to zero off the main diagonal
///
/// Starts all-zero. Every mutation is validated first: assigning an
/// expression with a non-zero off-diagonal element, or writing a non-zero
/// value off the diagonal through [`with_entry`](super::with_entry), fails
/// with [`Error::StructuralViolation`] and leaves the contents untouched.
pub struct DiagonalMatrix<T> {
    mat: Matrix<T>,
}

impl<T: Element> Clone for DiagonalMatrix<T> {
    fn clone(&self) -> Self {
        Self {
            mat: self.mat.clone(),
        }
    }
}

impl<T: Element> PartialEq for DiagonalMatrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.mat == other.mat
    }
}

impl<T: Element> fmt::Debug for DiagonalMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagonalMatrix").field("mat", &self.mat).finish()
    }
}

impl<T: Element> DiagonalMatrix<T> {
    /// Zero n x n diagonal matrix
    pub fn new(n: usize) -> Self {
        Self {
            mat: Matrix::zeros(&[n, n]),
        }
    }

    /// Side length
    #[inline]
    pub fn n(&self) -> usize {
        self.mat.rows()
    }

    /// The underlying dense matrix
    #[inline]
    pub fn as_matrix(&self) -> &Matrix<T> {
        &self.mat
    }

    /// Element at 2-D coordinates
    #[inline]
    pub fn get2(&self, i: usize, j: usize) -> T {
        self.mat.get2(i, j)
    }

    /// Wrap for operator composition
    #[inline]
    pub fn ex(&self) -> Ex<&Self> {
        Ex(self)
    }

    /// Assign an expression, validating the diagonal structure first
    ///
    /// The expression is materialized once, checked, and only then copied
    /// in; on rejection the adapter is unmodified.
    pub fn assign<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        if expr.shape() != self.mat.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.mat.shape().to_vec(),
                got: expr.shape().to_vec(),
            });
        }
        let candidate = eval::make_temporary(&expr);
        if !is_diagonal(&candidate) {
            return Err(Error::StructuralViolation { adapter: "diagonal" });
        }
        self.mat.assign(&candidate)
    }

    /// Scale every element by a scalar (structure-preserving)
    pub fn mul_scalar(&mut self, v: T) {
        for slot in self.mat.data_mut() {
            *slot = *slot * v;
        }
    }

    /// Divide every element by a scalar (structure-preserving)
    pub fn div_scalar(&mut self, v: T) {
        for slot in self.mat.data_mut() {
            *slot = *slot / v;
        }
    }

    /// Add an expression element-wise, re-validating the result
    pub fn assign_add<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        self.compound(expr, |m, c| m.assign_add(c))
    }

    /// Subtract an expression element-wise, re-validating the result
    pub fn assign_sub<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        self.compound(expr, |m, c| m.assign_sub(c))
    }

    fn compound<E, F>(&mut self, expr: E, apply: F) -> Result<()>
    where
        E: Expr<Elem = T> + Sync,
        F: FnOnce(&mut Matrix<T>, &Matrix<T>) -> Result<()>,
    {
        let candidate = eval::make_temporary(&expr);
        let mut next = self.mat.clone();
        apply(&mut next, &candidate)?;
        if !is_diagonal(&next) {
            return Err(Error::StructuralViolation { adapter: "diagonal" });
        }
        self.mat = next;
        Ok(())
    }
}

impl<T: Element> EntryWrite for DiagonalMatrix<T> {
    type Elem = T;

    fn entry(&self, i: usize, j: usize) -> T {
        self.mat.get2(i, j)
    }

    fn set_entry(&mut self, i: usize, j: usize, v: T) -> Result<()> {
        if i != j && v != T::zero() {
            return Err(Error::StructuralViolation { adapter: "diagonal" });
        }
        self.mat.set2(i, j, v);
        Ok(())
    }
}

impl<T: Element> Expr for DiagonalMatrix<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        self.mat.shape()
    }

    fn value(&self, i: usize) -> T {
        self.mat.value(i)
    }

    fn aliases(&self, id: BufferId) -> bool {
        self.mat.aliases(id)
    }

    fn ensure_cpu_up_to_date(&self) {
        self.mat.ensure_cpu_up_to_date()
    }

    fn ensure_gpu_up_to_date(&self) {
        self.mat.ensure_gpu_up_to_date()
    }
}
