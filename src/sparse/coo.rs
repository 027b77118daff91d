//! Coordinate-format sparse matrix

use crate::adapters::EntryWrite;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::eval;
use crate::expr::{Ex, Expr};
use crate::matrix::{BufferId, Shape};

/// 2-D sparse matrix in coordinate (COO) format
///
/// Three parallel arrays hold the stored entries, kept sorted by
/// (row, column). Explicit zeros are never stored: writing zero over an
/// existing entry removes it, and absent coordinates read as zero. The
/// element count invariant is `nnz == values.len()` at all times.
#[derive(Debug)]
pub struct SparseMatrix<T> {
    id: BufferId,
    rows: usize,
    cols: usize,
    row_idx: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Element> SparseMatrix<T> {
    /// Empty rows x cols sparse matrix
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            id: BufferId::new(),
            rows,
            cols,
            row_idx: Vec::new(),
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Sparse matrix from dense row-major values, zeros skipped
    pub fn from_values(rows: usize, cols: usize, values: Vec<T>) -> Result<Self> {
        if values.len() != rows * cols {
            return Err(Error::ShapeMismatch {
                expected: vec![rows, cols],
                got: vec![values.len()],
            });
        }
        let mut out = Self::new(rows, cols);
        for (i, v) in values.into_iter().enumerate() {
            if v != T::zero() {
                out.row_idx.push(i / cols);
                out.col_idx.push(i % cols);
                out.values.push(v);
            }
        }
        Ok(out)
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[inline]
    pub fn columns(&self) -> usize {
        self.cols
    }

    /// Number of stored (non-zero) entries
    #[inline]
    pub fn non_zeros(&self) -> usize {
        self.values.len()
    }

    /// Position of (i, j) in the sorted entry arrays
    ///
    /// `Ok(n)` when entry n holds (i, j); `Err(n)` with the insertion point
    /// otherwise. Entries are scanned in order, so the returned point keeps
    /// the arrays sorted on insert.
    fn find_n(&self, i: usize, j: usize) -> std::result::Result<usize, usize> {
        for n in 0..self.values.len() {
            let (r, c) = (self.row_idx[n], self.col_idx[n]);
            if r == i && c == j {
                return Ok(n);
            }
            if r > i || (r == i && c > j) {
                return Err(n);
            }
        }
        Err(self.values.len())
    }

    /// Value at (i, j); absent coordinates read as zero
    pub fn get(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.rows && j < self.cols);
        match self.find_n(i, j) {
            Ok(n) => self.values[n],
            Err(_) => T::zero(),
        }
    }

    /// Write a value at (i, j)
    ///
    /// Non-zero values insert at the sorted position or overwrite in place;
    /// zero removes any existing entry.
    pub fn set(&mut self, i: usize, j: usize, v: T) {
        debug_assert!(i < self.rows && j < self.cols);
        match self.find_n(i, j) {
            Ok(n) => {
                if v == T::zero() {
                    self.remove_at(n);
                } else {
                    self.values[n] = v;
                }
            }
            Err(n) => {
                if v != T::zero() {
                    self.row_idx.insert(n, i);
                    self.col_idx.insert(n, j);
                    self.values.insert(n, v);
                }
            }
        }
    }

    /// Remove the entry at (i, j) if present
    pub fn erase(&mut self, i: usize, j: usize) {
        if let Ok(n) = self.find_n(i, j) {
            self.remove_at(n);
        }
    }

    fn remove_at(&mut self, n: usize) {
        self.row_idx.remove(n);
        self.col_idx.remove(n);
        self.values.remove(n);
    }

    /// Iterate stored entries as (row, column, value) in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.values.len()).map(|n| (self.row_idx[n], self.col_idx[n], self.values[n]))
    }

    /// Wrap for operator composition
    #[inline]
    pub fn ex(&self) -> Ex<&Self> {
        Ex(self)
    }

    /// Assign an expression, rebuilding the stored entries
    ///
    /// The expression is materialized first; on shape mismatch nothing
    /// changes. Zeros in the result are not stored.
    pub fn assign<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        let shape = expr.shape();
        if !expr.broadcasts() && (shape.len() != 2 || shape[0] != self.rows || shape[1] != self.cols)
        {
            return Err(Error::ShapeMismatch {
                expected: vec![self.rows, self.cols],
                got: shape.to_vec(),
            });
        }
        let dense = if expr.broadcasts() {
            None
        } else {
            Some(eval::make_temporary(&expr))
        };
        self.row_idx.clear();
        self.col_idx.clear();
        self.values.clear();
        for i in 0..self.rows {
            for j in 0..self.cols {
                let v = match &dense {
                    Some(d) => d.get2(i, j),
                    None => expr.value(i * self.cols + j),
                };
                if v != T::zero() {
                    self.row_idx.push(i);
                    self.col_idx.push(j);
                    self.values.push(v);
                }
            }
        }
        Ok(())
    }
}

impl<T: Element> PartialEq for SparseMatrix<T> {
    /// Logical comparison: dimensions and stored entries, identity ignored
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.row_idx == other.row_idx
            && self.col_idx == other.col_idx
            && self.values == other.values
    }
}

impl<T: Element> Clone for SparseMatrix<T> {
    /// Clones get a fresh identity for aliasing queries
    fn clone(&self) -> Self {
        Self {
            id: BufferId::new(),
            rows: self.rows,
            cols: self.cols,
            row_idx: self.row_idx.clone(),
            col_idx: self.col_idx.clone(),
            values: self.values.clone(),
        }
    }
}

impl<T: Element> EntryWrite for SparseMatrix<T> {
    type Elem = T;

    fn entry(&self, i: usize, j: usize) -> T {
        // out-of-range coordinates read as zero; the write path reports
        // the bounds error
        if i >= self.rows || j >= self.cols {
            return T::zero();
        }
        self.get(i, j)
    }

    fn set_entry(&mut self, i: usize, j: usize, v: T) -> Result<()> {
        if i >= self.rows || j >= self.cols {
            return Err(Error::IndexOutOfBounds {
                index: if i >= self.rows { i } else { j },
                size: if i >= self.rows { self.rows } else { self.cols },
            });
        }
        self.set(i, j, v);
        Ok(())
    }
}

impl<T: Element> Expr for SparseMatrix<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        let mut s = Shape::new();
        s.push(self.rows);
        s.push(self.cols);
        s
    }

    fn value(&self, i: usize) -> T {
        self.get(i / self.cols, i % self.cols)
    }

    fn aliases(&self, id: BufferId) -> bool {
        self.id == id
    }
}
