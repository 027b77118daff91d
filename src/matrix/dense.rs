//! Dense n-dimensional matrix

use super::{elem_count, shape_of, storage_index, Buffer, BufferId, Shape, StorageOrder};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::eval::{self, AssignMode};
use crate::expr::{Ex, Expr};
use std::fmt;

/// Dense container over contiguous storage
///
/// The storage order decides the in-memory layout only; all element access
/// through the expression interface is in logical row-major order, so two
/// matrices of opposite order compare equal element-wise when they hold the
/// same logical values.
pub struct Matrix<T> {
    buf: Buffer<T>,
    shape: Shape,
    order: StorageOrder,
}

impl<T: Element> Matrix<T> {
    /// Zero-filled row-major matrix
    pub fn zeros(shape: &[usize]) -> Self {
        Self::zeros_with_order(shape, StorageOrder::RowMajor)
    }

    /// Zero-filled matrix with an explicit storage order
    pub fn zeros_with_order(shape: &[usize], order: StorageOrder) -> Self {
        Self {
            buf: Buffer::zeroed(elem_count(shape)),
            shape: shape_of(shape),
            order,
        }
    }

    /// Matrix filled with one value
    pub fn filled(shape: &[usize], value: T) -> Self {
        Self {
            buf: Buffer::from_vec(vec![value; elem_count(shape)]),
            shape: shape_of(shape),
            order: StorageOrder::RowMajor,
        }
    }

    /// Row-major matrix over the given values in logical order
    pub fn from_values(shape: &[usize], values: Vec<T>) -> Result<Self> {
        Self::from_values_with_order(shape, values, StorageOrder::RowMajor)
    }

    /// Matrix over the given values in logical row-major order, stored with
    /// an explicit storage order
    pub fn from_values_with_order(
        shape: &[usize],
        values: Vec<T>,
        order: StorageOrder,
    ) -> Result<Self> {
        if elem_count(shape) != values.len() {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![values.len()],
            });
        }
        let data = match order {
            StorageOrder::RowMajor => values,
            StorageOrder::ColMajor => {
                let mut data = values.clone();
                for (i, v) in values.into_iter().enumerate() {
                    data[storage_index(order, shape, i)] = v;
                }
                data
            }
        };
        Ok(Self {
            buf: Buffer::from_vec(data),
            shape: shape_of(shape),
            order,
        })
    }

    /// The storage order
    #[inline]
    pub fn order(&self) -> StorageOrder {
        self.order
    }

    /// Extent of one dimension
    #[inline]
    pub fn dim(&self, d: usize) -> usize {
        self.shape[d]
    }

    /// Rows of a 2-D matrix
    #[inline]
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Columns of a 2-D matrix
    #[inline]
    pub fn columns(&self) -> usize {
        self.shape[1]
    }

    /// The backing buffer
    #[inline]
    pub fn buffer(&self) -> &Buffer<T> {
        &self.buf
    }

    /// The backing buffer's unique ID
    #[inline]
    pub fn buffer_id(&self) -> BufferId {
        self.buf.id()
    }

    /// Storage-ordered host data, refreshed from the device if stale
    #[inline]
    pub fn data(&self) -> &[T] {
        self.buf.host()
    }

    /// Mutable storage-ordered host data
    ///
    /// The host copy is refreshed first if the device side was fresher, then
    /// the device mirror is invalidated; writes land on current data.
    pub fn data_mut(&mut self) -> &mut [T] {
        self.buf.ensure_cpu_up_to_date();
        self.buf.invalidate_gpu();
        self.buf.host_mut()
    }

    /// Element at a logical row-major flat index
    #[inline]
    pub fn get(&self, i: usize) -> T {
        self.buf.host()[storage_index(self.order, &self.shape, i)]
    }

    /// Write an element at a logical row-major flat index
    pub fn set(&mut self, i: usize, v: T) {
        let idx = storage_index(self.order, &self.shape, i);
        self.buf.ensure_cpu_up_to_date();
        self.buf.invalidate_gpu();
        self.buf.host_mut()[idx] = v;
    }

    /// Element at 2-D coordinates
    #[inline]
    pub fn get2(&self, i: usize, j: usize) -> T {
        debug_assert_eq!(self.shape.len(), 2);
        self.get(i * self.shape[1] + j)
    }

    /// Write an element at 2-D coordinates
    pub fn set2(&mut self, i: usize, j: usize, v: T) {
        debug_assert_eq!(self.shape.len(), 2);
        self.set(i * self.shape[1] + j, v)
    }

    /// Fill with one value
    pub fn fill(&mut self, v: T) {
        self.buf.ensure_cpu_up_to_date();
        self.buf.invalidate_gpu();
        self.buf.host_mut().fill(v);
    }

    /// Transpose a 2-D matrix in place
    ///
    /// The transposed values are materialized into a temporary before the
    /// write-back, so no element is read after being overwritten.
    pub fn transpose_self(&mut self) -> Result<()> {
        let tmp = eval::make_temporary(&crate::transform::transpose(&*self));
        self.shape = tmp.shape();
        eval::assign_into(self, &tmp, AssignMode::Replace)
    }

    /// Wrap for operator composition
    #[inline]
    pub fn ex(&self) -> Ex<&Self> {
        Ex(self)
    }

    /// Evaluate an expression into this matrix
    pub fn assign<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        eval::assign_into(self, &expr, AssignMode::Replace)
    }

    /// Evaluate an expression and add it element-wise into this matrix
    pub fn assign_add<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        eval::assign_into(self, &expr, AssignMode::Add)
    }

    /// Evaluate an expression and subtract it element-wise from this matrix
    pub fn assign_sub<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        eval::assign_into(self, &expr, AssignMode::Sub)
    }

    /// Evaluate an expression and multiply it element-wise into this matrix
    pub fn assign_mul<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        eval::assign_into(self, &expr, AssignMode::Mul)
    }

    /// Evaluate an expression and divide this matrix element-wise by it
    pub fn assign_div<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        eval::assign_into(self, &expr, AssignMode::Div)
    }

    /// Evaluate an expression and take this matrix element-wise modulo it
    pub fn assign_mod<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
        eval::assign_into(self, &expr, AssignMode::Mod)
    }
}

impl<T: Element> Expr for Matrix<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        self.shape.clone()
    }

    fn value(&self, i: usize) -> T {
        self.get(i)
    }

    fn aliases(&self, id: BufferId) -> bool {
        self.buf.id() == id
    }

    fn ensure_cpu_up_to_date(&self) {
        self.buf.ensure_cpu_up_to_date()
    }

    fn ensure_gpu_up_to_date(&self) {
        self.buf.ensure_gpu_up_to_date()
    }
}

impl<T: Element> Clone for Matrix<T> {
    /// Clones get a fresh buffer (and buffer ID) holding the same values
    fn clone(&self) -> Self {
        Self {
            buf: self.buf.clone(),
            shape: self.shape.clone(),
            order: self.order,
        }
    }
}

impl<T: Element> PartialEq for Matrix<T> {
    /// Logical comparison: shape and element values, storage order ignored
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && (0..self.size()).all(|i| self.get(i) == other.get(i))
    }
}

impl<T: Element> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("shape", &self.shape.as_slice())
            .field("order", &self.order)
            .field("dtype", &T::DTYPE)
            .finish()
    }
}
