//! Sub-views and dimension views

use crate::expr::Expr;
use crate::matrix::{BufferId, Shape};

/// One slice of an expression's first dimension, seen as a 1-D expression
///
/// For a 2-D parent this is row `i`; for a 3-D parent the `i`-th matrix
/// flattened. The view size is the parent's size divided by its first
/// dimension.
#[derive(Clone, Copy, Debug)]
pub struct SubView<E> {
    parent: E,
    index: usize,
    sub_size: usize,
}

/// View slice `i` of the first dimension of `parent`
///
/// # Panics
/// Panics if `i` is out of range.
pub fn sub_view<E: Expr>(parent: E, i: usize) -> SubView<E> {
    let shape = parent.shape();
    assert!(!shape.is_empty(), "sub_view requires a dimensioned operand");
    assert!(i < shape[0], "sub_view index out of range");
    let sub_size = shape[1..].iter().product();
    SubView {
        parent,
        index: i,
        sub_size,
    }
}

impl<E: Expr> Expr for SubView<E> {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        let mut s = Shape::new();
        s.push(self.sub_size);
        s
    }

    fn value(&self, i: usize) -> Self::Elem {
        self.parent.value(self.index * self.sub_size + i)
    }

    fn is_linear(&self) -> bool {
        false
    }

    fn parallel_safe(&self) -> bool {
        self.parent.parallel_safe()
    }

    fn aliases(&self, id: BufferId) -> bool {
        self.parent.aliases(id)
    }

    fn ensure_cpu_up_to_date(&self) {
        self.parent.ensure_cpu_up_to_date()
    }

    fn ensure_gpu_up_to_date(&self) {
        self.parent.ensure_gpu_up_to_date()
    }
}

/// Axis along which a [`DimView`] slices
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DimAxis {
    Row,
    Col,
}

/// A single row or column of a 2-D expression as a 1-D expression
#[derive(Clone, Copy, Debug)]
pub struct DimView<E> {
    parent: E,
    index: usize,
    axis: DimAxis,
    rows: usize,
    cols: usize,
}

/// View slice `i` along dimension `d` of a 2-D expression
///
/// `d == 1` selects row `i`, `d == 2` selects column `i`.
///
/// # Panics
/// Panics if the operand is not 2-D, `d` is not 1 or 2, or `i` is out of
/// range.
pub fn dim_view<E: Expr>(parent: E, i: usize, d: usize) -> DimView<E> {
    let shape = parent.shape();
    assert_eq!(shape.len(), 2, "dim_view requires a 2-D operand");
    let (rows, cols) = (shape[0], shape[1]);
    let axis = match d {
        1 => DimAxis::Row,
        2 => DimAxis::Col,
        _ => panic!("dim_view dimension must be 1 (row) or 2 (column)"),
    };
    let extent = if axis == DimAxis::Row { rows } else { cols };
    assert!(i < extent, "dim_view index out of range");
    DimView {
        parent,
        index: i,
        axis,
        rows,
        cols,
    }
}

impl<E: Expr> Expr for DimView<E> {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        let mut s = Shape::new();
        s.push(match self.axis {
            DimAxis::Row => self.cols,
            DimAxis::Col => self.rows,
        });
        s
    }

    fn value(&self, i: usize) -> Self::Elem {
        match self.axis {
            DimAxis::Row => self.parent.value(self.index * self.cols + i),
            DimAxis::Col => self.parent.value(i * self.cols + self.index),
        }
    }

    fn is_linear(&self) -> bool {
        false
    }

    fn parallel_safe(&self) -> bool {
        self.parent.parallel_safe()
    }

    fn aliases(&self, id: BufferId) -> bool {
        self.parent.aliases(id)
    }

    fn ensure_cpu_up_to_date(&self) {
        self.parent.ensure_cpu_up_to_date()
    }

    fn ensure_gpu_up_to_date(&self) {
        self.parent.ensure_gpu_up_to_date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    #[test]
    fn test_sub_view_row() {
        let m = Matrix::from_values(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let v = sub_view(&m, 1);
        assert_eq!(v.shape().as_slice(), &[3]);
        assert_eq!(v.value(0), 4.0);
        assert_eq!(v.value(2), 6.0);
    }

    #[test]
    fn test_sub_view_of_3d() {
        let m = Matrix::from_values(&[2, 2, 2], (0..8).map(|x| x as f64).collect()).unwrap();
        let v = sub_view(&m, 1);
        assert_eq!(v.shape().as_slice(), &[4]);
        assert_eq!(v.value(0), 4.0);
        assert_eq!(v.value(3), 7.0);
    }

    #[test]
    fn test_dim_view_column() {
        let m = Matrix::from_values(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let col = dim_view(&m, 2, 2);
        assert_eq!(col.shape().as_slice(), &[2]);
        assert_eq!(col.value(0), 3.0);
        assert_eq!(col.value(1), 6.0);

        let row = dim_view(&m, 0, 1);
        assert_eq!(row.shape().as_slice(), &[3]);
        assert_eq!(row.value(1), 2.0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_sub_view_bounds() {
        let m = Matrix::<f64>::zeros(&[2, 3]);
        let _ = sub_view(&m, 2);
    }
}
