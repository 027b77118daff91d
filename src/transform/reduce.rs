//! Per-row reduction transformers

use crate::expr::Expr;
use crate::matrix::{BufferId, Shape};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Reduction {
    Sum,
    Mean,
}

/// Row-wise reduction of a 2-D expression into a 1-D expression
///
/// Element `i` of the result is the sum (or mean) of row `i` of the
/// operand, computed on demand.
#[derive(Clone, Copy, Debug)]
pub struct RowReduce<E> {
    sub: E,
    rows: usize,
    cols: usize,
    reduction: Reduction,
}

/// Reduce each row of a 2-D expression to its sum
pub fn row_sum<E: Expr>(sub: E) -> RowReduce<E> {
    RowReduce::new(sub, Reduction::Sum)
}

/// Reduce each row of a 2-D expression to its mean
pub fn row_mean<E: Expr>(sub: E) -> RowReduce<E> {
    RowReduce::new(sub, Reduction::Mean)
}

impl<E: Expr> RowReduce<E> {
    fn new(sub: E, reduction: Reduction) -> Self {
        let shape = sub.shape();
        assert_eq!(shape.len(), 2, "row reductions require a 2-D operand");
        Self {
            rows: shape[0],
            cols: shape[1],
            sub,
            reduction,
        }
    }
}

impl<E: Expr> Expr for RowReduce<E> {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        let mut s = Shape::new();
        s.push(self.rows);
        s
    }

    fn value(&self, i: usize) -> Self::Elem {
        use crate::element::Element;

        let mut total = Self::Elem::zero();
        for c in 0..self.cols {
            total = total + self.sub.value(i * self.cols + c);
        }
        match self.reduction {
            Reduction::Sum => total,
            Reduction::Mean => Self::Elem::from_f64(total.to_f64() / self.cols as f64),
        }
    }

    fn is_linear(&self) -> bool {
        false
    }

    fn parallel_safe(&self) -> bool {
        self.sub.parallel_safe()
    }

    fn aliases(&self, id: BufferId) -> bool {
        self.sub.aliases(id)
    }

    fn ensure_cpu_up_to_date(&self) {
        self.sub.ensure_cpu_up_to_date()
    }

    fn ensure_gpu_up_to_date(&self) {
        self.sub.ensure_gpu_up_to_date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    #[test]
    fn test_row_sum() {
        let m = Matrix::from_values(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let s = row_sum(&m);
        assert_eq!(s.shape().as_slice(), &[2]);
        assert_eq!(s.value(0), 6.0);
        assert_eq!(s.value(1), 15.0);
    }

    #[test]
    fn test_row_mean() {
        let m = Matrix::from_values(&[2, 2], vec![1.0, 3.0, 10.0, 20.0]).unwrap();
        let s = row_mean(&m);
        assert_eq!(s.value(0), 2.0);
        assert_eq!(s.value(1), 15.0);
    }

    #[test]
    fn test_integer_mean_truncates() {
        let m = Matrix::from_values(&[1, 2], vec![1i64, 2i64]).unwrap();
        assert_eq!(row_mean(&m).value(0), 1);
    }
}
