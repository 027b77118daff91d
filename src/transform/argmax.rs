//! One-hot arg-max transformer

use crate::expr::Expr;
use crate::matrix::{BufferId, Shape};

/// One-hot encoding of each row's arg-max column
///
/// The arg-max of every row is computed once at construction, so evaluation
/// is O(1) per element afterwards. Ties break to the lowest column index.
/// The node keeps no reference to its operand: it never aliases and is
/// safe to assign back into the matrix it was built from.
#[derive(Clone, Debug)]
pub struct OneIfMaxSub<T> {
    argmax: Vec<usize>,
    cols: usize,
    _marker: std::marker::PhantomData<T>,
}

/// One-hot arg-max over each row of a 2-D expression
///
/// # Panics
/// Panics if the operand is not 2-D or has no columns.
pub fn one_if_max_sub<E: Expr>(sub: E) -> OneIfMaxSub<E::Elem> {
    let shape = sub.shape();
    assert_eq!(shape.len(), 2, "one_if_max_sub requires a 2-D operand");
    let (rows, cols) = (shape[0], shape[1]);
    assert!(cols > 0, "one_if_max_sub requires at least one column");

    sub.ensure_cpu_up_to_date();
    let mut argmax = Vec::with_capacity(rows);
    for r in 0..rows {
        let mut best = 0;
        let mut best_v = sub.value(r * cols);
        for c in 1..cols {
            let v = sub.value(r * cols + c);
            if v > best_v {
                best = c;
                best_v = v;
            }
        }
        argmax.push(best);
    }

    OneIfMaxSub {
        argmax,
        cols,
        _marker: std::marker::PhantomData,
    }
}

impl<T: crate::element::Element> Expr for OneIfMaxSub<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        let mut s = Shape::new();
        s.push(self.argmax.len());
        s.push(self.cols);
        s
    }

    fn value(&self, i: usize) -> T {
        let (r, c) = (i / self.cols, i % self.cols);
        if self.argmax[r] == c {
            T::one()
        } else {
            T::zero()
        }
    }

    fn aliases(&self, _id: BufferId) -> bool {
        false
    }
}
