//! 2-D transposition view

use crate::expr::Expr;
use crate::matrix::{BufferId, Shape};

/// Axis-swapping view over a 2-D expression
///
/// Pure index remap, no data movement. Not linear: assigning a transpose of
/// a matrix into itself must go through a temporary, which the evaluator
/// arranges from this node's `is_linear` report.
#[derive(Clone, Copy, Debug)]
pub struct Transpose<E> {
    sub: E,
    rows: usize,
    cols: usize,
}

/// Swap the two axes of a 2-D expression
///
/// # Panics
/// Panics if the operand is not 2-D.
pub fn transpose<E: Expr>(sub: E) -> Transpose<E> {
    let shape = sub.shape();
    assert_eq!(shape.len(), 2, "transpose requires a 2-D operand");
    let (rows, cols) = (shape[0], shape[1]);
    Transpose { sub, rows, cols }
}

impl<E: Expr> Expr for Transpose<E> {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        let mut s = Shape::new();
        s.push(self.cols);
        s.push(self.rows);
        s
    }

    fn value(&self, i: usize) -> Self::Elem {
        // output coordinates (r, c) read input (c, r)
        let r = i / self.rows;
        let c = i % self.rows;
        self.sub.value(c * self.cols + r)
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
