//! Lazy unary expression node

use super::{Expr, UnaryFn};
use crate::matrix::{BufferId, Shape};

/// A unary operator applied lazily over a sub-expression
#[derive(Clone, Copy, Debug)]
pub struct UnaryExpr<E> {
    sub: E,
    op: UnaryFn,
}

impl<E: Expr> UnaryExpr<E> {
    /// Wrap a sub-expression
    pub fn new(sub: E, op: UnaryFn) -> Self {
        Self { sub, op }
    }
}

impl<E: Expr> Expr for UnaryExpr<E> {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        self.sub.shape()
    }

    fn value(&self, i: usize) -> Self::Elem {
        self.op.apply(self.sub.value(i))
    }

    fn is_linear(&self) -> bool {
        self.sub.is_linear()
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

    fn broadcasts(&self) -> bool {
        self.sub.broadcasts()
    }
}
