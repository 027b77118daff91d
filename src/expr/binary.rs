//! Lazy binary expression node

use super::{BinaryFn, Expr};
use crate::matrix::{BufferId, Shape};

/// Composition of two sub-expressions with a binary operator
///
/// Never owns storage; elements are computed on demand. The operand shapes
/// must match exactly unless one side broadcasts (scalar), and the shape of
/// the node is fixed at construction.
#[derive(Clone, Copy, Debug)]
pub struct BinaryExpr<L, R> {
    lhs: L,
    rhs: R,
    op: BinaryFn,
}

impl<L: Expr, R: Expr<Elem = L::Elem>> BinaryExpr<L, R> {
    /// Compose two expressions
    ///
    /// # Panics
    /// Panics if neither operand broadcasts and their shapes differ.
    pub fn new(lhs: L, rhs: R, op: BinaryFn) -> Self {
        if !lhs.broadcasts() && !rhs.broadcasts() {
            assert_eq!(
                lhs.shape(),
                rhs.shape(),
                "binary expression operand shapes must match"
            );
        }
        Self { lhs, rhs, op }
    }
}

impl<L: Expr, R: Expr<Elem = L::Elem>> Expr for BinaryExpr<L, R> {
    type Elem = L::Elem;

    fn shape(&self) -> Shape {
        if self.lhs.broadcasts() {
            self.rhs.shape()
        } else {
            self.lhs.shape()
        }
    }

    fn value(&self, i: usize) -> Self::Elem {
        self.op.apply(self.lhs.value(i), self.rhs.value(i))
    }

    fn is_linear(&self) -> bool {
        self.lhs.is_linear() && self.rhs.is_linear()
    }

    fn parallel_safe(&self) -> bool {
        self.lhs.parallel_safe() && self.rhs.parallel_safe()
    }

    fn aliases(&self, id: BufferId) -> bool {
        self.lhs.aliases(id) || self.rhs.aliases(id)
    }

    fn ensure_cpu_up_to_date(&self) {
        self.lhs.ensure_cpu_up_to_date();
        self.rhs.ensure_cpu_up_to_date();
    }

    fn ensure_gpu_up_to_date(&self) {
        self.lhs.ensure_gpu_up_to_date();
        self.rhs.ensure_gpu_up_to_date();
    }

    fn broadcasts(&self) -> bool {
        self.lhs.broadcasts() && self.rhs.broadcasts()
    }
}
