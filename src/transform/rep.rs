//! Replication transformer

use crate::expr::Expr;
use crate::matrix::{BufferId, Shape};

/// Replication view: each element of the operand repeated over trailing
/// dimensions
///
/// The result shape is the operand shape with the replication factors
/// appended; element `i` of the result reads operand element
/// `i / product(factors)`. Together with scalars this is the one sanctioned
/// shape-changing broadcast.
#[derive(Clone, Debug)]
pub struct Rep<E> {
    sub: E,
    shape: Shape,
    mult: usize,
}

/// Replicate each element of `sub` across trailing dimensions of the given
/// extents
///
/// # Panics
/// Panics if no factor is given or any factor is zero.
pub fn rep<E: Expr>(sub: E, factors: &[usize]) -> Rep<E> {
    assert!(!factors.is_empty(), "rep requires at least one factor");
    assert!(factors.iter().all(|&f| f > 0), "rep factors must be positive");
    let mut shape = sub.shape();
    shape.extend_from_slice(factors);
    let mult = factors.iter().product();
    Rep { sub, shape, mult }
}

impl<E: Expr> Expr for Rep<E> {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        self.shape.clone()
    }

    fn value(&self, i: usize) -> Self::Elem {
        self.sub.value(i / self.mult)
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
