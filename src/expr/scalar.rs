//! Broadcasting scalar expression

use super::Expr;
use crate::element::Element;
use crate::matrix::{BufferId, Shape};

/// A scalar value usable wherever an expression is expected
///
/// Scalars broadcast to the shape of whatever they are combined with or
/// assigned into; they are the one sanctioned exception to exact shape
/// matching (together with replication).
#[derive(Copy, Clone, Debug)]
pub struct Scalar<T> {
    value: T,
}

impl<T: Element> Scalar<T> {
    /// Wrap a value
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// The wrapped value
    pub fn get(&self) -> T {
        self.value
    }
}

impl<T: Element> Expr for Scalar<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        Shape::new()
    }

    fn value(&self, _i: usize) -> T {
        self.value
    }

    fn aliases(&self, _id: BufferId) -> bool {
        false
    }

    fn broadcasts(&self) -> bool {
        true
    }
}
