//! Axis-reversal transformers

use crate::expr::Expr;
use crate::matrix::{BufferId, Shape};

/// Which axes a [`Flip`] reverses
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipAxes {
    /// Reverse the last axis (columns of a 2-D operand)
    Horizontal,
    /// Reverse the first axis (rows of a 2-D operand); identity on 1-D
    Vertical,
    /// Reverse both axes
    Full,
}

/// Index-reversal view over a 1-D or 2-D expression
#[derive(Clone, Copy, Debug)]
pub struct Flip<E> {
    sub: E,
    axes: FlipAxes,
}

/// Reverse the last axis
pub fn hflip<E: Expr>(sub: E) -> Flip<E> {
    Flip::new(sub, FlipAxes::Horizontal)
}

/// Reverse the first axis (identity on 1-D operands)
pub fn vflip<E: Expr>(sub: E) -> Flip<E> {
    Flip::new(sub, FlipAxes::Vertical)
}

/// Reverse both axes
pub fn fflip<E: Expr>(sub: E) -> Flip<E> {
    Flip::new(sub, FlipAxes::Full)
}

impl<E: Expr> Flip<E> {
    fn new(sub: E, axes: FlipAxes) -> Self {
        let nd = sub.ndim();
        assert!(nd == 1 || nd == 2, "flips require a 1-D or 2-D operand");
        Self { sub, axes }
    }
}

impl<E: Expr> Expr for Flip<E> {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        self.sub.shape()
    }

    fn value(&self, i: usize) -> Self::Elem {
        let shape = self.sub.shape();
        if shape.len() == 1 {
            let n = shape[0];
            return match self.axes {
                FlipAxes::Vertical => self.sub.value(i),
                FlipAxes::Horizontal | FlipAxes::Full => self.sub.value(n - 1 - i),
            };
        }

        let (rows, cols) = (shape[0], shape[1]);
        let (mut r, mut c) = (i / cols, i % cols);
        match self.axes {
            FlipAxes::Horizontal => c = cols - 1 - c,
            FlipAxes::Vertical => r = rows - 1 - r,
            FlipAxes::Full => {
                r = rows - 1 - r;
                c = cols - 1 - c;
            }
        }
        self.sub.value(r * cols + c)
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
