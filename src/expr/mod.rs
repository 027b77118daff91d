//! Lazy expression graph
//!
//! An expression is an immutable description of an array computation:
//! value-backed (matrices, sparse matrices, scalars) or lazy (unary/binary
//! nodes, transformers). Expressions are composed with ordinary arithmetic
//! through the [`Ex`] wrapper and materialized by the evaluator
//! (`crate::eval`) when assigned into a destination.

mod binary;
mod noise;
mod ops;
mod scalar;
mod unary;
mod upsample;

pub use binary::BinaryExpr;
pub use noise::{NoiseCtx, NoiseExpr, NoiseFn};
pub use ops::{BinaryFn, UnaryFn};
pub use scalar::Scalar;
pub use unary::UnaryExpr;
pub use upsample::{upsample_3d, Upsample3d};

use crate::element::Element;
use crate::matrix::BufferId;
use crate::matrix::Shape;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// Capability interface of every expression
///
/// Element access is through logical row-major flat indices regardless of
/// any operand's storage order; `at2`/`at3` are coordinate conveniences
/// derived from it. Dimensionality and element type are fixed at
/// construction.
pub trait Expr {
    /// The element type
    type Elem: Element;

    /// Logical shape of the expression
    fn shape(&self) -> Shape;

    /// Element at a logical row-major flat index
    fn value(&self, i: usize) -> Self::Elem;

    /// Whether element evaluation order is irrelevant
    ///
    /// Linear expressions may be evaluated in place even when they alias
    /// the assignment destination; reindexing transforms such as transposes
    /// and flips are not linear.
    fn is_linear(&self) -> bool {
        true
    }

    /// Whether the expression may be evaluated from multiple threads
    ///
    /// Stochastic operators share a generator and must report `false`; the
    /// evaluator honors this before choosing the parallel path.
    fn parallel_safe(&self) -> bool {
        true
    }

    /// Whether this expression reads the storage identified by `id`
    fn aliases(&self, id: BufferId) -> bool;

    /// Ensure every storage-backed operand is CPU-fresh
    fn ensure_cpu_up_to_date(&self) {}

    /// Ensure every storage-backed operand is device-fresh
    fn ensure_gpu_up_to_date(&self) {}

    /// Whether this expression broadcasts to any shape (scalar semantics)
    fn broadcasts(&self) -> bool {
        false
    }

    /// Total number of elements
    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// Number of dimensions
    fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Element at 2-D coordinates
    fn at2(&self, i: usize, j: usize) -> Self::Elem {
        let s = self.shape();
        debug_assert_eq!(s.len(), 2);
        self.value(i * s[1] + j)
    }

    /// Element at 3-D coordinates
    fn at3(&self, i: usize, j: usize, k: usize) -> Self::Elem {
        let s = self.shape();
        debug_assert_eq!(s.len(), 3);
        self.value((i * s[1] + j) * s[2] + k)
    }
}

impl<E: Expr + ?Sized> Expr for &E {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        (**self).shape()
    }

    fn value(&self, i: usize) -> Self::Elem {
        (**self).value(i)
    }

    fn is_linear(&self) -> bool {
        (**self).is_linear()
    }

    fn parallel_safe(&self) -> bool {
        (**self).parallel_safe()
    }

    fn aliases(&self, id: BufferId) -> bool {
        (**self).aliases(id)
    }

    fn ensure_cpu_up_to_date(&self) {
        (**self).ensure_cpu_up_to_date()
    }

    fn ensure_gpu_up_to_date(&self) {
        (**self).ensure_gpu_up_to_date()
    }

    fn broadcasts(&self) -> bool {
        (**self).broadcasts()
    }
}

/// Operator-overloading wrapper for expressions
///
/// Wrapping keeps the arithmetic impls on a single local type, so any two
/// expressions (and expression/scalar pairs) combine with `+ - * / %`:
///
/// ```ignore
/// let c_expr = a.ex() + b.ex() * 2.0;
/// c.assign(c_expr)?;
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Ex<E>(pub E);

impl<E: Expr> Ex<E> {
    /// Element-wise absolute value
    pub fn abs(self) -> Ex<UnaryExpr<E>> {
        Ex(UnaryExpr::new(self.0, UnaryFn::Abs))
    }

    /// Element-wise natural logarithm
    pub fn log(self) -> Ex<UnaryExpr<E>> {
        Ex(UnaryExpr::new(self.0, UnaryFn::Log))
    }

    /// Element-wise exponential
    pub fn exp(self) -> Ex<UnaryExpr<E>> {
        Ex(UnaryExpr::new(self.0, UnaryFn::Exp))
    }

    /// Element-wise square root
    pub fn sqrt(self) -> Ex<UnaryExpr<E>> {
        Ex(UnaryExpr::new(self.0, UnaryFn::Sqrt))
    }

    /// Element-wise sign (-1, 0, 1)
    pub fn sign(self) -> Ex<UnaryExpr<E>> {
        Ex(UnaryExpr::new(self.0, UnaryFn::Sign))
    }

    /// Element-wise logistic sigmoid
    pub fn sigmoid(self) -> Ex<UnaryExpr<E>> {
        Ex(UnaryExpr::new(self.0, UnaryFn::Sigmoid))
    }

    /// Element-wise softplus
    pub fn softplus(self) -> Ex<UnaryExpr<E>> {
        Ex(UnaryExpr::new(self.0, UnaryFn::Softplus))
    }

    /// Element-wise maximum against a scalar
    pub fn max_s(self, v: E::Elem) -> Ex<BinaryExpr<E, Scalar<E::Elem>>> {
        Ex(BinaryExpr::new(self.0, Scalar::new(v), BinaryFn::Max))
    }

    /// Element-wise minimum against a scalar
    pub fn min_s(self, v: E::Elem) -> Ex<BinaryExpr<E, Scalar<E::Elem>>> {
        Ex(BinaryExpr::new(self.0, Scalar::new(v), BinaryFn::Min))
    }

    /// Bernoulli sampling: 1 where x exceeds a uniform draw, else 0
    pub fn bernoulli(self, ctx: &NoiseCtx) -> Ex<NoiseExpr<'_, E>> {
        Ex(NoiseExpr::new(self.0, NoiseFn::Bernoulli, ctx))
    }

    /// Reverse Bernoulli sampling: 0 where x exceeds a uniform draw, else 1
    pub fn reverse_bernoulli(self, ctx: &NoiseCtx) -> Ex<NoiseExpr<'_, E>> {
        Ex(NoiseExpr::new(self.0, NoiseFn::ReverseBernoulli, ctx))
    }

    /// Additive uniform noise in [0, 1)
    pub fn uniform_noise(self, ctx: &NoiseCtx) -> Ex<NoiseExpr<'_, E>> {
        Ex(NoiseExpr::new(self.0, NoiseFn::Uniform, ctx))
    }

    /// Additive standard normal noise
    pub fn normal_noise(self, ctx: &NoiseCtx) -> Ex<NoiseExpr<'_, E>> {
        Ex(NoiseExpr::new(self.0, NoiseFn::Normal, ctx))
    }

    /// Additive normal noise with sigmoid(x) standard deviation
    pub fn logistic_noise(self, ctx: &NoiseCtx) -> Ex<NoiseExpr<'_, E>> {
        Ex(NoiseExpr::new(self.0, NoiseFn::Logistic, ctx))
    }

    /// Ranged noise: additive normal noise except at 0 and at `range`
    pub fn ranged_noise(self, ctx: &NoiseCtx, range: E::Elem) -> Ex<NoiseExpr<'_, E>> {
        Ex(NoiseExpr::new(self.0, NoiseFn::Ranged(range.to_f64()), ctx))
    }
}

impl<E: Expr> Expr for Ex<E> {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        self.0.shape()
    }

    fn value(&self, i: usize) -> Self::Elem {
        self.0.value(i)
    }

    fn is_linear(&self) -> bool {
        self.0.is_linear()
    }

    fn parallel_safe(&self) -> bool {
        self.0.parallel_safe()
    }

    fn aliases(&self, id: BufferId) -> bool {
        self.0.aliases(id)
    }

    fn ensure_cpu_up_to_date(&self) {
        self.0.ensure_cpu_up_to_date()
    }

    fn ensure_gpu_up_to_date(&self) {
        self.0.ensure_gpu_up_to_date()
    }

    fn broadcasts(&self) -> bool {
        self.0.broadcasts()
    }
}

macro_rules! impl_expr_binop {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<L: Expr, R: Expr<Elem = L::Elem>> $trait<Ex<R>> for Ex<L> {
            type Output = Ex<BinaryExpr<L, R>>;

            fn $method(self, rhs: Ex<R>) -> Self::Output {
                Ex(BinaryExpr::new(self.0, rhs.0, $op))
            }
        }
    };
}

impl_expr_binop!(Add, add, BinaryFn::Add);
impl_expr_binop!(Sub, sub, BinaryFn::Sub);
impl_expr_binop!(Mul, mul, BinaryFn::Mul);
impl_expr_binop!(Div, div, BinaryFn::Div);
impl_expr_binop!(Rem, rem, BinaryFn::Mod);

macro_rules! impl_scalar_binops {
    ($elem:ty) => {
        impl<L: Expr<Elem = $elem>> Add<$elem> for Ex<L> {
            type Output = Ex<BinaryExpr<L, Scalar<$elem>>>;

            fn add(self, rhs: $elem) -> Self::Output {
                Ex(BinaryExpr::new(self.0, Scalar::new(rhs), BinaryFn::Add))
            }
        }

        impl<L: Expr<Elem = $elem>> Sub<$elem> for Ex<L> {
            type Output = Ex<BinaryExpr<L, Scalar<$elem>>>;

            fn sub(self, rhs: $elem) -> Self::Output {
                Ex(BinaryExpr::new(self.0, Scalar::new(rhs), BinaryFn::Sub))
            }
        }

        impl<L: Expr<Elem = $elem>> Mul<$elem> for Ex<L> {
            type Output = Ex<BinaryExpr<L, Scalar<$elem>>>;

            fn mul(self, rhs: $elem) -> Self::Output {
                Ex(BinaryExpr::new(self.0, Scalar::new(rhs), BinaryFn::Mul))
            }
        }

        impl<L: Expr<Elem = $elem>> Div<$elem> for Ex<L> {
            type Output = Ex<BinaryExpr<L, Scalar<$elem>>>;

            fn div(self, rhs: $elem) -> Self::Output {
                Ex(BinaryExpr::new(self.0, Scalar::new(rhs), BinaryFn::Div))
            }
        }

        impl<L: Expr<Elem = $elem>> Rem<$elem> for Ex<L> {
            type Output = Ex<BinaryExpr<L, Scalar<$elem>>>;

            fn rem(self, rhs: $elem) -> Self::Output {
                Ex(BinaryExpr::new(self.0, Scalar::new(rhs), BinaryFn::Mod))
            }
        }

        impl<R: Expr<Elem = $elem>> Add<Ex<R>> for $elem {
            type Output = Ex<BinaryExpr<Scalar<$elem>, R>>;

            fn add(self, rhs: Ex<R>) -> Self::Output {
                Ex(BinaryExpr::new(Scalar::new(self), rhs.0, BinaryFn::Add))
            }
        }

        impl<R: Expr<Elem = $elem>> Sub<Ex<R>> for $elem {
            type Output = Ex<BinaryExpr<Scalar<$elem>, R>>;

            fn sub(self, rhs: Ex<R>) -> Self::Output {
                Ex(BinaryExpr::new(Scalar::new(self), rhs.0, BinaryFn::Sub))
            }
        }

        impl<R: Expr<Elem = $elem>> Mul<Ex<R>> for $elem {
            type Output = Ex<BinaryExpr<Scalar<$elem>, R>>;

            fn mul(self, rhs: Ex<R>) -> Self::Output {
                Ex(BinaryExpr::new(Scalar::new(self), rhs.0, BinaryFn::Mul))
            }
        }

        impl<R: Expr<Elem = $elem>> Div<Ex<R>> for $elem {
            type Output = Ex<BinaryExpr<Scalar<$elem>, R>>;

            fn div(self, rhs: Ex<R>) -> Self::Output {
                Ex(BinaryExpr::new(Scalar::new(self), rhs.0, BinaryFn::Div))
            }
        }
    };
}

impl_scalar_binops!(f32);
impl_scalar_binops!(f64);
impl_scalar_binops!(i32);
impl_scalar_binops!(i64);

impl<E: Expr> Neg for Ex<E> {
    type Output = Ex<UnaryExpr<E>>;

    fn neg(self) -> Self::Output {
        Ex(UnaryExpr::new(self.0, UnaryFn::Minus))
    }
}
