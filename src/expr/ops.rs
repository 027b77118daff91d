//! Element-wise operation primitives
//!
//! Each operator is a pointwise `apply` plus a `vectorizable` declaration.
//! The closed enums replace per-operator tag types so kernel-level code can
//! match exhaustively. `vectorizable` is the per-operator capability a
//! packed-SIMD kernel backend consults; the built-in evaluation paths
//! (serial and rayon, see `crate::eval`) are element-at-a-time and apply
//! every operator regardless of the flag.

use crate::element::Element;

/// Binary element-wise operators
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryFn {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Modulo
    Mod,
    /// Maximum
    Max,
    /// Minimum
    Min,
}

impl BinaryFn {
    /// Apply the operator to one element pair
    #[inline]
    pub fn apply<T: Element>(self, a: T, b: T) -> T {
        match self {
            BinaryFn::Add => a + b,
            BinaryFn::Sub => a - b,
            BinaryFn::Mul => a * b,
            BinaryFn::Div => a / b,
            BinaryFn::Mod => a % b,
            BinaryFn::Max => {
                if a > b {
                    a
                } else {
                    b
                }
            }
            BinaryFn::Min => {
                if a < b {
                    a
                } else {
                    b
                }
            }
        }
    }

    /// Whether a packed SIMD `load` equivalent exists for this operator
    pub fn vectorizable(self) -> bool {
        !matches!(self, BinaryFn::Mod)
    }
}

/// Unary element-wise operators
///
/// Math-domain errors (`Log` of a non-positive value, `Sqrt` of a negative
/// value) are inherited from the underlying math routine, not checked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryFn {
    /// Identity
    Plus,
    /// Negation
    Minus,
    /// Absolute value
    Abs,
    /// Natural logarithm
    Log,
    /// Exponential
    Exp,
    /// Square root
    Sqrt,
    /// Sign: -1, 0 or 1
    Sign,
    /// Logistic sigmoid
    Sigmoid,
    /// Softplus: ln(1 + e^x)
    Softplus,
}

impl UnaryFn {
    /// Apply the operator to one element
    #[inline]
    pub fn apply<T: Element>(self, x: T) -> T {
        match self {
            UnaryFn::Plus => x,
            UnaryFn::Minus => T::zero() - x,
            UnaryFn::Abs => {
                if x < T::zero() {
                    T::zero() - x
                } else {
                    x
                }
            }
            UnaryFn::Log => T::from_f64(x.to_f64().ln()),
            UnaryFn::Exp => T::from_f64(x.to_f64().exp()),
            UnaryFn::Sqrt => T::from_f64(x.to_f64().sqrt()),
            UnaryFn::Sign => {
                if x < T::zero() {
                    T::zero() - T::one()
                } else if x > T::zero() {
                    T::one()
                } else {
                    T::zero()
                }
            }
            UnaryFn::Sigmoid => T::from_f64(sigmoid(x.to_f64())),
            UnaryFn::Softplus => T::from_f64(x.to_f64().exp().ln_1p()),
        }
    }

    /// Whether a packed SIMD `load` equivalent exists for this operator
    pub fn vectorizable(self) -> bool {
        matches!(self, UnaryFn::Plus | UnaryFn::Minus | UnaryFn::Sqrt)
    }
}

/// Logistic sigmoid over f64
#[inline]
pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_apply() {
        assert_eq!(BinaryFn::Add.apply(2.0, 3.0), 5.0);
        assert_eq!(BinaryFn::Sub.apply(2.0, 3.0), -1.0);
        assert_eq!(BinaryFn::Mul.apply(2.0, 3.0), 6.0);
        assert_eq!(BinaryFn::Div.apply(3.0, 2.0), 1.5);
        assert_eq!(BinaryFn::Mod.apply(7i64, 3i64), 1);
        assert_eq!(BinaryFn::Max.apply(2.0, 3.0), 3.0);
        assert_eq!(BinaryFn::Min.apply(2.0, 3.0), 2.0);
    }

    #[test]
    fn test_unary_apply() {
        assert_eq!(UnaryFn::Minus.apply(2.0), -2.0);
        assert_eq!(UnaryFn::Abs.apply(-2.0), 2.0);
        assert_eq!(UnaryFn::Sign.apply(-7.5), -1.0);
        assert_eq!(UnaryFn::Sign.apply(0.0), 0.0);
        assert_eq!(UnaryFn::Exp.apply(0.0), 1.0);
        assert!((UnaryFn::Log.apply(std::f64::consts::E) - 1.0).abs() < 1e-12);
        assert!((UnaryFn::Sigmoid.apply(0.0f64) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_vectorizable_flags() {
        assert!(BinaryFn::Add.vectorizable());
        assert!(!BinaryFn::Mod.vectorizable());
        assert!(UnaryFn::Sqrt.vectorizable());
        assert!(!UnaryFn::Sigmoid.vectorizable());
    }
}
