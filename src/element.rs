//! Element trait mapping Rust types to a runtime DType tag

use std::fmt;
use std::ops::{Add, Div, Mul, Rem, Sub};

/// Runtime element-type tag
///
/// Carried by kernel operand descriptors so the dispatch table can detect
/// heterogeneous operand combinations and fail fast instead of silently
/// doing the wrong thing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I32 => "i32",
            DType::I64 => "i64",
        };
        write!(f, "{name}")
    }
}

/// Trait for types that can be elements of a matrix or expression
///
/// Connects Rust's type system to the runtime dtype tag used by kernel
/// dispatch. Math beyond plain arithmetic goes through `to_f64`/`from_f64`;
/// domain errors of the underlying routines (e.g. `ln` of a non-positive
/// value) are inherited, not checked.
pub trait Element:
    Copy
    + Clone
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Rem<Output = Self>
    + PartialOrd
    + PartialEq
    + fmt::Debug
{
    /// The corresponding DType tag for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;
}

macro_rules! impl_element {
    ($t:ty, $dtype:expr, $zero:expr, $one:expr) => {
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn zero() -> Self {
                $zero
            }

            #[inline]
            fn one() -> Self {
                $one
            }
        }
    };
}

impl_element!(f32, DType::F32, 0.0, 1.0);
impl_element!(f64, DType::F64, 0.0, 1.0);
impl_element!(i32, DType::I32, 0, 1);
impl_element!(i64, DType::I64, 0, 1);
