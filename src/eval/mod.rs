//! Expression evaluator
//!
//! Materializes lazy expressions into dense destinations. Every assignment
//! follows the same protocol: validate shapes before touching the
//! destination, break aliasing through a temporary when evaluation order
//! matters, refresh CPU copies, evaluate (serially or in parallel), then
//! invalidate the destination's device mirror.
//!
//! Both built-in paths evaluate element-at-a-time; a packed-SIMD backend
//! would additionally gate on the per-operator `vectorizable` flags
//! (`crate::expr::BinaryFn`/`UnaryFn`), the way the GEMM layer gates on
//! operand descriptors.

use crate::element::Element;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::matrix::{storage_index, Matrix, Shape, StorageOrder};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Element count below which assignment stays on one thread
pub const PARALLEL_THRESHOLD: usize = 100_000;

/// Element count below which reductions stay on one thread
pub const SUM_PARALLEL_THRESHOLD: usize = 400_000;

/// How an evaluated expression combines with the destination's old contents
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssignMode {
    /// Overwrite
    Replace,
    /// `dst += expr`
    Add,
    /// `dst -= expr`
    Sub,
    /// `dst *= expr` (element-wise)
    Mul,
    /// `dst /= expr` (element-wise)
    Div,
    /// `dst %= expr` (element-wise)
    Mod,
}

impl AssignMode {
    #[inline]
    fn combine<T: Element>(self, old: T, new: T) -> T {
        match self {
            AssignMode::Replace => new,
            AssignMode::Add => old + new,
            AssignMode::Sub => old - new,
            AssignMode::Mul => old * new,
            AssignMode::Div => old / new,
            AssignMode::Mod => old % new,
        }
    }
}

/// Evaluate `expr` into `dst` under the given mode
///
/// Validation happens before any mutation: on error the destination is
/// untouched. When the expression reads the destination's own storage and
/// is not linear (a transpose of the destination, say), it is first
/// materialized into a temporary so no element is read after being
/// overwritten.
pub fn assign_into<E: Expr + Sync>(
    dst: &mut Matrix<E::Elem>,
    expr: &E,
    mode: AssignMode,
) -> Result<()> {
    check_shapes(&dst.shape(), expr)?;

    if expr.aliases(dst.buffer_id()) && !expr.is_linear() {
        let tmp = make_temporary(expr);
        return assign_into(dst, &tmp, mode);
    }

    expr.ensure_cpu_up_to_date();
    dst.ensure_cpu_up_to_date();

    let n = dst.size();
    let shape = dst.shape();
    let order = dst.order();

    #[cfg(feature = "rayon")]
    if n >= PARALLEL_THRESHOLD && expr.parallel_safe() {
        let data = dst.data_mut();
        let base = SyncPtr(data.as_mut_ptr());
        (0..n).into_par_iter().for_each(|i| {
            // rebind so the closure captures the Sync wrapper, not the
            // raw-pointer field disjointly
            let base = &base;
            let s = storage_index(order, &shape, i);
            // SAFETY: `storage_index` is a permutation of 0..n for a fixed
            // shape and order, so every slot is written by exactly one
            // logical index and no two iterations touch the same element.
            unsafe {
                let p = base.0.add(s);
                *p = mode.combine(*p, expr.value(i));
            }
        });
        return Ok(());
    }

    let data = dst.data_mut();
    for i in 0..n {
        let s = storage_index(order, &shape, i);
        data[s] = mode.combine(data[s], expr.value(i));
    }
    Ok(())
}

/// Materialize an expression into a fresh row-major matrix
pub fn make_temporary<E: Expr>(expr: &E) -> Matrix<E::Elem> {
    expr.ensure_cpu_up_to_date();
    let shape = expr.shape();
    let mut out = Matrix::zeros_with_order(&shape, StorageOrder::RowMajor);
    let data = out.data_mut();
    for (i, slot) in data.iter_mut().enumerate() {
        *slot = expr.value(i);
    }
    out
}

/// Sum of all elements
pub fn sum<E: Expr + Sync>(expr: &E) -> E::Elem {
    expr.ensure_cpu_up_to_date();
    let n = expr.size();

    #[cfg(feature = "rayon")]
    if n >= SUM_PARALLEL_THRESHOLD && expr.parallel_safe() {
        let total: f64 = (0..n).into_par_iter().map(|i| expr.value(i).to_f64()).sum();
        return E::Elem::from_f64(total);
    }

    let mut total = E::Elem::zero();
    for i in 0..n {
        total = total + expr.value(i);
    }
    total
}

/// Arithmetic mean of all elements
pub fn mean<E: Expr + Sync>(expr: &E) -> E::Elem {
    let n = expr.size();
    E::Elem::from_f64(sum(expr).to_f64() / n as f64)
}

fn check_shapes<E: Expr>(dst: &Shape, expr: &E) -> Result<()> {
    if expr.broadcasts() {
        return Ok(());
    }
    let got = expr.shape();
    if *dst != got {
        return Err(Error::ShapeMismatch {
            expected: dst.to_vec(),
            got: got.to_vec(),
        });
    }
    Ok(())
}

#[cfg(feature = "rayon")]
struct SyncPtr<T>(*mut T);

#[cfg(feature = "rayon")]
unsafe impl<T> Send for SyncPtr<T> {}
#[cfg(feature = "rayon")]
unsafe impl<T> Sync for SyncPtr<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryExpr, BinaryFn, Scalar};

    #[test]
    fn test_replace_assign() {
        let a = Matrix::from_values(&[4], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut c = Matrix::<f64>::zeros(&[4]);
        c.assign(BinaryExpr::new(&a, Scalar::new(2.0), BinaryFn::Mul))
            .unwrap();
        assert_eq!(c.data(), &[2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_compound_assign() {
        let a = Matrix::from_values(&[3], vec![1.0, 2.0, 3.0]).unwrap();
        let mut c = Matrix::filled(&[3], 10.0);
        c.assign_add(&a).unwrap();
        assert_eq!(c.data(), &[11.0, 12.0, 13.0]);
        c.assign_sub(&a).unwrap();
        assert_eq!(c.data(), &[10.0, 10.0, 10.0]);
        c.assign_mul(&a).unwrap();
        assert_eq!(c.data(), &[10.0, 20.0, 30.0]);
        c.assign_div(&a).unwrap();
        assert_eq!(c.data(), &[10.0, 10.0, 10.0]);
    }

    #[test]
    fn test_shape_mismatch_leaves_dst_untouched() {
        let a = Matrix::<f64>::zeros(&[4]);
        let mut c = Matrix::from_values(&[3], vec![1.0, 2.0, 3.0]).unwrap();
        let err = c.assign(&a).unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                expected: vec![3],
                got: vec![4]
            }
        );
        assert_eq!(c.data(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_scalar_broadcast_assign() {
        let mut c = Matrix::<f64>::zeros(&[2, 2]);
        c.assign(Scalar::new(5.0)).unwrap();
        assert_eq!(c.data(), &[5.0; 4]);
    }

    /// Claims to alias a given buffer and to be order-sensitive, forcing the
    /// evaluator through its temporary path.
    struct AliasingStub {
        values: Vec<f64>,
        alias: crate::matrix::BufferId,
    }

    impl Expr for AliasingStub {
        type Elem = f64;

        fn shape(&self) -> Shape {
            let mut s = Shape::new();
            s.push(self.values.len());
            s
        }

        fn value(&self, i: usize) -> f64 {
            self.values[i]
        }

        fn is_linear(&self) -> bool {
            false
        }

        fn aliases(&self, id: crate::matrix::BufferId) -> bool {
            id == self.alias
        }
    }

    #[test]
    fn test_aliased_nonlinear_goes_through_temporary() {
        let mut c = Matrix::<f64>::zeros(&[3]);
        let e = AliasingStub {
            values: vec![1.0, 2.0, 3.0],
            alias: c.buffer_id(),
        };
        assert!(e.aliases(c.buffer_id()) && !e.is_linear());
        assign_into(&mut c, &e, AssignMode::Replace).unwrap();
        assert_eq!(c.data(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_make_temporary() {
        let a = Matrix::from_values(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let t = make_temporary(&BinaryExpr::new(&a, Scalar::new(1.0), BinaryFn::Add));
        assert_eq!(t.shape().as_slice(), &[2, 2]);
        assert_eq!(t.data(), &[2.0, 3.0, 4.0, 5.0]);
        assert_ne!(t.buffer_id(), a.buffer_id());
    }

    #[test]
    fn test_col_major_destination() {
        let a = Matrix::from_values(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut c = Matrix::<f64>::zeros_with_order(&[2, 2], StorageOrder::ColMajor);
        c.assign(&a).unwrap();
        assert_eq!(c.get2(0, 1), 2.0);
        assert_eq!(c.data(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_sum_and_mean() {
        let a = Matrix::from_values(&[4], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(sum(&a), 10.0);
        assert_eq!(mean(&a), 2.5);
    }
}
