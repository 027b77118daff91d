//! Unit-triangular matrix adapters

use super::entry::EntryWrite;
use super::{is_uni_lower_triangular, is_uni_upper_triangular};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::eval;
use crate::expr::{Ex, Expr};
use crate::matrix::{BufferId, Matrix, Shape};

/// The zero half of a uni-upper matrix
fn below_diagonal(i: usize, j: usize) -> bool {
    j < i
}

/// The zero half of a uni-lower matrix
fn above_diagonal(i: usize, j: usize) -> bool {
    j > i
}

macro_rules! uni_triangular {
    ($name:ident, $predicate:ident, $label:literal, $doc:literal, $off:path) => {
        #[doc = $doc]
        ///
        /// The diagonal is seeded to exactly one at construction and can
        /// never change; the zero half can never receive a non-zero value.
        /// No scalar compound operation preserves the unit diagonal, so none
        /// is offered; expression compounds re-validate the combined result.
        pub struct $name<T> {
            mat: Matrix<T>,
        }

        impl<T: Element> Clone for $name<T> {
            fn clone(&self) -> Self {
                Self {
                    mat: self.mat.clone(),
                }
            }
        }

        impl<T: Element> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.mat == other.mat
            }
        }

        impl<T: Element> std::fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).field("mat", &self.mat).finish()
            }
        }

        impl<T: Element> $name<T> {
            /// n x n identity-seeded adapter
            pub fn new(n: usize) -> Self {
                let mut mat = Matrix::zeros(&[n, n]);
                for i in 0..n {
                    mat.set2(i, i, T::one());
                }
                Self { mat }
            }

            /// Side length
            #[inline]
            pub fn n(&self) -> usize {
                self.mat.rows()
            }

            /// The underlying dense matrix
            #[inline]
            pub fn as_matrix(&self) -> &Matrix<T> {
                &self.mat
            }

            /// Element at 2-D coordinates
            #[inline]
            pub fn get2(&self, i: usize, j: usize) -> T {
                self.mat.get2(i, j)
            }

            /// Wrap for operator composition
            #[inline]
            pub fn ex(&self) -> Ex<&Self> {
                Ex(self)
            }

            /// Assign an expression, validating the structure first
            pub fn assign<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
                if expr.shape() != self.mat.shape() {
                    return Err(Error::ShapeMismatch {
                        expected: self.mat.shape().to_vec(),
                        got: expr.shape().to_vec(),
                    });
                }
                let candidate = eval::make_temporary(&expr);
                if !$predicate(&candidate) {
                    return Err(Error::StructuralViolation { adapter: $label });
                }
                self.mat.assign(&candidate)
            }

            /// Add an expression element-wise, re-validating the result
            pub fn assign_add<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
                self.compound(expr, |m, c| m.assign_add(c))
            }

            /// Subtract an expression element-wise, re-validating the result
            pub fn assign_sub<E: Expr<Elem = T> + Sync>(&mut self, expr: E) -> Result<()> {
                self.compound(expr, |m, c| m.assign_sub(c))
            }

            fn compound<E, F>(&mut self, expr: E, apply: F) -> Result<()>
            where
                E: Expr<Elem = T> + Sync,
                F: FnOnce(&mut Matrix<T>, &Matrix<T>) -> Result<()>,
            {
                let candidate = eval::make_temporary(&expr);
                let mut next = self.mat.clone();
                apply(&mut next, &candidate)?;
                if !$predicate(&next) {
                    return Err(Error::StructuralViolation { adapter: $label });
                }
                self.mat = next;
                Ok(())
            }

            fn entry_allowed(i: usize, j: usize, v: T) -> bool {
                if i == j {
                    return v == T::one();
                }
                if $off(i, j) {
                    return v == T::zero();
                }
                true
            }
        }

        impl<T: Element> EntryWrite for $name<T> {
            type Elem = T;

            fn entry(&self, i: usize, j: usize) -> T {
                self.mat.get2(i, j)
            }

            fn set_entry(&mut self, i: usize, j: usize, v: T) -> Result<()> {
                if !Self::entry_allowed(i, j, v) {
                    return Err(Error::StructuralViolation { adapter: $label });
                }
                self.mat.set2(i, j, v);
                Ok(())
            }
        }

        impl<T: Element> Expr for $name<T> {
            type Elem = T;

            fn shape(&self) -> Shape {
                self.mat.shape()
            }

            fn value(&self, i: usize) -> T {
                self.mat.value(i)
            }

            fn aliases(&self, id: BufferId) -> bool {
                self.mat.aliases(id)
            }

            fn ensure_cpu_up_to_date(&self) {
                self.mat.ensure_cpu_up_to_date()
            }

            fn ensure_gpu_up_to_date(&self) {
                self.mat.ensure_gpu_up_to_date()
            }
        }
    };
}

uni_triangular!(
    UniUpperMatrix,
    is_uni_upper_triangular,
    "uni_upper",
    "Square matrix constrained to a unit diagonal and zeros below it",
    below_diagonal
);

uni_triangular!(
    UniLowerMatrix,
    is_uni_lower_triangular,
    "uni_lower",
    "Square matrix constrained to a unit diagonal and zeros above it",
    above_diagonal
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::with_entry;

    #[test]
    fn test_starts_as_identity() {
        let u = UniUpperMatrix::<f64>::new(3);
        for i in 0..3 {
            for j in 0..3 {
                let want = if i == j { 1.0 } else { 0.0 };
                assert_eq!(u.get2(i, j), want);
            }
        }
    }

    #[test]
    fn test_upper_entry_gating() {
        let mut u = UniUpperMatrix::<f64>::new(3);
        with_entry(&mut u, 0, 2, |_| 5.0).unwrap();
        assert_eq!(u.get2(0, 2), 5.0);

        let err = with_entry(&mut u, 2, 0, |_| 5.0).unwrap_err();
        assert_eq!(err, Error::StructuralViolation { adapter: "uni_upper" });

        let err = with_entry(&mut u, 1, 1, |_| 2.0).unwrap_err();
        assert_eq!(err, Error::StructuralViolation { adapter: "uni_upper" });
        assert_eq!(u.get2(1, 1), 1.0);
    }

    #[test]
    fn test_lower_entry_gating() {
        let mut l = UniLowerMatrix::<f64>::new(3);
        with_entry(&mut l, 2, 0, |_| 4.0).unwrap();
        assert_eq!(l.get2(2, 0), 4.0);

        let err = with_entry(&mut l, 0, 2, |_| 4.0).unwrap_err();
        assert_eq!(err, Error::StructuralViolation { adapter: "uni_lower" });
    }

    #[test]
    fn test_assign_validation() {
        let mut u = UniUpperMatrix::new(2);
        let good = Matrix::from_values(&[2, 2], vec![1.0, 7.0, 0.0, 1.0]).unwrap();
        u.assign(&good).unwrap();
        assert_eq!(u.get2(0, 1), 7.0);

        let bad = Matrix::from_values(&[2, 2], vec![1.0, 7.0, 3.0, 1.0]).unwrap();
        let err = u.assign(&bad).unwrap_err();
        assert_eq!(err, Error::StructuralViolation { adapter: "uni_upper" });
        assert_eq!(u.get2(1, 0), 0.0);
        assert_eq!(u.get2(0, 1), 7.0);
    }

    #[test]
    fn test_clone_and_compare() {
        let mut u = UniUpperMatrix::<f64>::new(3);
        with_entry(&mut u, 0, 2, |_| 6.0).unwrap();

        let v = u.clone();
        assert_eq!(u, v);
        with_entry(&mut u, 0, 1, |_| 1.0).unwrap();
        assert_ne!(u, v);
        assert_eq!(v.get2(0, 1), 0.0);
    }

    #[test]
    fn test_compound_keeps_diagonal() {
        let mut u = UniUpperMatrix::new(2);
        // adding anything with a non-zero diagonal breaks the unit diagonal
        let d = Matrix::from_values(&[2, 2], vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let err = u.assign_add(&d).unwrap_err();
        assert_eq!(err, Error::StructuralViolation { adapter: "uni_upper" });

        // strictly-upper increments are fine
        let up = Matrix::from_values(&[2, 2], vec![0.0, 2.5, 0.0, 0.0]).unwrap();
        u.assign_add(&up).unwrap();
        assert_eq!(u.get2(0, 1), 2.5);
        assert_eq!(u.get2(0, 0), 1.0);
    }
}
