//! Structurally constrained matrices
//!
//! Adapters wrap a dense matrix and enforce a structural invariant on every
//! mutation path: expression assignment is gated by the matching predicate,
//! and single-entry writes go through the scoped [`with_entry`] form. A
//! rejected write leaves the adapter exactly as it was.

mod diagonal;
mod entry;
mod triangular;

pub use diagonal::DiagonalMatrix;
pub use entry::{with_entry, EntryWrite};
pub use triangular::{UniLowerMatrix, UniUpperMatrix};

use crate::element::Element;
use crate::expr::Expr;

/// Whether a 2-D expression is square with all off-diagonal elements zero
pub fn is_diagonal<E: Expr>(e: &E) -> bool {
    let shape = e.shape();
    if shape.len() != 2 || shape[0] != shape[1] {
        return false;
    }
    let n = shape[0];
    e.ensure_cpu_up_to_date();
    for i in 0..n {
        for j in 0..n {
            if i != j && e.at2(i, j) != E::Elem::zero() {
                return false;
            }
        }
    }
    true
}

/// Whether a 2-D expression is square, unit on the diagonal and zero below
pub fn is_uni_upper_triangular<E: Expr>(e: &E) -> bool {
    let shape = e.shape();
    if shape.len() != 2 || shape[0] != shape[1] {
        return false;
    }
    let n = shape[0];
    e.ensure_cpu_up_to_date();
    for i in 0..n {
        if e.at2(i, i) != E::Elem::one() {
            return false;
        }
        for j in 0..i {
            if e.at2(i, j) != E::Elem::zero() {
                return false;
            }
        }
    }
    true
}

/// Whether a 2-D expression is square, unit on the diagonal and zero above
pub fn is_uni_lower_triangular<E: Expr>(e: &E) -> bool {
    let shape = e.shape();
    if shape.len() != 2 || shape[0] != shape[1] {
        return false;
    }
    let n = shape[0];
    e.ensure_cpu_up_to_date();
    for i in 0..n {
        if e.at2(i, i) != E::Elem::one() {
            return false;
        }
        for j in (i + 1)..n {
            if e.at2(i, j) != E::Elem::zero() {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    #[test]
    fn test_is_diagonal() {
        let d = Matrix::from_values(&[2, 2], vec![1.0, 0.0, 0.0, 2.0]).unwrap();
        assert!(is_diagonal(&d));

        let nd = Matrix::from_values(&[2, 2], vec![1.0, 3.0, 0.0, 2.0]).unwrap();
        assert!(!is_diagonal(&nd));

        let rect = Matrix::<f64>::zeros(&[2, 3]);
        assert!(!is_diagonal(&rect));
    }

    #[test]
    fn test_is_uni_upper() {
        let u = Matrix::from_values(&[3, 3], vec![
            1.0, 5.0, 2.0,
            0.0, 1.0, 7.0,
            0.0, 0.0, 1.0,
        ])
        .unwrap();
        assert!(is_uni_upper_triangular(&u));
        assert!(!is_uni_lower_triangular(&u));

        let bad_diag = Matrix::from_values(&[2, 2], vec![2.0, 1.0, 0.0, 1.0]).unwrap();
        assert!(!is_uni_upper_triangular(&bad_diag));
    }

    #[test]
    fn test_is_uni_lower() {
        let l = Matrix::from_values(&[2, 2], vec![1.0, 0.0, 4.0, 1.0]).unwrap();
        assert!(is_uni_lower_triangular(&l));
        assert!(!is_uni_upper_triangular(&l));
    }

    #[test]
    fn test_identity_is_both() {
        let id = Matrix::from_values(&[2, 2], vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        assert!(is_diagonal(&id));
        assert!(is_uni_upper_triangular(&id));
        assert!(is_uni_lower_triangular(&id));
    }
}
