//! Sparse COO semantics

use lazr::prelude::*;

#[test]
fn set_then_clear_leaves_empty() {
    // 4x4 scenario: set(1,2,5.0) then set(1,2,0.0)
    let mut s = SparseMatrix::new(4, 4);
    s.set(1, 2, 5.0);
    assert_eq!(s.non_zeros(), 1);
    assert_eq!(s.get(1, 2), 5.0);

    s.set(1, 2, 0.0);
    assert_eq!(s.non_zeros(), 0);
    assert_eq!(s.get(1, 2), 0.0);
}

#[test]
fn triplets_stay_sorted_by_row_then_column() {
    let mut s = SparseMatrix::new(4, 4);
    s.set(3, 3, 4.0);
    s.set(0, 2, 1.0);
    s.set(2, 0, 3.0);
    s.set(0, 1, 0.5);
    s.set(2, 3, 3.5);

    let coords: Vec<(usize, usize)> = s.iter().map(|(r, c, _)| (r, c)).collect();
    assert_eq!(coords, vec![(0, 1), (0, 2), (2, 0), (2, 3), (3, 3)]);
    assert_eq!(s.non_zeros(), 5);
}

#[test]
fn erase_compacts() {
    let mut s = SparseMatrix::new(3, 3);
    s.set(0, 0, 1.0);
    s.set(1, 1, 2.0);
    s.set(2, 2, 3.0);

    s.erase(1, 1);
    assert_eq!(s.non_zeros(), 2);
    assert_eq!(s.get(1, 1), 0.0);
    assert_eq!(s.get(0, 0), 1.0);
    assert_eq!(s.get(2, 2), 3.0);
}

#[test]
fn dense_round_trip() {
    let values = vec![
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 2.0,
        3.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 4.0, 0.0,
    ];
    let s = SparseMatrix::from_values(4, 4, values.clone()).unwrap();
    assert_eq!(s.non_zeros(), 4);

    let mut dense = Matrix::<f64>::zeros(&[4, 4]);
    dense.assign(&s).unwrap();
    assert_eq!(dense.data(), values.as_slice());
}

#[test]
fn assign_expression_rebuilds_entries() {
    let a = Matrix::from_values(&[2, 2], vec![1.0, 0.0, 0.0, -1.0]).unwrap();
    let mut s = SparseMatrix::new(2, 2);
    s.assign(a.ex() * 2.0).unwrap();
    assert_eq!(s.non_zeros(), 2);
    assert_eq!(s.get(0, 0), 2.0);
    assert_eq!(s.get(1, 1), -2.0);
    assert_eq!(s.get(0, 1), 0.0);

    // zeros produced by the expression are not stored
    s.assign(a.ex() * 0.0).unwrap();
    assert_eq!(s.non_zeros(), 0);
}

#[test]
fn assign_shape_mismatch_is_rejected_pre_mutation() {
    let mut s = SparseMatrix::new(2, 2);
    s.set(0, 0, 7.0);

    let wrong = Matrix::<f64>::zeros(&[3, 3]);
    let err = s.assign(&wrong).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
    assert_eq!(s.non_zeros(), 1);
    assert_eq!(s.get(0, 0), 7.0);
}

#[test]
fn scoped_entry_write() {
    let mut s = SparseMatrix::<f64>::new(4, 4);
    with_entry(&mut s, 2, 2, |v| v + 1.0).unwrap();
    with_entry(&mut s, 2, 2, |v| v + 1.0).unwrap();
    assert_eq!(s.get(2, 2), 2.0);
    assert_eq!(s.non_zeros(), 1);

    // writing back zero removes the entry
    with_entry(&mut s, 2, 2, |_| 0.0).unwrap();
    assert_eq!(s.non_zeros(), 0);
}

#[test]
fn sparse_in_mixed_expressions() {
    let mut s = SparseMatrix::new(2, 2);
    s.set(0, 1, 3.0);

    let dense = Matrix::filled(&[2, 2], 1.0);
    let mut c = Matrix::<f64>::zeros(&[2, 2]);
    c.assign(s.ex() + dense.ex()).unwrap();
    assert_eq!(c.data(), &[1.0, 4.0, 1.0, 1.0]);
}
