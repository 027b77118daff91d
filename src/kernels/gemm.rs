//! General matrix-matrix multiply

use super::{select_path, KernelPath, OperandDesc};
use crate::device::{self, DeviceGemm};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::matrix::{Matrix, StorageOrder};

/// One GEMM operand: a slice plus its logical dimensions and layout
///
/// A transposed operand is the same slice with swapped dimensions and a
/// flipped layout flag; no data moves.
#[derive(Copy, Clone)]
struct Op<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
    row_major: bool,
}

impl<'a, T: Element> Op<'a, T> {
    fn new(m: &'a Matrix<T>) -> Self {
        Self {
            data: m.data(),
            rows: m.rows(),
            cols: m.columns(),
            row_major: m.order() == StorageOrder::RowMajor,
        }
    }

    fn transposed(self) -> Self {
        Self {
            data: self.data,
            rows: self.cols,
            cols: self.rows,
            row_major: !self.row_major,
        }
    }

    fn size(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        if self.row_major {
            self.data[i * self.cols + j]
        } else {
            self.data[i + j * self.rows]
        }
    }
}

/// Copy an operand into the opposite storage layout
fn force_temporary_opp<T: Element>(op: &Op<'_, T>) -> Vec<T> {
    let mut out = vec![T::zero(); op.size()];
    for i in 0..op.rows {
        for j in 0..op.cols {
            let idx = if op.row_major {
                // destination is column-major
                i + j * op.rows
            } else {
                i * op.cols + j
            };
            out[idx] = op.at(i, j);
        }
    }
    out
}

// The six direct kernels. Loop nests are ordered so the innermost loop
// walks each slice along its fast axis.

fn gemm_rr_to_r<T: Element>(m: usize, n: usize, k: usize, a: &[T], b: &[T], c: &mut [T]) {
    for i in 0..m {
        for p in 0..k {
            let av = a[i * k + p];
            for j in 0..n {
                c[i * n + j] = c[i * n + j] + av * b[p * n + j];
            }
        }
    }
}

fn gemm_cc_to_c<T: Element>(m: usize, n: usize, k: usize, a: &[T], b: &[T], c: &mut [T]) {
    for j in 0..n {
        for p in 0..k {
            let bv = b[p + j * k];
            for i in 0..m {
                c[i + j * m] = c[i + j * m] + a[i + p * m] * bv;
            }
        }
    }
}

fn gemm_cr_to_r<T: Element>(m: usize, n: usize, k: usize, a: &[T], b: &[T], c: &mut [T]) {
    for i in 0..m {
        for p in 0..k {
            let av = a[i + p * m];
            for j in 0..n {
                c[i * n + j] = c[i * n + j] + av * b[p * n + j];
            }
        }
    }
}

fn gemm_rc_to_r<T: Element>(m: usize, n: usize, k: usize, a: &[T], b: &[T], c: &mut [T]) {
    for i in 0..m {
        for j in 0..n {
            let mut acc = T::zero();
            for p in 0..k {
                acc = acc + a[i * k + p] * b[p + j * k];
            }
            c[i * n + j] = acc;
        }
    }
}

fn gemm_cr_to_c<T: Element>(m: usize, n: usize, k: usize, a: &[T], b: &[T], c: &mut [T]) {
    for j in 0..n {
        for p in 0..k {
            let bv = b[p * n + j];
            for i in 0..m {
                c[i + j * m] = c[i + j * m] + a[i + p * m] * bv;
            }
        }
    }
}

fn gemm_rc_to_c<T: Element>(m: usize, n: usize, k: usize, a: &[T], b: &[T], c: &mut [T]) {
    for j in 0..n {
        for i in 0..m {
            let mut acc = T::zero();
            for p in 0..k {
                acc = acc + a[i * k + p] * b[p + j * k];
            }
            c[i + j * m] = acc;
        }
    }
}

/// Layout dispatch over the six direct kernels
///
/// When both inputs disagree with the destination's layout no direct kernel
/// applies; the smaller input is materialized in the opposite layout and
/// the call re-dispatches to a mixed kernel.
fn dispatch_cpu<T: Element>(
    m: usize,
    n: usize,
    k: usize,
    a: Op<'_, T>,
    b: Op<'_, T>,
    c: &mut [T],
    c_row_major: bool,
) {
    match (a.row_major, b.row_major, c_row_major) {
        (true, true, true) => gemm_rr_to_r(m, n, k, a.data, b.data, c),
        (false, false, false) => gemm_cc_to_c(m, n, k, a.data, b.data, c),
        (false, true, true) => gemm_cr_to_r(m, n, k, a.data, b.data, c),
        (true, false, true) => gemm_rc_to_r(m, n, k, a.data, b.data, c),
        (false, true, false) => gemm_cr_to_c(m, n, k, a.data, b.data, c),
        (true, false, false) => gemm_rc_to_c(m, n, k, a.data, b.data, c),
        (true, true, false) | (false, false, true) => {
            if a.size() <= b.size() {
                let tmp = force_temporary_opp(&a);
                let a2 = Op {
                    data: &tmp,
                    rows: a.rows,
                    cols: a.cols,
                    row_major: !a.row_major,
                };
                dispatch_cpu(m, n, k, a2, b, c, c_row_major);
            } else {
                let tmp = force_temporary_opp(&b);
                let b2 = Op {
                    data: &tmp,
                    rows: b.rows,
                    cols: b.cols,
                    row_major: !b.row_major,
                };
                dispatch_cpu(m, n, k, a, b2, c, c_row_major);
            }
        }
    }
}

fn desc<T: Element>(m: &Matrix<T>) -> OperandDesc {
    OperandDesc {
        order: m.order(),
        dtype: T::DTYPE,
        gpu_resident: m.buffer().is_gpu_fresh(),
    }
}

fn device_handle<T: Element>(m: &Matrix<T>) -> u64 {
    m.buffer()
        .gpu_memory()
        .expect("device mirror missing after ensure_gpu_up_to_date")
}

fn gemm_run<T: Element>(
    op_name: &'static str,
    a: &Matrix<T>,
    transpose_a: bool,
    b: &Matrix<T>,
    transpose_b: bool,
    c: &mut Matrix<T>,
) -> Result<()> {
    if a.ndim() != 2 || b.ndim() != 2 || c.ndim() != 2 {
        return Err(Error::InvalidDimension {
            dim: 2,
            ndim: a.ndim().max(b.ndim()).max(c.ndim()),
        });
    }

    // effective dimensions after logical transposition
    let (m, ka) = if transpose_a {
        (a.columns(), a.rows())
    } else {
        (a.rows(), a.columns())
    };
    let (kb, n) = if transpose_b {
        (b.columns(), b.rows())
    } else {
        (b.rows(), b.columns())
    };
    if ka != kb {
        return Err(Error::ShapeMismatch {
            expected: vec![ka, n],
            got: vec![kb, n],
        });
    }
    if c.rows() != m || c.columns() != n {
        return Err(Error::ShapeMismatch {
            expected: vec![m, n],
            got: vec![c.rows(), c.columns()],
        });
    }
    let k = ka;

    let a_row_major = (a.order() == StorageOrder::RowMajor) ^ transpose_a;
    let b_row_major = (b.order() == StorageOrder::RowMajor) ^ transpose_b;
    let c_row_major = c.order() == StorageOrder::RowMajor;

    match select_path(op_name, &[desc(a), desc(b)], T::DTYPE)? {
        KernelPath::Gpu => {
            a.ensure_gpu_up_to_date();
            b.ensure_gpu_up_to_date();
            c.ensure_gpu_up_to_date();
            device::global().gemm(DeviceGemm {
                dtype: T::DTYPE,
                m,
                n,
                k,
                a_row_major,
                b_row_major,
                c_row_major,
                a: device_handle(a),
                b: device_handle(b),
                c: device_handle(c),
            });
            c.buffer().validate_gpu();
            c.buffer().invalidate_cpu();
        }
        KernelPath::Cpu => {
            a.ensure_cpu_up_to_date();
            b.ensure_cpu_up_to_date();
            let mut av = Op::new(a);
            if transpose_a {
                av = av.transposed();
            }
            let mut bv = Op::new(b);
            if transpose_b {
                bv = bv.transposed();
            }
            let cd = c.data_mut();
            cd.fill(T::zero());
            dispatch_cpu(m, n, k, av, bv, cd, c_row_major);
        }
    }
    Ok(())
}

/// C = A * B
pub fn gemm<T: Element>(a: &Matrix<T>, b: &Matrix<T>, c: &mut Matrix<T>) -> Result<()> {
    gemm_run("gemm", a, false, b, false, c)
}

/// C = A * B^T
pub fn gemm_nt<T: Element>(a: &Matrix<T>, b: &Matrix<T>, c: &mut Matrix<T>) -> Result<()> {
    gemm_run("gemm_nt", a, false, b, true, c)
}

/// C = A^T * B
pub fn gemm_tn<T: Element>(a: &Matrix<T>, b: &Matrix<T>, c: &mut Matrix<T>) -> Result<()> {
    gemm_run("gemm_tn", a, true, b, false, c)
}

/// C = A^T * B^T
pub fn gemm_tt<T: Element>(a: &Matrix<T>, b: &Matrix<T>, c: &mut Matrix<T>) -> Result<()> {
    gemm_run("gemm_tt", a, true, b, true, c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a_2x3() -> Vec<f64> {
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
    }

    fn b_3x2() -> Vec<f64> {
        vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]
    }

    // [[58, 64], [139, 154]]
    fn check_product(c: &Matrix<f64>) {
        assert_eq!(c.get2(0, 0), 58.0);
        assert_eq!(c.get2(0, 1), 64.0);
        assert_eq!(c.get2(1, 0), 139.0);
        assert_eq!(c.get2(1, 1), 154.0);
    }

    #[test]
    fn test_gemm_row_major() {
        let a = Matrix::from_values(&[2, 3], a_2x3()).unwrap();
        let b = Matrix::from_values(&[3, 2], b_3x2()).unwrap();
        let mut c = Matrix::<f64>::zeros(&[2, 2]);
        gemm(&a, &b, &mut c).unwrap();
        check_product(&c);
    }

    #[test]
    fn test_gemm_all_layout_combinations() {
        use StorageOrder::{ColMajor, RowMajor};
        for ao in [RowMajor, ColMajor] {
            for bo in [RowMajor, ColMajor] {
                for co in [RowMajor, ColMajor] {
                    let a = Matrix::from_values_with_order(&[2, 3], a_2x3(), ao).unwrap();
                    let b = Matrix::from_values_with_order(&[3, 2], b_3x2(), bo).unwrap();
                    let mut c = Matrix::<f64>::zeros_with_order(&[2, 2], co);
                    gemm(&a, &b, &mut c).unwrap();
                    check_product(&c);
                }
            }
        }
    }

    #[test]
    fn test_gemm_nt() {
        let a = Matrix::from_values(&[2, 3], a_2x3()).unwrap();
        // B stored as 2x3; B^T is the 3x2 above
        let b = Matrix::from_values(&[2, 3], vec![7.0, 9.0, 11.0, 8.0, 10.0, 12.0]).unwrap();
        let mut c = Matrix::<f64>::zeros(&[2, 2]);
        gemm_nt(&a, &b, &mut c).unwrap();
        check_product(&c);
    }

    #[test]
    fn test_gemm_tn() {
        // A stored as 3x2; A^T is the 2x3 above
        let a = Matrix::from_values(&[3, 2], vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]).unwrap();
        let b = Matrix::from_values(&[3, 2], b_3x2()).unwrap();
        let mut c = Matrix::<f64>::zeros(&[2, 2]);
        gemm_tn(&a, &b, &mut c).unwrap();
        check_product(&c);
    }

    #[test]
    fn test_gemm_tt() {
        let a = Matrix::from_values(&[3, 2], vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]).unwrap();
        let b = Matrix::from_values(&[2, 3], vec![7.0, 9.0, 11.0, 8.0, 10.0, 12.0]).unwrap();
        let mut c = Matrix::<f64>::zeros(&[2, 2]);
        gemm_tt(&a, &b, &mut c).unwrap();
        check_product(&c);
    }

    #[test]
    fn test_inner_dim_mismatch() {
        let a = Matrix::<f64>::zeros(&[2, 3]);
        let b = Matrix::<f64>::zeros(&[2, 2]);
        let mut c = Matrix::<f64>::zeros(&[2, 2]);
        assert!(matches!(
            gemm(&a, &b, &mut c),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_result_dim_mismatch() {
        let a = Matrix::<f64>::zeros(&[2, 3]);
        let b = Matrix::<f64>::zeros(&[3, 2]);
        let mut c = Matrix::<f64>::zeros(&[3, 3]);
        assert!(matches!(
            gemm(&a, &b, &mut c),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
