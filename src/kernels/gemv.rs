//! Matrix-vector and vector-matrix multiply

use super::{select_path, KernelPath, OperandDesc};
use crate::device::{self, DeviceGemm};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::matrix::{Matrix, StorageOrder};

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

/// y = A x with A described by (rows, cols, layout) over its slice
///
/// The loop nest follows the matrix layout: row-major reduces row dots,
/// column-major streams columns into the accumulating result.
fn mat_vec_cpu<T: Element>(
    rows: usize,
    cols: usize,
    row_major: bool,
    a: &[T],
    x: &[T],
    y: &mut [T],
) {
    if row_major {
        for i in 0..rows {
            let mut acc = T::zero();
            for j in 0..cols {
                acc = acc + a[i * cols + j] * x[j];
            }
            y[i] = acc;
        }
    } else {
        y.fill(T::zero());
        for j in 0..cols {
            let xv = x[j];
            for i in 0..rows {
                y[i] = y[i] + a[i + j * rows] * xv;
            }
        }
    }
}

fn gemv_run<T: Element>(
    op_name: &'static str,
    a: &Matrix<T>,
    transpose_a: bool,
    x: &Matrix<T>,
    y: &mut Matrix<T>,
) -> Result<()> {
    if a.ndim() != 2 {
        return Err(Error::InvalidDimension {
            dim: 2,
            ndim: a.ndim(),
        });
    }
    if x.ndim() != 1 || y.ndim() != 1 {
        return Err(Error::InvalidDimension {
            dim: 1,
            ndim: x.ndim().max(y.ndim()),
        });
    }

    let (m, k) = if transpose_a {
        (a.columns(), a.rows())
    } else {
        (a.rows(), a.columns())
    };
    if x.size() != k {
        return Err(Error::ShapeMismatch {
            expected: vec![k],
            got: vec![x.size()],
        });
    }
    if y.size() != m {
        return Err(Error::ShapeMismatch {
            expected: vec![m],
            got: vec![y.size()],
        });
    }

    let a_row_major = (a.order() == StorageOrder::RowMajor) ^ transpose_a;

    match select_path(op_name, &[desc(a), desc(x)], T::DTYPE)? {
        KernelPath::Gpu => {
            a.ensure_gpu_up_to_date();
            x.ensure_gpu_up_to_date();
            y.ensure_gpu_up_to_date();
            // a vector is a one-column result, so this is a GEMM with n = 1
            device::global().gemm(DeviceGemm {
                dtype: T::DTYPE,
                m,
                n: 1,
                k,
                a_row_major,
                b_row_major: true,
                c_row_major: true,
                a: device_handle(a),
                b: device_handle(x),
                c: device_handle(y),
            });
            y.buffer().validate_gpu();
            y.buffer().invalidate_cpu();
        }
        KernelPath::Cpu => {
            a.ensure_cpu_up_to_date();
            x.ensure_cpu_up_to_date();
            mat_vec_cpu(m, k, a_row_major, a.data(), x.data(), y.data_mut());
        }
    }
    Ok(())
}

/// y = A x
pub fn gemv<T: Element>(a: &Matrix<T>, x: &Matrix<T>, y: &mut Matrix<T>) -> Result<()> {
    gemv_run("gemv", a, false, x, y)
}

/// y = A^T x
pub fn gemv_t<T: Element>(a: &Matrix<T>, x: &Matrix<T>, y: &mut Matrix<T>) -> Result<()> {
    gemv_run("gemv_t", a, true, x, y)
}

/// y = x A (row vector times matrix)
pub fn gevm<T: Element>(x: &Matrix<T>, a: &Matrix<T>, y: &mut Matrix<T>) -> Result<()> {
    gemv_run("gevm", a, true, x, y)
}

/// y = x A^T
pub fn gevm_t<T: Element>(x: &Matrix<T>, a: &Matrix<T>, y: &mut Matrix<T>) -> Result<()> {
    gemv_run("gevm_t", a, false, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a_2x3() -> Matrix<f64> {
        Matrix::from_values(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_gemv() {
        let a = a_2x3();
        let x = Matrix::from_values(&[3], vec![1.0, 0.0, -1.0]).unwrap();
        let mut y = Matrix::<f64>::zeros(&[2]);
        gemv(&a, &x, &mut y).unwrap();
        assert_eq!(y.data(), &[-2.0, -2.0]);
    }

    #[test]
    fn test_gemv_col_major() {
        let a = Matrix::from_values_with_order(
            &[2, 3],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            StorageOrder::ColMajor,
        )
        .unwrap();
        let x = Matrix::from_values(&[3], vec![1.0, 0.0, -1.0]).unwrap();
        let mut y = Matrix::<f64>::zeros(&[2]);
        gemv(&a, &x, &mut y).unwrap();
        assert_eq!(y.data(), &[-2.0, -2.0]);
    }

    #[test]
    fn test_gemv_t() {
        let a = a_2x3();
        let x = Matrix::from_values(&[2], vec![1.0, 1.0]).unwrap();
        let mut y = Matrix::<f64>::zeros(&[3]);
        gemv_t(&a, &x, &mut y).unwrap();
        assert_eq!(y.data(), &[5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_gevm() {
        let a = a_2x3();
        let x = Matrix::from_values(&[2], vec![1.0, 1.0]).unwrap();
        let mut y = Matrix::<f64>::zeros(&[3]);
        gevm(&x, &a, &mut y).unwrap();
        assert_eq!(y.data(), &[5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_gevm_t() {
        let a = a_2x3();
        let x = Matrix::from_values(&[3], vec![1.0, 0.0, -1.0]).unwrap();
        let mut y = Matrix::<f64>::zeros(&[2]);
        gevm_t(&x, &a, &mut y).unwrap();
        assert_eq!(y.data(), &[-2.0, -2.0]);
    }

    #[test]
    fn test_size_validation() {
        let a = a_2x3();
        let x = Matrix::<f64>::zeros(&[2]);
        let mut y = Matrix::<f64>::zeros(&[2]);
        assert!(matches!(
            gemv(&a, &x, &mut y),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
