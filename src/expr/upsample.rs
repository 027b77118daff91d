//! Nearest-neighbour 3-D upsampling

use super::Expr;
use crate::matrix::{BufferId, Shape};

/// Upsampled view of a 3-D expression
///
/// Every source element is replicated across a `c1 x c2 x c3` block. The
/// source is materialized once at construction: each input element is read
/// `c1 * c2 * c3` times, so re-evaluating a lazy operand per output element
/// would multiply its cost by the block volume.
#[derive(Clone, Debug)]
pub struct Upsample3d<T> {
    data: Vec<T>,
    in_shape: Shape,
    out_shape: Shape,
    c1: usize,
    c2: usize,
    c3: usize,
}

/// Upsample a 3-D expression by integer factors per dimension
///
/// # Panics
/// Panics if the expression is not 3-D or any factor is zero.
pub fn upsample_3d<E: Expr>(expr: E, c1: usize, c2: usize, c3: usize) -> Upsample3d<E::Elem> {
    let in_shape = expr.shape();
    assert_eq!(in_shape.len(), 3, "upsample_3d requires a 3-D expression");
    assert!(c1 > 0 && c2 > 0 && c3 > 0, "upsample factors must be positive");

    expr.ensure_cpu_up_to_date();
    let data: Vec<E::Elem> = (0..expr.size()).map(|i| expr.value(i)).collect();

    let mut out_shape = Shape::new();
    out_shape.push(in_shape[0] * c1);
    out_shape.push(in_shape[1] * c2);
    out_shape.push(in_shape[2] * c3);

    Upsample3d {
        data,
        in_shape,
        out_shape,
        c1,
        c2,
        c3,
    }
}

impl<T: crate::element::Element> Expr for Upsample3d<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        self.out_shape.clone()
    }

    fn value(&self, i: usize) -> T {
        let (o1, o2) = (self.out_shape[1], self.out_shape[2]);
        let k = i % o2;
        let j = (i / o2) % o1;
        let x = i / (o1 * o2);

        let (s1, s2) = (self.in_shape[1], self.in_shape[2]);
        let (sx, sj, sk) = (x / self.c1, j / self.c2, k / self.c3);
        self.data[(sx * s1 + sj) * s2 + sk]
    }

    fn is_linear(&self) -> bool {
        // Reindexing view over its snapshot; snapshot never aliases.
        true
    }

    fn aliases(&self, _id: BufferId) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    #[test]
    fn test_upsample_blocks() {
        let a = Matrix::from_values(&[1, 2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let u = upsample_3d(&a, 1, 2, 2);
        assert_eq!(u.shape().as_slice(), &[1, 4, 4]);
        assert_eq!(u.at3(0, 0, 0), 1.0);
        assert_eq!(u.at3(0, 0, 1), 1.0);
        assert_eq!(u.at3(0, 1, 1), 1.0);
        assert_eq!(u.at3(0, 0, 2), 2.0);
        assert_eq!(u.at3(0, 3, 3), 4.0);
    }

    #[test]
    fn test_upsample_depth() {
        let a = Matrix::from_values(&[2, 1, 1], vec![5.0, 6.0]).unwrap();
        let u = upsample_3d(&a, 3, 1, 1);
        assert_eq!(u.shape().as_slice(), &[6, 1, 1]);
        assert_eq!(u.at3(0, 0, 0), 5.0);
        assert_eq!(u.at3(2, 0, 0), 5.0);
        assert_eq!(u.at3(3, 0, 0), 6.0);
        assert_eq!(u.at3(5, 0, 0), 6.0);
    }

    #[test]
    #[should_panic(expected = "3-D expression")]
    fn test_upsample_requires_3d() {
        let a = Matrix::<f64>::zeros(&[2, 2]);
        let _ = upsample_3d(&a, 2, 2, 2);
    }
}
