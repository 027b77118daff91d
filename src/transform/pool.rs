//! Probabilistic max-pooling transformers
//!
//! Both transformers work over C1 x C2 non-overlapping tiles aligned to the
//! tile grid. Each exp-sum is needed by every element of its tile, so the
//! operand is snapshotted and the per-tile sums are precomputed at
//! construction instead of re-deriving them per element.

use crate::element::Element;
use crate::expr::Expr;
use crate::matrix::{BufferId, Shape};

struct PoolGrid {
    x: Vec<f64>,
    denom: Vec<f64>,
    shape: Shape,
    c1: usize,
    c2: usize,
    tiles_r: usize,
    tiles_c: usize,
}

impl std::fmt::Debug for PoolGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolGrid")
            .field("shape", &self.shape.as_slice())
            .field("window", &(self.c1, self.c2))
            .finish()
    }
}

/// Snapshot the operand and compute 1 + sum(exp) for every tile
fn pool_grid<E: Expr>(sub: E, c1: usize, c2: usize) -> PoolGrid {
    let shape = sub.shape();
    let nd = shape.len();
    assert!(nd == 2 || nd == 3, "pooling requires a 2-D or 3-D operand");
    assert!(c1 > 0 && c2 > 0, "pool window extents must be positive");

    let (batches, rows, cols) = if nd == 2 {
        (1, shape[0], shape[1])
    } else {
        (shape[0], shape[1], shape[2])
    };
    assert!(
        rows % c1 == 0 && cols % c2 == 0,
        "pool window must tile the operand exactly"
    );

    sub.ensure_cpu_up_to_date();
    let x: Vec<f64> = (0..sub.size()).map(|i| sub.value(i).to_f64()).collect();

    let (tiles_r, tiles_c) = (rows / c1, cols / c2);
    let mut denom = vec![1.0f64; batches * tiles_r * tiles_c];
    for b in 0..batches {
        for r in 0..rows {
            for c in 0..cols {
                let t = (b * tiles_r + r / c1) * tiles_c + c / c2;
                denom[t] += x[(b * rows + r) * cols + c].exp();
            }
        }
    }

    PoolGrid {
        x,
        denom,
        shape,
        c1,
        c2,
        tiles_r,
        tiles_c,
    }
}

impl PoolGrid {
    fn dims(&self) -> (usize, usize, usize) {
        if self.shape.len() == 2 {
            (1, self.shape[0], self.shape[1])
        } else {
            (self.shape[0], self.shape[1], self.shape[2])
        }
    }

    fn denom_at(&self, b: usize, r: usize, c: usize) -> f64 {
        self.denom[(b * self.tiles_r + r / self.c1) * self.tiles_c + c / self.c2]
    }
}

/// Hidden-unit probabilistic max-pooling: `exp(x) / (1 + sum(exp) over tile)`
///
/// Same shape as the operand.
#[derive(Debug)]
pub struct PMaxPoolH<T> {
    grid: PoolGrid,
    _marker: std::marker::PhantomData<T>,
}

/// Probabilistic max-pooling of hidden activations over C1 x C2 tiles
pub fn p_max_pool_h<E: Expr>(sub: E, c1: usize, c2: usize) -> PMaxPoolH<E::Elem> {
    PMaxPoolH {
        grid: pool_grid(sub, c1, c2),
        _marker: std::marker::PhantomData,
    }
}

impl<T: crate::element::Element> Expr for PMaxPoolH<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        self.grid.shape.clone()
    }

    fn value(&self, i: usize) -> T {
        let (_, rows, cols) = self.grid.dims();
        let c = i % cols;
        let r = (i / cols) % rows;
        let b = i / (rows * cols);
        T::from_f64(self.grid.x[i].exp() / self.grid.denom_at(b, r, c))
    }

    fn aliases(&self, _id: BufferId) -> bool {
        false
    }
}

/// Pooling-unit probability: `1 / (1 + sum(exp) over tile)`
///
/// Shape is the operand pooled down by the window: rows / C1, cols / C2.
#[derive(Debug)]
pub struct PMaxPoolP<T> {
    grid: PoolGrid,
    _marker: std::marker::PhantomData<T>,
}

/// Probabilistic pooling probabilities over C1 x C2 tiles
pub fn p_max_pool_p<E: Expr>(sub: E, c1: usize, c2: usize) -> PMaxPoolP<E::Elem> {
    PMaxPoolP {
        grid: pool_grid(sub, c1, c2),
        _marker: std::marker::PhantomData,
    }
}

impl<T: crate::element::Element> Expr for PMaxPoolP<T> {
    type Elem = T;

    fn shape(&self) -> Shape {
        let mut s = Shape::new();
        if self.grid.shape.len() == 3 {
            s.push(self.grid.shape[0]);
        }
        s.push(self.grid.tiles_r);
        s.push(self.grid.tiles_c);
        s
    }

    fn value(&self, i: usize) -> T {
        let (tr, tc) = (self.grid.tiles_r, self.grid.tiles_c);
        let c = i % tc;
        let r = (i / tc) % tr;
        let b = i / (tr * tc);
        T::from_f64(1.0 / self.grid.denom[(b * tr + r) * tc + c])
    }

    fn aliases(&self, _id: BufferId) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_h_normalization() {
        let m = Matrix::from_values(&[2, 2], vec![0.1f64, 0.2, 0.3, 0.4]).unwrap();
        let h = p_max_pool_h(&m, 2, 2);
        assert_eq!(h.shape().as_slice(), &[2, 2]);

        let denom: f64 = 1.0 + m.data().iter().map(|x| x.exp()).sum::<f64>();
        for i in 0..4 {
            assert!(close(h.value(i), m.data()[i].exp() / denom));
        }
    }

    #[test]
    fn test_h_and_p_sum_to_one_per_tile() {
        let m = Matrix::from_values(&[2, 4], vec![0.5, -1.0, 2.0, 0.0, 1.5, 0.3, -0.7, 0.9])
            .unwrap();
        let h = p_max_pool_h(&m, 2, 2);
        let p = p_max_pool_p(&m, 2, 2);
        assert_eq!(p.shape().as_slice(), &[1, 2]);

        for tile in 0..2 {
            let mut total = p.value(tile);
            for r in 0..2 {
                for c in 0..2 {
                    total += h.at2(r, tile * 2 + c);
                }
            }
            assert!(close(total, 1.0));
        }
    }

    #[test]
    fn test_3d_pooling_shape() {
        let m = Matrix::from_values(&[2, 2, 2], (0..8).map(|x| x as f64 / 10.0).collect())
            .unwrap();
        let p = p_max_pool_p(&m, 2, 2);
        assert_eq!(p.shape().as_slice(), &[2, 1, 1]);
        let h = p_max_pool_h(&m, 2, 2);
        assert_eq!(h.shape().as_slice(), &[2, 2, 2]);
    }

    #[test]
    #[should_panic(expected = "tile the operand exactly")]
    fn test_unaligned_window_panics() {
        let m = Matrix::<f64>::zeros(&[3, 4]);
        let _ = p_max_pool_h(&m, 2, 2);
    }
}
