//! Stochastic element-wise operators
//!
//! Randomness is injected through a [`NoiseCtx`] owned by the caller rather
//! than pulled from process-wide state, so tests can seed deterministically
//! and two contexts never contend on the same generator.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use super::ops::sigmoid;
use super::Expr;
use crate::element::Element;
use crate::matrix::{BufferId, Shape};

/// Shared random generator for stochastic expressions
///
/// The generator lives behind a mutex so the context itself is `Sync`, but
/// draws are sequenced: expressions holding one report
/// `parallel_safe() == false` and the evaluator keeps them on a single
/// thread.
pub struct NoiseCtx {
    rng: Mutex<StdRng>,
}

impl NoiseCtx {
    /// A context seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A deterministically seeded context
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draw from U[0, 1)
    pub fn uniform(&self) -> f64 {
        self.rng.lock().unwrap().gen::<f64>()
    }

    /// Draw from N(mean, sigma)
    ///
    /// A zero (or otherwise degenerate) sigma yields the mean.
    pub fn normal(&self, mean: f64, sigma: f64) -> f64 {
        match Normal::new(mean, sigma) {
            Ok(dist) => dist.sample(&mut *self.rng.lock().unwrap()),
            Err(_) => mean,
        }
    }
}

impl Default for NoiseCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NoiseCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseCtx").finish_non_exhaustive()
    }
}

/// Stochastic operators
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NoiseFn {
    /// 1 where x exceeds a uniform draw, else 0
    Bernoulli,
    /// 0 where x exceeds a uniform draw, else 1
    ReverseBernoulli,
    /// x plus a U[0, 1) draw
    Uniform,
    /// x plus an N(0, 1) draw
    Normal,
    /// x plus an N(0, sigmoid(x)) draw
    Logistic,
    /// x plus an N(0, 1) draw, except x is kept at 0 and at the range bound
    Ranged(f64),
}

impl NoiseFn {
    /// Apply the operator to one element, drawing from `ctx`
    pub fn apply<T: Element>(self, x: T, ctx: &NoiseCtx) -> T {
        let v = x.to_f64();
        match self {
            NoiseFn::Bernoulli => {
                if v > ctx.uniform() {
                    T::one()
                } else {
                    T::zero()
                }
            }
            NoiseFn::ReverseBernoulli => {
                if v > ctx.uniform() {
                    T::zero()
                } else {
                    T::one()
                }
            }
            NoiseFn::Uniform => T::from_f64(v + ctx.uniform()),
            NoiseFn::Normal => T::from_f64(v + ctx.normal(0.0, 1.0)),
            NoiseFn::Logistic => T::from_f64(v + ctx.normal(0.0, sigmoid(v))),
            NoiseFn::Ranged(range) => {
                if v == 0.0 || v == range {
                    x
                } else {
                    T::from_f64(v + ctx.normal(0.0, 1.0))
                }
            }
        }
    }
}

/// Lazy stochastic expression node
///
/// Re-reading an element re-draws, so materializing the same node twice
/// yields different samples. Not parallel-safe: all draws go through the
/// borrowed context.
#[derive(Debug)]
pub struct NoiseExpr<'a, E> {
    sub: E,
    op: NoiseFn,
    ctx: &'a NoiseCtx,
}

impl<'a, E: Expr> NoiseExpr<'a, E> {
    /// Wrap a sub-expression
    pub fn new(sub: E, op: NoiseFn, ctx: &'a NoiseCtx) -> Self {
        Self { sub, op, ctx }
    }
}

impl<E: Expr> Expr for NoiseExpr<'_, E> {
    type Elem = E::Elem;

    fn shape(&self) -> Shape {
        self.sub.shape()
    }

    fn value(&self, i: usize) -> Self::Elem {
        self.op.apply(self.sub.value(i), self.ctx)
    }

    fn is_linear(&self) -> bool {
        self.sub.is_linear()
    }

    fn parallel_safe(&self) -> bool {
        false
    }

    fn aliases(&self, id: BufferId) -> bool {
        self.sub.aliases(id)
    }

    fn ensure_cpu_up_to_date(&self) {
        self.sub.ensure_cpu_up_to_date()
    }

    fn ensure_gpu_up_to_date(&self) {
        self.sub.ensure_gpu_up_to_date()
    }

    fn broadcasts(&self) -> bool {
        self.sub.broadcasts()
    }
}
