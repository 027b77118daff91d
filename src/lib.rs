//! # lazr
//!
//! **Lazy expression evaluation for dense and sparse matrices.**
//!
//! lazr builds arithmetic over matrices as lazy expression graphs and
//! materializes them in a single pass when assigned into a destination -
//! no intermediate allocations for chained element-wise work.
//!
//! ## What's inside
//!
//! - **Expressions**: unary/binary element-wise graphs with operator
//!   overloading, scalar broadcasting and stochastic (noise) operators
//! - **Transformers**: zero-copy flips, transpose, sub/dim views,
//!   replication, row reductions, one-hot arg-max, probabilistic pooling,
//!   3-D upsampling
//! - **Evaluator**: shape-validated assignment with aliasing detection and
//!   threshold-gated parallel evaluation
//! - **Structural adapters**: diagonal and unit-triangular matrices that
//!   reject invariant-breaking writes before mutating
//! - **Sparse**: coordinate-format matrices with sorted triplet storage
//! - **Kernels**: GEMM/GEMV with full row/column-major layout dispatch and
//!   an opaque device backend for GPU execution
//! - **Freshness**: every buffer tracks CPU and device copies; reads
//!   refresh lazily, writes invalidate the other side
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lazr::prelude::*;
//!
//! let a = Matrix::from_values(&[2, 2], vec![1.0, 2.0, 3.0, 4.0])?;
//! let b = Matrix::from_values(&[2, 2], vec![5.0, 6.0, 7.0, 8.0])?;
//!
//! let mut c = Matrix::<f64>::zeros(&[2, 2]);
//! c.assign(a.ex() + b.ex() * 2.0)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded evaluation above size thresholds

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod adapters;
pub mod device;
pub mod element;
pub mod error;
pub mod eval;
pub mod expr;
pub mod kernels;
pub mod matrix;
pub mod sparse;
pub mod transform;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::{
        with_entry, DiagonalMatrix, EntryWrite, UniLowerMatrix, UniUpperMatrix,
    };
    pub use crate::element::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::eval::{mean, sum};
    pub use crate::expr::{Ex, Expr, NoiseCtx};
    pub use crate::kernels::{gemm, gemm_nt, gemm_tn, gemm_tt, gemv, gemv_t, gevm, gevm_t};
    pub use crate::matrix::{Matrix, StorageOrder};
    pub use crate::sparse::SparseMatrix;
    pub use crate::transform::{
        dim_view, fflip, hflip, one_if_max_sub, p_max_pool_h, p_max_pool_p, rep, row_mean,
        row_sum, sub_view, transpose, vflip,
    };
}
