//! Read-only views and transformers over expressions
//!
//! Transformers present an alternate index mapping over an underlying
//! expression without copying its data (pooling and arg-max precompute a
//! scratch pass, the rest are pure reindexings). All propagate aliasing and
//! freshness to what they wrap; reindexing transformers report
//! `is_linear() == false` so the evaluator breaks read-while-write aliasing
//! through a temporary.

mod argmax;
mod flip;
mod pool;
mod reduce;
mod rep;
mod transpose;
mod view;

pub use argmax::{one_if_max_sub, OneIfMaxSub};
pub use flip::{fflip, hflip, vflip, Flip, FlipAxes};
pub use pool::{p_max_pool_h, p_max_pool_p, PMaxPoolH, PMaxPoolP};
pub use reduce::{row_mean, row_sum, RowReduce};
pub use rep::{rep, Rep};
pub use transpose::{transpose, Transpose};
pub use view::{dim_view, sub_view, DimView, SubView};
