//! Dense containers and their storage

mod buffer;
mod dense;
mod order;

pub use buffer::{Buffer, BufferId};
pub use dense::Matrix;
pub use order::{coords, elem_count, shape_of, storage_index, Shape, StorageOrder};
