//! Sparse containers

mod coo;

pub use coo::SparseMatrix;
