//! Storage order and index mapping

use smallvec::SmallVec;

/// Stack allocation threshold for dimensions
///
/// Containers here are 1-D to 3-D, so four inline slots never spill.
const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a container or expression
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Build a [`Shape`] from a slice of dimensions
#[inline]
pub fn shape_of(dims: &[usize]) -> Shape {
    dims.iter().copied().collect()
}

/// Total element count of a shape
#[inline]
pub fn elem_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Memory layout of a dense container
///
/// Expressions always evaluate in logical row-major element order; the
/// storage order only decides where a logical element lives in the backing
/// buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StorageOrder {
    /// C order: last dimension fastest
    RowMajor,
    /// Fortran order: first dimension fastest
    ColMajor,
}

/// Decompose a logical row-major flat index into per-dimension coordinates
pub fn coords(shape: &[usize], mut flat: usize, out: &mut [usize]) {
    debug_assert_eq!(shape.len(), out.len());
    for d in (0..shape.len()).rev() {
        out[d] = flat % shape[d];
        flat /= shape[d];
    }
}

/// Map a logical row-major flat index to a storage position
///
/// Identity for row-major buffers; for column-major buffers the coordinates
/// are re-linearized with the first dimension fastest.
pub fn storage_index(order: StorageOrder, shape: &[usize], flat: usize) -> usize {
    match order {
        StorageOrder::RowMajor => flat,
        StorageOrder::ColMajor => {
            let mut c = [0usize; STACK_DIMS];
            let nd = shape.len();
            coords(shape, flat, &mut c[..nd]);
            let mut idx = 0;
            let mut stride = 1;
            for d in 0..nd {
                idx += c[d] * stride;
                stride *= shape[d];
            }
            idx
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_identity() {
        for i in 0..6 {
            assert_eq!(storage_index(StorageOrder::RowMajor, &[2, 3], i), i);
        }
    }

    #[test]
    fn test_col_major_2d() {
        // logical (i, j) of a 2x3 matrix lands at j * 2 + i
        let shape = [2, 3];
        assert_eq!(storage_index(StorageOrder::ColMajor, &shape, 0), 0); // (0,0)
        assert_eq!(storage_index(StorageOrder::ColMajor, &shape, 1), 2); // (0,1)
        assert_eq!(storage_index(StorageOrder::ColMajor, &shape, 2), 4); // (0,2)
        assert_eq!(storage_index(StorageOrder::ColMajor, &shape, 3), 1); // (1,0)
        assert_eq!(storage_index(StorageOrder::ColMajor, &shape, 5), 5); // (1,2)
    }

    #[test]
    fn test_col_major_is_permutation() {
        let shape = [3, 4, 5];
        let n = elem_count(&shape);
        let mut seen = vec![false; n];
        for i in 0..n {
            let s = storage_index(StorageOrder::ColMajor, &shape, i);
            assert!(!seen[s]);
            seen[s] = true;
        }
    }

    #[test]
    fn test_coords() {
        let mut c = [0usize; 3];
        coords(&[2, 3, 4], 23, &mut c);
        assert_eq!(c, [1, 2, 3]);
    }
}
