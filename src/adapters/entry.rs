//! Scoped single-entry writes

use crate::element::Element;
use crate::error::Result;

/// Validated write access to a single (row, column) entry
///
/// Implementors validate the new value against their structural invariant
/// and commit or reject atomically with respect to the container: a
/// rejected write changes nothing.
pub trait EntryWrite {
    /// The element type
    type Elem: Element;

    /// Current value at the entry (zero where nothing is stored)
    fn entry(&self, i: usize, j: usize) -> Self::Elem;

    /// Validate and commit a new value at the entry
    fn set_entry(&mut self, i: usize, j: usize, v: Self::Elem) -> Result<()>;
}

/// Read-modify-write one entry under the container's validation
///
/// Reads the current value, applies `f`, then commits through
/// [`EntryWrite::set_entry`]. The closure always runs; commit is where a
/// structural rejection surfaces.
pub fn with_entry<A, F>(target: &mut A, i: usize, j: usize, f: F) -> Result<()>
where
    A: EntryWrite,
    F: FnOnce(A::Elem) -> A::Elem,
{
    let cur = target.entry(i, j);
    target.set_entry(i, j, f(cur))
}
