//! Storage buffer with CPU/GPU freshness tracking

use crate::device::{self, bytes_of, bytes_of_mut};
use crate::element::Element;
use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Global counter for unique buffer IDs
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a storage buffer
///
/// Used by aliasing queries: an expression aliases a destination when any
/// storage it reads carries the destination's ID. IDs are unique within a
/// process lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    /// Create a new unique buffer ID
    #[inline]
    pub fn new() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Default for BufferId {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned contiguous storage with an optional mirrored device region
///
/// The two freshness flags track which side holds the current data; the
/// invariant is that at most one side is stale at a time. Before any
/// CPU-side read the CPU copy is refreshed from the device if needed, and
/// symmetrically for device use.
///
/// # Concurrency
/// Freshness flags and host contents are mutated only by the evaluator that
/// owns the destination during a single assignment. Concurrent assignment
/// into the same buffer is not supported and carries no internal locking;
/// avoiding it is a caller responsibility.
pub struct Buffer<T> {
    id: BufferId,
    host: UnsafeCell<Vec<T>>,
    gpu_handle: Mutex<Option<u64>>,
    cpu_fresh: AtomicBool,
    gpu_fresh: AtomicBool,
}

// SAFETY: the host cell is only written through `&mut self` or during a
// CPU refresh, which by the single-writer contract above never races with
// readers of the same buffer.
unsafe impl<T: Send + Sync> Sync for Buffer<T> {}

impl<T: Element> Buffer<T> {
    /// Create a zero-filled buffer of `len` elements
    pub fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![T::zero(); len])
    }

    /// Create a buffer owning the given data, CPU-fresh
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            id: BufferId::new(),
            host: UnsafeCell::new(data),
            gpu_handle: Mutex::new(None),
            cpu_fresh: AtomicBool::new(true),
            gpu_fresh: AtomicBool::new(false),
        }
    }

    /// Get the buffer's unique ID
    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        // SAFETY: length never changes after construction.
        unsafe { (*self.host.get()).len() }
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the CPU copy holds the current data
    #[inline]
    pub fn is_cpu_fresh(&self) -> bool {
        self.cpu_fresh.load(Ordering::Acquire)
    }

    /// Whether the device copy holds the current data
    #[inline]
    pub fn is_gpu_fresh(&self) -> bool {
        self.gpu_fresh.load(Ordering::Acquire)
    }

    /// Read access to the host data, refreshing from the device if stale
    pub fn host(&self) -> &[T] {
        self.ensure_cpu_up_to_date();
        // SAFETY: single-writer contract; no mutation while this borrow lives.
        unsafe { &*self.host.get() }
    }

    /// Mutable access to the host data
    ///
    /// The caller must invalidate the GPU side after writing (the evaluator
    /// does this as its post-state step).
    pub fn host_mut(&mut self) -> &mut [T] {
        self.ensure_cpu_up_to_date();
        self.host.get_mut()
    }

    /// Ensure the CPU copy is current, copying back from the device if the
    /// device side is fresh and the CPU side is not
    pub fn ensure_cpu_up_to_date(&self) {
        if self.cpu_fresh.load(Ordering::Acquire) {
            return;
        }
        debug_assert!(self.gpu_fresh.load(Ordering::Acquire), "both sides stale");

        let guard = self.gpu_handle.lock().expect("gpu handle poisoned");
        if let Some(handle) = *guard {
            // SAFETY: refresh writes race with nothing under the
            // single-writer contract.
            let host = unsafe { &mut *self.host.get() };
            device::global().download(handle, bytes_of_mut(host));
        }
        self.cpu_fresh.store(true, Ordering::Release);
    }

    /// Ensure a device copy exists and is current, uploading if needed
    pub fn ensure_gpu_up_to_date(&self) {
        if self.gpu_fresh.load(Ordering::Acquire) {
            return;
        }
        debug_assert!(self.cpu_fresh.load(Ordering::Acquire), "both sides stale");

        let mut guard = self.gpu_handle.lock().expect("gpu handle poisoned");
        let handle = *guard.get_or_insert_with(|| {
            device::global().alloc(self.len() * std::mem::size_of::<T>())
        });
        // SAFETY: read-only view of host data, which is CPU-fresh here.
        let host = unsafe { &*self.host.get() };
        device::global().upload(handle, bytes_of(host));
        self.gpu_fresh.store(true, Ordering::Release);
    }

    /// The device handle, if a device mirror has been created
    pub fn gpu_memory(&self) -> Option<u64> {
        *self.gpu_handle.lock().expect("gpu handle poisoned")
    }

    /// Mark the CPU copy stale (after a device-side write)
    pub fn invalidate_cpu(&self) {
        debug_assert!(self.gpu_fresh.load(Ordering::Acquire), "both sides stale");
        self.cpu_fresh.store(false, Ordering::Release);
    }

    /// Mark the device copy stale (after a CPU-side write)
    pub fn invalidate_gpu(&self) {
        self.gpu_fresh.store(false, Ordering::Release);
        debug_assert!(self.cpu_fresh.load(Ordering::Acquire), "both sides stale");
    }

    /// Mark the device copy current (after a device-side write)
    pub fn validate_gpu(&self) {
        self.gpu_fresh.store(true, Ordering::Release);
    }
}

impl<T: Element> Clone for Buffer<T> {
    /// Clone copies the host data into a fresh CPU-resident buffer
    fn clone(&self) -> Self {
        Self::from_vec(self.host().to_vec())
    }
}

impl<T> Drop for Buffer<T> {
    fn drop(&mut self) {
        if let Ok(guard) = self.gpu_handle.lock() {
            if let Some(handle) = *guard {
                device::global().free(handle);
            }
        }
    }
}

impl<T: Element> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id.raw())
            .field("len", &self.len())
            .field("cpu_fresh", &self.is_cpu_fresh())
            .field("gpu_fresh", &self.is_gpu_fresh())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids() {
        let a = Buffer::<f64>::zeroed(4);
        let b = Buffer::<f64>::zeroed(4);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_starts_cpu_fresh() {
        let buf = Buffer::<f64>::from_vec(vec![1.0, 2.0]);
        assert!(buf.is_cpu_fresh());
        assert!(!buf.is_gpu_fresh());
        assert_eq!(buf.gpu_memory(), None);
    }

    #[test]
    fn test_round_trip_through_device() {
        let mut buf = Buffer::<f64>::from_vec(vec![1.0, 2.0, 3.0]);

        buf.ensure_gpu_up_to_date();
        assert!(buf.is_gpu_fresh());
        assert!(buf.gpu_memory().is_some());

        // Overwrite host, pretend the device held the old values, then
        // refresh back from the device.
        buf.host_mut().copy_from_slice(&[9.0, 9.0, 9.0]);
        buf.invalidate_cpu();
        buf.ensure_cpu_up_to_date();
        assert_eq!(buf.host(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_cpu_write_invalidates_gpu() {
        let mut buf = Buffer::<f64>::from_vec(vec![1.0]);
        buf.ensure_gpu_up_to_date();

        buf.host_mut()[0] = 5.0;
        buf.invalidate_gpu();
        assert!(!buf.is_gpu_fresh());
        assert!(buf.is_cpu_fresh());

        buf.ensure_gpu_up_to_date();
        assert!(buf.is_gpu_fresh());
    }
}
