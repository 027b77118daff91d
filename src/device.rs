//! Device buffer capability
//!
//! The GPU side of the freshness protocol is consumed through an opaque
//! capability trait: the engine only needs alloc/free, host<->device copies
//! and a vendor GEMM entry point. A process-wide context is created lazily
//! on first use and reused for the lifetime of the process; it is never
//! torn down mid-run.
//!
//! The built-in [`EchoDevice`] keeps "device" memory in host byte vectors so
//! the freshness protocol and the GPU kernel path are fully exercisable in
//! tests without hardware.

use crate::element::DType;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

/// Parameters of a device GEMM call
///
/// Matrices are described by their logical dimensions plus a row-major flag
/// per operand; the backend derives its transposed-operand flags from those,
/// the way a cuBLAS wrapper derives them from storage order.
#[derive(Copy, Clone, Debug)]
pub struct DeviceGemm {
    /// Element type of all three operands (homogeneous by contract)
    pub dtype: DType,
    /// Rows of the result
    pub m: usize,
    /// Columns of the result
    pub n: usize,
    /// Inner dimension
    pub k: usize,
    /// Whether A is stored row-major
    pub a_row_major: bool,
    /// Whether B is stored row-major
    pub b_row_major: bool,
    /// Whether C is stored row-major
    pub c_row_major: bool,
    /// Device handle of A
    pub a: u64,
    /// Device handle of B
    pub b: u64,
    /// Device handle of C
    pub c: u64,
}

/// Opaque device buffer capability
///
/// Handles are plain `u64` tokens; zero is never a valid handle.
pub trait DeviceContext: Send + Sync {
    /// Allocate `len_bytes` of device memory, returning a handle
    fn alloc(&self, len_bytes: usize) -> u64;

    /// Release a handle previously returned by [`Self::alloc`]
    fn free(&self, handle: u64);

    /// Copy host bytes into a device allocation
    fn upload(&self, handle: u64, src: &[u8]);

    /// Copy a device allocation back into host bytes
    fn download(&self, handle: u64, dst: &mut [u8]);

    /// Vendor GEMM: C = A * B over device-resident operands
    fn gemm(&self, call: DeviceGemm);
}

static GLOBAL: OnceLock<Box<dyn DeviceContext>> = OnceLock::new();

/// Install a device context before first use
///
/// Returns `false` if a context (possibly the lazily created default) is
/// already active.
pub fn install(ctx: Box<dyn DeviceContext>) -> bool {
    GLOBAL.set(ctx).is_ok()
}

/// The process-wide device context, lazily created on first use
pub fn global() -> &'static dyn DeviceContext {
    GLOBAL.get_or_init(|| Box::new(EchoDevice::new())).as_ref()
}

/// Host-backed device double
///
/// Stores each allocation as a byte vector and implements the GEMM entry by
/// computing on the host. Used as the default context and in tests.
pub struct EchoDevice {
    buffers: Mutex<HashMap<u64, Vec<u8>>>,
    next: AtomicU64,
}

impl EchoDevice {
    /// Create an empty echo device
    pub fn new() -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for EchoDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceContext for EchoDevice {
    fn alloc(&self, len_bytes: usize) -> u64 {
        let handle = self.next.fetch_add(1, Ordering::Relaxed);
        self.buffers
            .lock()
            .expect("device buffer table poisoned")
            .insert(handle, vec![0u8; len_bytes]);
        handle
    }

    fn free(&self, handle: u64) {
        self.buffers
            .lock()
            .expect("device buffer table poisoned")
            .remove(&handle);
    }

    fn upload(&self, handle: u64, src: &[u8]) {
        let mut buffers = self.buffers.lock().expect("device buffer table poisoned");
        let buf = buffers.get_mut(&handle).expect("invalid device handle");
        buf[..src.len()].copy_from_slice(src);
    }

    fn download(&self, handle: u64, dst: &mut [u8]) {
        let buffers = self.buffers.lock().expect("device buffer table poisoned");
        let buf = buffers.get(&handle).expect("invalid device handle");
        dst.copy_from_slice(&buf[..dst.len()]);
    }

    fn gemm(&self, call: DeviceGemm) {
        match call.dtype {
            DType::F32 => self.gemm_typed::<f32>(call),
            DType::F64 => self.gemm_typed::<f64>(call),
            DType::I32 => self.gemm_typed::<i32>(call),
            DType::I64 => self.gemm_typed::<i64>(call),
        }
    }
}

impl EchoDevice {
    fn gemm_typed<T: crate::element::Element>(&self, call: DeviceGemm) {
        let DeviceGemm { m, n, k, .. } = call;

        let mut a = vec![T::zero(); m * k];
        let mut b = vec![T::zero(); k * n];
        let mut c = vec![T::zero(); m * n];

        self.download(call.a, bytes_of_mut(&mut a));
        self.download(call.b, bytes_of_mut(&mut b));

        let at = |i: usize, j: usize, rows: usize, cols: usize, rm: bool| {
            if rm {
                i * cols + j
            } else {
                debug_assert!(rows > 0);
                j * rows + i
            }
        };

        for i in 0..m {
            for j in 0..n {
                let mut acc = T::zero();
                for p in 0..k {
                    let av = a[at(i, p, m, k, call.a_row_major)];
                    let bv = b[at(p, j, k, n, call.b_row_major)];
                    acc = acc + av * bv;
                }
                c[at(i, j, m, n, call.c_row_major)] = acc;
            }
        }

        self.upload(call.c, bytes_of(&c));
    }
}

/// View a typed slice as raw bytes
///
/// # Safety rationale
/// `Element` types are plain machine numbers with no padding or invalid bit
/// patterns, so byte-level reads are always valid.
pub fn bytes_of<T: crate::element::Element>(slice: &[T]) -> &[u8] {
    // SAFETY: Element types are POD; size is exact.
    unsafe {
        std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice))
    }
}

/// View a typed slice as mutable raw bytes
pub fn bytes_of_mut<T: crate::element::Element>(slice: &mut [T]) -> &mut [u8] {
    // SAFETY: Element types are POD; any byte pattern is a valid value.
    unsafe {
        std::slice::from_raw_parts_mut(slice.as_mut_ptr() as *mut u8, std::mem::size_of_val(slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_upload_download() {
        let dev = EchoDevice::new();
        let data = [1.0f64, 2.0, 3.0];
        let handle = dev.alloc(24);
        dev.upload(handle, bytes_of(&data));

        let mut back = [0.0f64; 3];
        dev.download(handle, bytes_of_mut(&mut back));
        assert_eq!(back, data);

        dev.free(handle);
    }

    #[test]
    fn test_echo_gemm_row_major() {
        let dev = EchoDevice::new();
        // A = [[1, 2], [3, 4]], B = [[5, 6], [7, 8]]
        let a = [1.0f64, 2.0, 3.0, 4.0];
        let b = [5.0f64, 6.0, 7.0, 8.0];

        let ha = dev.alloc(32);
        let hb = dev.alloc(32);
        let hc = dev.alloc(32);
        dev.upload(ha, bytes_of(&a));
        dev.upload(hb, bytes_of(&b));

        dev.gemm(DeviceGemm {
            dtype: DType::F64,
            m: 2,
            n: 2,
            k: 2,
            a_row_major: true,
            b_row_major: true,
            c_row_major: true,
            a: ha,
            b: hb,
            c: hc,
        });

        let mut c = [0.0f64; 4];
        dev.download(hc, bytes_of_mut(&mut c));
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }
}
