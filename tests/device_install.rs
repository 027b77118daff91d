//! Installing a device context ahead of the lazy default
//!
//! Kept to a single test: the context is process-wide, so installation must
//! happen before any other code in this binary touches the device.

use lazr::device::{self, DeviceContext, DeviceGemm, EchoDevice};
use lazr::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Delegates to the echo double while counting GEMM dispatches
struct CountingDevice {
    inner: EchoDevice,
    gemm_calls: Arc<AtomicUsize>,
}

impl DeviceContext for CountingDevice {
    fn alloc(&self, len_bytes: usize) -> u64 {
        self.inner.alloc(len_bytes)
    }

    fn free(&self, handle: u64) {
        self.inner.free(handle)
    }

    fn upload(&self, handle: u64, src: &[u8]) {
        self.inner.upload(handle, src)
    }

    fn download(&self, handle: u64, dst: &mut [u8]) {
        self.inner.download(handle, dst)
    }

    fn gemm(&self, call: DeviceGemm) {
        self.gemm_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.gemm(call)
    }
}

#[test]
fn installed_context_serves_the_device_path() {
    let gemm_calls = Arc::new(AtomicUsize::new(0));
    let installed = device::install(Box::new(CountingDevice {
        inner: EchoDevice::new(),
        gemm_calls: Arc::clone(&gemm_calls),
    }));
    assert!(installed, "no device code has run yet in this process");

    let a = Matrix::from_values(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let b = Matrix::from_values(&[2, 2], vec![5.0, 6.0, 7.0, 8.0]).unwrap();
    let mut c = Matrix::<f64>::zeros(&[2, 2]);

    a.ensure_gpu_up_to_date();
    b.ensure_gpu_up_to_date();
    gemm(&a, &b, &mut c).unwrap();

    assert_eq!(gemm_calls.load(Ordering::Relaxed), 1);
    assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);

    // once a context is active, later installs are rejected
    assert!(!device::install(Box::new(EchoDevice::new())));
}
