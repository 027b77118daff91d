//! Matrix-multiply kernels and their dispatch
//!
//! Kernel selection is a closed decision over operand descriptors: storage
//! order, element type and device residency. Heterogeneous element types
//! have no kernel and fail fast; homogeneous operands run on the device
//! when every input already lives there, on the CPU otherwise.

mod gemm;
mod gemv;

pub use gemm::{gemm, gemm_nt, gemm_tn, gemm_tt};
pub use gemv::{gemv, gemv_t, gevm, gevm_t};

use crate::element::DType;
use crate::error::{Error, Result};
use crate::matrix::StorageOrder;

/// What a kernel needs to know about one operand
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OperandDesc {
    /// Storage order of the operand
    pub order: StorageOrder,
    /// Element type of the operand
    pub dtype: DType,
    /// Whether the operand's device copy is current
    pub gpu_resident: bool,
}

/// Where a kernel call will run
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KernelPath {
    /// Host kernels
    Cpu,
    /// Vendor call through the device context
    Gpu,
}

/// Choose the execution path for a kernel call
///
/// All inputs and the output must share one element type; a mismatch is
/// unsupported and reported before any work happens. The device path is
/// taken only when every input is already device-resident.
pub fn select_path(
    op: &'static str,
    inputs: &[OperandDesc],
    out_dtype: DType,
) -> Result<KernelPath> {
    for desc in inputs {
        if desc.dtype != out_dtype {
            return Err(Error::UnsupportedKernel {
                op,
                reason: "heterogeneous element types",
            });
        }
    }
    if !inputs.is_empty() && inputs.iter().all(|d| d.gpu_resident) {
        Ok(KernelPath::Gpu)
    } else {
        Ok(KernelPath::Cpu)
    }
}
