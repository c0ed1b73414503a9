//! The process-wide capability snapshot.
//!
//! Detection runs once, at startup, through [`init`]. Everything after that
//! reads the same `&'static CpuX86`; it is never re-detected or reset.

use std::sync::OnceLock;

use thiserror::Error;
use tracing::info;

use super::hardware::CpuX86;
use crate::cpuid::CpuidSource;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectError {
    #[error("CPU features have not been detected; call feature_detector::init() at startup")]
    NotInitialized,
}

/// Write-once holder for a detected snapshot.
#[derive(Debug, Default)]
pub struct Instance {
    cell: OnceLock<CpuX86>,
}

impl Instance {
    pub const fn new() -> Self {
        Self { cell: OnceLock::new() }
    }

    /// Detects against `cpu` on the first call; later calls return the
    /// stored snapshot and never touch `cpu`.
    pub fn get_or_detect<S: CpuidSource + ?Sized>(&self, cpu: &S) -> &CpuX86 {
        self.cell.get_or_init(|| {
            let snap = CpuX86::detect(cpu);
            info!(
                vendor = %snap.vendor,
                avx = snap.safe_avx(),
                avx512 = snap.safe_avx512(),
                "CPU features detected"
            );
            snap
        })
    }

    pub fn get(&self) -> Result<&CpuX86, DetectError> {
        self.cell.get().ok_or(DetectError::NotInitialized)
    }
}

static HOST: Instance = Instance::new();

/// Detects the host CPU once and returns the process-wide snapshot.
///
/// Safe to call from any thread; concurrent first calls block until one
/// detection finishes.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn init() -> &'static CpuX86 {
    HOST.get_or_detect(&crate::cpuid::HostCpuid)
}

/// The process-wide snapshot, or [`DetectError::NotInitialized`] before [`init`].
pub fn snapshot() -> Result<&'static CpuX86, DetectError> {
    HOST.get()
}
