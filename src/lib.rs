//! Runtime x86 capability detection.
//!
//! Call [`init`] once at startup, then read flags from the returned
//! [`CpuX86`]. A hardware flag alone never means an extension is usable:
//! check [`CpuX86::safe_avx`] / [`CpuX86::safe_avx512`], or pair the `hw_*`
//! flag with the matching `os_*` flag yourself.
//!
//! ```
//! # #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
//! # {
//! let cpu = feature_detector::init();
//! let path = if cpu.safe_avx512() {
//!     "avx512"
//! } else if cpu.safe_avx() && cpu.hw_avx2 {
//!     "avx2"
//! } else {
//!     "scalar"
//! };
//! assert!(!cpu.os_avx512 || cpu.os_avx);
//! println!("using the {} kernels", path);
//! # }
//! ```

pub mod core;
pub mod cpuid;
pub mod report;

pub use crate::core::hardware::{CpuX86, FeatureBit, Group, VendorId, FEATURE_BITS};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use crate::core::instance::init;
pub use crate::core::instance::{snapshot, DetectError, Instance};
pub use crate::core::xstate::XFeatures;
