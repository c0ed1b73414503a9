//! Raw processor identification queries.
//!
//! Everything above this module works on [`CpuidResult`] words handed out by a
//! [`CpuidSource`], so the decoding logic never touches the real instructions
//! and can be fed canned leaves in tests.

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod host;
pub mod synthetic;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use host::HostCpuid;
pub use synthetic::SyntheticCpu;

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

/// Vendor string and maximum standard leaf.
pub const LEAF_VENDOR: u32 = 0x0000_0000;
/// Basic feature flags.
pub const LEAF_FEATURES: u32 = 0x0000_0001;
/// Structured extended feature flags (subleaf 0 and 1).
pub const LEAF_STRUCTURED_EXT: u32 = 0x0000_0007;
/// Maximum extended leaf.
pub const LEAF_EXT_MAX: u32 = 0x8000_0000;
/// Extended (mostly AMD) feature flags.
pub const LEAF_EXT_FEATURES: u32 = 0x8000_0001;

/// XCR0, the OS-managed extended-state enable mask.
pub const XCR_XFEATURE_ENABLED_MASK: u32 = 0;

/// The four words returned by one identification query.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Pod, Zeroable, Serialize)]
pub struct CpuidResult {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

impl CpuidResult {
    pub const fn new(eax: u32, ebx: u32, ecx: u32, edx: u32) -> Self {
        Self { eax, ebx, ecx, edx }
    }

    pub fn word(&self, reg: Register) -> u32 {
        match reg {
            Register::Eax => self.eax,
            Register::Ebx => self.ebx,
            Register::Ecx => self.ecx,
            Register::Edx => self.edx,
        }
    }

    /// `(word & (1 << bit)) != 0`
    pub fn bit(&self, reg: Register, bit: u8) -> bool {
        self.word(reg) & (1u32 << bit) != 0
    }
}

/// Names one of the four result words.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Register {
    Eax,
    Ebx,
    Ecx,
    Edx,
}

/// Source of raw identification queries.
///
/// `xgetbv` is only ever called after leaf 1 reported both OSXSAVE and AVX,
/// so implementations may assume the instruction is usable.
pub trait CpuidSource {
    fn cpuid(&self, leaf: u32, subleaf: u32) -> CpuidResult;

    fn xgetbv(&self, index: u32) -> u64;

    /// Whether the operating system runs in 64-bit mode.
    fn os_x64(&self) -> bool {
        crate::core::platform::os_is_64bit()
    }
}
