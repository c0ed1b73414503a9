//! OS-enabled extended processor state (XCR0).
//!
//! The CPU advertising AVX is not enough: the OS must also save and restore
//! the wider registers on context switch, and it says so by setting the
//! matching XCR0 components.

use bitflags::bitflags;
use serde::Serialize;

use crate::cpuid::{CpuidResult, CpuidSource, XCR_XFEATURE_ENABLED_MASK};

/// CPUID.1:ECX[27], the OS has set CR4.OSXSAVE and `XGETBV` is usable.
pub const CPUID_FEAT_ECX_OSXSAVE: u32 = 1 << 27;
/// CPUID.1:ECX[28], the processor implements AVX.
pub const CPUID_FEAT_ECX_AVX: u32 = 1 << 28;

bitflags! {
    /// XCR0 state-component bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub struct XFeatures: u64 {
        /// x87 FPU state.
        const X87 = 1 << 0;
        /// XMM0-15 and MXCSR.
        const SSE = 1 << 1;
        /// Upper halves of YMM0-15.
        const AVX = 1 << 2;
        /// MPX bound registers.
        const BNDREGS = 1 << 3;
        /// MPX bound configuration and status.
        const BNDCSR = 1 << 4;
        /// AVX-512 opmask registers k0-k7.
        const OPMASK = 1 << 5;
        /// Upper 256 bits of ZMM0-15.
        const ZMM_HI256 = 1 << 6;
        /// ZMM16-31.
        const HI16_ZMM = 1 << 7;

        /// State required before AVX instructions may run.
        const AVX_STATE = Self::SSE.bits() | Self::AVX.bits();
        /// State required before AVX-512 instructions may run.
        const AVX512_STATE = Self::AVX_STATE.bits()
            | Self::OPMASK.bits()
            | Self::ZMM_HI256.bits()
            | Self::HI16_ZMM.bits();
    }
}

impl XFeatures {
    /// Reads XCR0, but only when leaf 1 says both that `XGETBV` is usable
    /// and that the processor has AVX. Otherwise returns `None`.
    pub fn read<S: CpuidSource + ?Sized>(cpu: &S, leaf1: &CpuidResult) -> Option<Self> {
        let needed = CPUID_FEAT_ECX_OSXSAVE | CPUID_FEAT_ECX_AVX;
        if leaf1.ecx & needed != needed {
            return None;
        }
        Some(Self::from_bits_retain(cpu.xgetbv(XCR_XFEATURE_ENABLED_MASK)))
    }

    pub fn os_avx(self) -> bool {
        self.contains(Self::AVX_STATE)
    }

    /// AVX-512 state is only trusted on top of AVX state.
    pub fn os_avx512(self) -> bool {
        self.os_avx() && self.contains(Self::AVX512_STATE)
    }
}
