#[cfg(target_arch = "x86")]
use std::arch::x86::__cpuid_count;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::__cpuid_count;

use std::arch::asm;

use super::{CpuidResult, CpuidSource};

/// The processor this process is running on.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostCpuid;

impl CpuidSource for HostCpuid {
    #[inline]
    #[allow(unused_unsafe)]
    fn cpuid(&self, leaf: u32, subleaf: u32) -> CpuidResult {
        let r = unsafe { __cpuid_count(leaf, subleaf) };
        CpuidResult::new(r.eax, r.ebx, r.ecx, r.edx)
    }

    /// Reads an extended control register.
    ///
    /// `XGETBV` raises #UD unless the OS set CR4.OSXSAVE, which is what
    /// CPUID.1:ECX[27] reports. The detector checks that bit first.
    #[inline]
    fn xgetbv(&self, index: u32) -> u64 {
        let lo: u32;
        let hi: u32;
        unsafe {
            asm!(
                "xgetbv",
                in("ecx") index,
                out("eax") lo,
                out("edx") hi,
                options(nomem, nostack, preserves_flags),
            );
        }
        ((hi as u64) << 32) | lo as u64
    }
}
