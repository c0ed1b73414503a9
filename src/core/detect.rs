use tracing::debug;

use super::hardware::{CpuX86, VendorId, FEATURE_BITS, VENDOR_AMD, VENDOR_INTEL};
use super::xstate::XFeatures;
use crate::cpuid::{
    CpuidSource, LEAF_EXT_FEATURES, LEAF_EXT_MAX, LEAF_FEATURES, LEAF_STRUCTURED_EXT, LEAF_VENDOR,
};

/// Leaves the decode table reads from, in query order.
pub const FEATURE_LEAVES: [(u32, u32); 4] = [
    (LEAF_FEATURES, 0),
    (LEAF_STRUCTURED_EXT, 0),
    (LEAF_STRUCTURED_EXT, 1),
    (LEAF_EXT_FEATURES, 0),
];

/// Whether `leaf` lies within the range the processor reports.
pub fn leaf_supported(leaf: u32, max_leaf: u32, max_ext_leaf: u32) -> bool {
    if leaf >= LEAF_EXT_MAX {
        max_ext_leaf >= leaf
    } else {
        max_leaf >= leaf
    }
}

impl CpuX86 {
    /// Runs the full detection sequence against `cpu`.
    ///
    /// Pure apart from the queries themselves: the same source always yields
    /// the same snapshot. Leaves above the reported maximum are never queried
    /// and their flags stay false.
    pub fn detect<S: CpuidSource + ?Sized>(cpu: &S) -> Self {
        let mut snap = Self::default();

        //  Vendor
        let id = cpu.cpuid(LEAF_VENDOR, 0);
        let max_leaf = id.eax;
        snap.vendor = VendorId::from_words(id.ebx, id.edx, id.ecx);
        snap.vendor_intel = &snap.vendor.0 == VENDOR_INTEL;
        snap.vendor_amd = &snap.vendor.0 == VENDOR_AMD;

        let max_ext_leaf = cpu.cpuid(LEAF_EXT_MAX, 0).eax;
        debug!(vendor = %snap.vendor, max_leaf, max_ext_leaf, "CPUID ranges");

        //  OS Features
        snap.os_x64 = cpu.os_x64();
        let xstate = XFeatures::read(cpu, &cpu.cpuid(LEAF_FEATURES, 0));
        debug!(xcr0 = ?xstate, "Extended state");
        if let Some(x) = xstate {
            snap.os_avx = x.os_avx();
            snap.os_avx512 = x.os_avx512();
        }

        //  Hardware Features
        for (leaf, subleaf) in FEATURE_LEAVES {
            if !leaf_supported(leaf, max_leaf, max_ext_leaf) {
                continue;
            }

            let result = cpu.cpuid(leaf, subleaf);
            for fb in FEATURE_BITS.iter().filter(|fb| fb.leaf == leaf && fb.subleaf == subleaf) {
                fb.set(&mut snap, result.bit(fb.reg, fb.bit));
            }
        }

        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpuid::{CpuidResult, SyntheticCpu};

    fn set_flags(cpu: &CpuX86, leaf: u32) -> Vec<&'static str> {
        FEATURE_BITS
            .iter()
            .filter(|fb| fb.leaf == leaf && fb.get(cpu))
            .map(|fb| fb.name)
            .collect()
    }

    fn skylake_x() -> SyntheticCpu {
        SyntheticCpu::new()
            .with_vendor(b"GenuineIntel")
            .with_os_x64(true)
            .with_xcr0(0xe7)
            .with_leaf(1, 0, CpuidResult::new(0x50654, 0, 0x7ffefbff, 0xbfebfbff))
            .with_leaf(7, 0, CpuidResult::new(0, 0xd39ffffb, 0x00000818, 0))
            .with_leaf(7, 1, CpuidResult::default())
            .with_leaf(0x8000_0001, 0, CpuidResult::new(0, 0, 0x121, 0x2c100800))
    }

    #[test]
    fn test_vendor_flags() {
        for (vendor, intel, amd) in [
            (b"GenuineIntel", true, false),
            (b"AuthenticAMD", false, true),
            (b"CentaurHauls", false, false),
            (b"HygonGenuine", false, false),
            (b"GenuineIntex", false, false),
        ] {
            let cpu = CpuX86::detect(&SyntheticCpu::new().with_vendor(vendor));
            assert_eq!(cpu.vendor_intel, intel, "{:?}", cpu.vendor);
            assert_eq!(cpu.vendor_amd, amd, "{:?}", cpu.vendor);
            assert_eq!(cpu.vendor_string().as_bytes(), vendor);
        }
    }

    #[test]
    fn test_leaf1_sse_only() {
        let src = SyntheticCpu::new().with_leaf(1, 0, CpuidResult::new(0, 0, 0, 1 << 25));
        let cpu = CpuX86::detect(&src);
        assert!(cpu.hw_sse);
        assert_eq!(set_flags(&cpu, 1), vec!["SSE"]);
    }

    #[test]
    fn test_leaf7_avx2_only() {
        let src = SyntheticCpu::new().with_leaf(7, 0, CpuidResult::new(0, 1 << 5, 0, 0));
        let cpu = CpuX86::detect(&src);
        assert!(cpu.hw_avx2);
        assert_eq!(set_flags(&cpu, 7), vec!["AVX2"]);
        assert!(!cpu.hw_avx512_bf16);
    }

    #[test]
    fn test_leaf7_subleaf1_bf16() {
        let src = SyntheticCpu::new()
            .with_leaf(7, 0, CpuidResult::default())
            .with_leaf(7, 1, CpuidResult::new(1 << 5, 0, 0, 0));
        let cpu = CpuX86::detect(&src);
        assert_eq!(set_flags(&cpu, 7), vec!["AVX512-BF16"]);
    }

    #[test]
    fn test_every_row_decodes_its_own_bit() {
        for fb in FEATURE_BITS {
            let mut words = [0u32; 4];
            words[fb.reg as usize] = 1 << fb.bit;
            let [eax, ebx, ecx, edx] = words;
            let src = SyntheticCpu::new().with_leaf(fb.leaf, fb.subleaf, CpuidResult::new(eax, ebx, ecx, edx));
            let cpu = CpuX86::detect(&src);
            let set: Vec<_> = FEATURE_BITS.iter().filter(|o| o.get(&cpu)).map(|o| o.name).collect();
            assert_eq!(set, vec![fb.name]);
        }
    }

    #[test]
    fn test_unsupported_leaves_not_queried() {
        let src = SyntheticCpu::new()
            .with_leaf(7, 0, CpuidResult::new(0, u32::MAX, u32::MAX, u32::MAX))
            .with_leaf(0x8000_0001, 0, CpuidResult::new(0, 0, u32::MAX, u32::MAX))
            .with_max_leaf(1)
            .with_max_ext_leaf(0x8000_0000);
        let cpu = CpuX86::detect(&src);

        assert!(!src.queried().iter().any(|&(leaf, _)| leaf == 7 || leaf == 0x8000_0001));
        assert!(!cpu.hw_avx2 && !cpu.hw_avx512_f && !cpu.hw_x64 && !cpu.hw_fma4);
    }

    #[test]
    fn test_os_avx_requires_osxsave_and_avx() {
        // AVX bit without OSXSAVE: XCR0 must not be consulted.
        let src = SyntheticCpu::new()
            .with_xcr0(0xe7)
            .with_leaf(1, 0, CpuidResult::new(0, 0, 1 << 28, 0));
        let cpu = CpuX86::detect(&src);
        assert!(cpu.hw_avx);
        assert!(!cpu.os_avx && !cpu.os_avx512);
        assert_eq!(src.xgetbv_calls(), 0);

        // Both bits, but the OS only saves SSE state.
        let src = SyntheticCpu::new()
            .with_xcr0(0x3)
            .with_leaf(1, 0, CpuidResult::new(0, 0, (1 << 27) | (1 << 28), 0));
        let cpu = CpuX86::detect(&src);
        assert!(!cpu.os_avx && !cpu.os_avx512);
        assert!(!cpu.safe_avx());
    }

    #[test]
    fn test_os_avx_without_avx512_state() {
        let src = skylake_x().with_xcr0(0x7);
        let cpu = CpuX86::detect(&src);
        assert!(cpu.hw_avx512_f);
        assert!(cpu.os_avx);
        assert!(!cpu.os_avx512);
        assert!(cpu.safe_avx());
        assert!(!cpu.safe_avx512());
    }

    #[test]
    fn test_skylake_x() {
        let cpu = CpuX86::detect(&skylake_x());

        assert!(cpu.vendor_intel && !cpu.vendor_amd);
        assert!(cpu.os_x64 && cpu.os_avx && cpu.os_avx512);
        assert!(cpu.hw_mmx && cpu.hw_sse && cpu.hw_sse2 && cpu.hw_sse3 && cpu.hw_ssse3);
        assert!(cpu.hw_sse41 && cpu.hw_sse42 && cpu.hw_aes && cpu.hw_avx && cpu.hw_fma3);
        assert!(cpu.hw_rdrand && cpu.hw_avx2 && cpu.hw_bmi1 && cpu.hw_bmi2 && cpu.hw_adx);
        assert!(cpu.hw_avx512_f && cpu.hw_avx512_cd && cpu.hw_avx512_vl);
        assert!(cpu.hw_avx512_bw && cpu.hw_avx512_dq && cpu.hw_avx512_vnni);
        assert!(cpu.hw_x64 && cpu.hw_abm && cpu.hw_prefetchw);
        assert!(!cpu.hw_sse4a && !cpu.hw_xop && !cpu.hw_fma4);
        assert!(!cpu.hw_sha && !cpu.hw_avx512_ifma && !cpu.hw_avx512_vbmi);
        assert!(!cpu.hw_avx512_bf16 && !cpu.hw_avx512_pf && !cpu.hw_avx512_er);
        assert!(cpu.safe_avx() && cpu.safe_avx512());
    }

    #[test]
    fn test_detect_is_repeatable() {
        let src = skylake_x();
        assert_eq!(CpuX86::detect(&src), CpuX86::detect(&src));
    }

    #[test]
    fn test_feature_leaves_cover_table() {
        for fb in FEATURE_BITS {
            assert!(FEATURE_LEAVES.contains(&(fb.leaf, fb.subleaf)), "{}", fb.name);
        }
    }

    #[test]
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    fn test_host_matches_std_detection() {
        let cpu = CpuX86::detect(&crate::cpuid::HostCpuid);
        assert_eq!(cpu.hw_sse2, is_x86_feature_detected!("sse2"));
        assert_eq!(cpu.hw_ssse3, is_x86_feature_detected!("ssse3"));
        assert_eq!(cpu.hw_sse42, is_x86_feature_detected!("sse4.2"));
        // std folds the OS check into its AVX answers.
        assert_eq!(cpu.safe_avx(), is_x86_feature_detected!("avx"));
        assert_eq!(cpu.safe_avx512(), is_x86_feature_detected!("avx512f"));
        assert!(cpu.vendor_string().len() == 12 || cpu.vendor_string().is_empty());
    }
}
