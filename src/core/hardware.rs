//! Hardware Detection Module
//! The capability snapshot and the CPUID bit layout it is decoded from.

use std::borrow::Cow;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::cpuid::{Register, LEAF_EXT_FEATURES, LEAF_FEATURES, LEAF_STRUCTURED_EXT};

pub const VENDOR_INTEL: &[u8; 12] = b"GenuineIntel";
pub const VENDOR_AMD: &[u8; 12] = b"AuthenticAMD";

/// The 12-byte vendor identification string from leaf 0.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct VendorId(pub [u8; 12]);

impl VendorId {
    /// Leaf 0 spells the string across EBX, EDX, ECX, in that order.
    pub fn from_words(ebx: u32, edx: u32, ecx: u32) -> Self {
        Self(bytemuck::cast([ebx, edx, ecx]))
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        String::from_utf8_lossy(&self.0[..end])
    }
}

impl fmt::Debug for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl Serialize for VendorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

/// Everything the detector knows about the host.
///
/// Starts all-false; [`CpuX86::detect`] fills it in. `os_*` flags say the OS
/// saves and restores the register state, `hw_*` flags say the silicon has
/// the instructions. Only the combination makes an extension usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CpuX86 {
    pub vendor: VendorId,

    //  Vendor
    pub vendor_amd: bool,
    pub vendor_intel: bool,

    //  OS Features
    pub os_x64: bool,
    pub os_avx: bool,
    pub os_avx512: bool,

    //  Misc.
    pub hw_mmx: bool,
    pub hw_x64: bool,
    pub hw_abm: bool,
    pub hw_rdrand: bool,
    pub hw_rdseed: bool,
    pub hw_bmi1: bool,
    pub hw_bmi2: bool,
    pub hw_adx: bool,
    pub hw_mpx: bool,
    pub hw_prefetchw: bool,
    pub hw_prefetchwt1: bool,
    pub hw_rdpid: bool,

    //  SIMD: 128-bit
    pub hw_sse: bool,
    pub hw_sse2: bool,
    pub hw_sse3: bool,
    pub hw_ssse3: bool,
    pub hw_sse41: bool,
    pub hw_sse42: bool,
    pub hw_sse4a: bool,
    pub hw_aes: bool,
    pub hw_sha: bool,

    //  SIMD: 256-bit
    pub hw_avx: bool,
    pub hw_xop: bool,
    pub hw_fma3: bool,
    pub hw_fma4: bool,
    pub hw_avx2: bool,

    //  SIMD: 512-bit
    pub hw_avx512_f: bool,
    pub hw_avx512_cd: bool,

    //  Knights Landing
    pub hw_avx512_pf: bool,
    pub hw_avx512_er: bool,

    //  Skylake Purley
    pub hw_avx512_vl: bool,
    pub hw_avx512_bw: bool,
    pub hw_avx512_dq: bool,

    //  Cannon Lake
    pub hw_avx512_ifma: bool,
    pub hw_avx512_vbmi: bool,

    //  Knights Mill
    pub hw_avx512_vpopcntdq: bool,
    pub hw_avx512_4vnniw: bool,
    pub hw_avx512_4fmaps: bool,

    //  Cascade Lake
    pub hw_avx512_vnni: bool,

    //  Cooper Lake
    pub hw_avx512_bf16: bool,

    //  Ice Lake
    pub hw_avx512_vbmi2: bool,
    pub hw_gfni: bool,
    pub hw_vaes: bool,
    pub hw_avx512_vpclmul: bool,
    pub hw_avx512_bitalg: bool,
}

impl CpuX86 {
    pub fn vendor_string(&self) -> Cow<'_, str> {
        self.vendor.as_str()
    }

    /// AVX instructions present and YMM state saved by the OS.
    pub fn safe_avx(&self) -> bool {
        self.hw_avx && self.os_avx
    }

    /// AVX-512 Foundation present and opmask/ZMM state saved by the OS.
    pub fn safe_avx512(&self) -> bool {
        self.hw_avx512_f && self.os_avx512
    }
}

/// Report section a hardware flag is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Misc,
    Simd128,
    Simd256,
    Simd512,
}

impl Group {
    pub const ALL: [Group; 4] = [Group::Misc, Group::Simd128, Group::Simd256, Group::Simd512];

    pub fn title(self) -> &'static str {
        match self {
            Group::Misc => "Hardware Features",
            Group::Simd128 => "SIMD: 128-bit",
            Group::Simd256 => "SIMD: 256-bit",
            Group::Simd512 => "SIMD: 512-bit",
        }
    }
}

/// One row of the decode table: `field = (word(reg) & (1 << bit)) != 0`
/// for the result of `cpuid(leaf, subleaf)`.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBit {
    pub leaf: u32,
    pub subleaf: u32,
    pub reg: Register,
    pub bit: u8,
    pub name: &'static str,
    pub group: Group,
    pub read: fn(&CpuX86) -> bool,
    pub field: fn(&mut CpuX86) -> &mut bool,
}

impl FeatureBit {
    pub fn get(&self, cpu: &CpuX86) -> bool {
        (self.read)(cpu)
    }

    pub fn set(&self, cpu: &mut CpuX86, value: bool) {
        *(self.field)(cpu) = value;
    }
}

macro_rules! feature_bits {
    ($( $leaf:expr, $sub:expr, $reg:ident[$bit:expr] => $field:ident, $name:expr, $group:ident; )*) => {
        &[$(
            FeatureBit {
                leaf: $leaf,
                subleaf: $sub,
                reg: Register::$reg,
                bit: $bit,
                name: $name,
                group: Group::$group,
                read: |c| c.$field,
                field: |c| &mut c.$field,
            },
        )*]
    };
}

const L1: u32 = LEAF_FEATURES;
const L7: u32 = LEAF_STRUCTURED_EXT;
const LX: u32 = LEAF_EXT_FEATURES;

/// Every hardware flag and the single bit it is read from, in report order.
pub static FEATURE_BITS: &[FeatureBit] = feature_bits! {
    L1, 0, Edx[23] => hw_mmx,              "MMX",              Misc;
    LX, 0, Edx[29] => hw_x64,              "x64",              Misc;
    LX, 0, Ecx[5]  => hw_abm,              "ABM",              Misc;
    L1, 0, Ecx[30] => hw_rdrand,           "RDRAND",           Misc;
    L7, 0, Ebx[18] => hw_rdseed,           "RDSEED",           Misc;
    L7, 0, Ebx[3]  => hw_bmi1,             "BMI1",             Misc;
    L7, 0, Ebx[8]  => hw_bmi2,             "BMI2",             Misc;
    L7, 0, Ebx[19] => hw_adx,              "ADX",              Misc;
    L7, 0, Ebx[14] => hw_mpx,              "MPX",              Misc;
    LX, 0, Ecx[8]  => hw_prefetchw,        "PREFETCHW",        Misc;
    L7, 0, Ecx[0]  => hw_prefetchwt1,      "PREFETCHWT1",      Misc;
    L7, 0, Ecx[22] => hw_rdpid,            "RDPID",            Misc;
    L7, 0, Ecx[8]  => hw_gfni,             "GFNI",             Misc;
    L7, 0, Ecx[9]  => hw_vaes,             "VAES",             Misc;

    L1, 0, Edx[25] => hw_sse,              "SSE",              Simd128;
    L1, 0, Edx[26] => hw_sse2,             "SSE2",             Simd128;
    L1, 0, Ecx[0]  => hw_sse3,             "SSE3",             Simd128;
    L1, 0, Ecx[9]  => hw_ssse3,            "SSSE3",            Simd128;
    LX, 0, Ecx[6]  => hw_sse4a,            "SSE4a",            Simd128;
    L1, 0, Ecx[19] => hw_sse41,            "SSE4.1",           Simd128;
    L1, 0, Ecx[20] => hw_sse42,            "SSE4.2",           Simd128;
    L1, 0, Ecx[25] => hw_aes,              "AES-NI",           Simd128;
    L7, 0, Ebx[29] => hw_sha,              "SHA",              Simd128;

    L1, 0, Ecx[28] => hw_avx,              "AVX",              Simd256;
    LX, 0, Ecx[11] => hw_xop,              "XOP",              Simd256;
    L1, 0, Ecx[12] => hw_fma3,             "FMA3",             Simd256;
    LX, 0, Ecx[16] => hw_fma4,             "FMA4",             Simd256;
    L7, 0, Ebx[5]  => hw_avx2,             "AVX2",             Simd256;

    L7, 0, Ebx[16] => hw_avx512_f,         "AVX512-F",         Simd512;
    L7, 0, Ebx[28] => hw_avx512_cd,        "AVX512-CD",        Simd512;
    L7, 0, Ebx[26] => hw_avx512_pf,        "AVX512-PF",        Simd512;
    L7, 0, Ebx[27] => hw_avx512_er,        "AVX512-ER",        Simd512;
    L7, 0, Ebx[31] => hw_avx512_vl,        "AVX512-VL",        Simd512;
    L7, 0, Ebx[30] => hw_avx512_bw,        "AVX512-BW",        Simd512;
    L7, 0, Ebx[17] => hw_avx512_dq,        "AVX512-DQ",        Simd512;
    L7, 0, Ebx[21] => hw_avx512_ifma,      "AVX512-IFMA",      Simd512;
    L7, 0, Ecx[1]  => hw_avx512_vbmi,      "AVX512-VBMI",      Simd512;
    L7, 0, Ecx[14] => hw_avx512_vpopcntdq, "AVX512-VPOPCNTDQ", Simd512;
    L7, 0, Edx[2]  => hw_avx512_4vnniw,    "AVX512-4VNNIW",    Simd512;
    L7, 0, Edx[3]  => hw_avx512_4fmaps,    "AVX512-4FMAPS",    Simd512;
    L7, 0, Ecx[6]  => hw_avx512_vbmi2,     "AVX512-VBMI2",     Simd512;
    L7, 0, Ecx[10] => hw_avx512_vpclmul,   "AVX512-VPCLMUL",   Simd512;
    L7, 0, Ecx[11] => hw_avx512_vnni,      "AVX512-VNNI",      Simd512;
    L7, 0, Ecx[12] => hw_avx512_bitalg,    "AVX512-BITALG",    Simd512;
    L7, 1, Eax[5]  => hw_avx512_bf16,      "AVX512-BF16",      Simd512;
};
