//! Raw CPUID words behind a snapshot, for diagnosing mis-reports.

use serde::Serialize;

use super::detect::{leaf_supported, FEATURE_LEAVES};
use super::hardware::VendorId;
use super::xstate::XFeatures;
use crate::cpuid::{CpuidResult, CpuidSource, LEAF_EXT_MAX, LEAF_FEATURES, LEAF_VENDOR};

#[derive(Debug, Clone, Serialize)]
pub struct LeafDump {
    #[serde(serialize_with = "hex_leaf")]
    pub leaf: u32,
    pub subleaf: u32,
    #[serde(flatten)]
    pub result: CpuidResult,
}

fn hex_leaf<S: serde::Serializer>(leaf: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:#010x}", leaf))
}

/// The leaves and XCR0 value detection reads, and nothing else.
#[derive(Debug, Clone, Serialize)]
pub struct RawDump {
    pub vendor: VendorId,
    pub leaves: Vec<LeafDump>,
    pub xcr0: Option<XFeatures>,
}

impl RawDump {
    /// Queries the same leaves as [`CpuX86::detect`](super::hardware::CpuX86::detect),
    /// skipping any above the reported maximum.
    pub fn collect<S: CpuidSource + ?Sized>(cpu: &S) -> Self {
        let id = cpu.cpuid(LEAF_VENDOR, 0);
        let ext = cpu.cpuid(LEAF_EXT_MAX, 0);
        let (max_leaf, max_ext_leaf) = (id.eax, ext.eax);

        let mut leaves = vec![
            LeafDump { leaf: LEAF_VENDOR, subleaf: 0, result: id },
            LeafDump { leaf: LEAF_EXT_MAX, subleaf: 0, result: ext },
        ];
        for (leaf, subleaf) in FEATURE_LEAVES {
            if leaf_supported(leaf, max_leaf, max_ext_leaf) {
                leaves.push(LeafDump { leaf, subleaf, result: cpu.cpuid(leaf, subleaf) });
            }
        }

        Self {
            vendor: VendorId::from_words(id.ebx, id.edx, id.ecx),
            leaves,
            xcr0: XFeatures::read(cpu, &cpu.cpuid(LEAF_FEATURES, 0)),
        }
    }

    pub fn xcr0_raw(&self) -> Option<u64> {
        self.xcr0.map(|x| x.bits())
    }
}
