use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{CpuidResult, CpuidSource, LEAF_EXT_MAX, LEAF_VENDOR};

/// A made-up processor answering from a table of canned leaves.
///
/// Unknown leaves read as all zeroes. Every query is recorded so tests can
/// check which leaves the detector actually consulted.
#[derive(Debug, Default, Clone)]
pub struct SyntheticCpu {
    leaves: BTreeMap<(u32, u32), CpuidResult>,
    xcr0: u64,
    os_x64: bool,
    queried: RefCell<Vec<(u32, u32)>>,
    xgetbv_calls: Cell<usize>,
}

impl SyntheticCpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the 12-byte vendor string (EBX, EDX, ECX order).
    pub fn with_vendor(mut self, vendor: &[u8; 12]) -> Self {
        let [ebx, edx, ecx]: [u32; 3] = bytemuck::cast(*vendor);
        let entry = self.leaves.entry((LEAF_VENDOR, 0)).or_default();
        entry.ebx = ebx;
        entry.edx = edx;
        entry.ecx = ecx;
        self
    }

    /// Installs a leaf, raising the reported maximum leaf to cover it.
    pub fn with_leaf(mut self, leaf: u32, subleaf: u32, result: CpuidResult) -> Self {
        let max_selector = if leaf >= LEAF_EXT_MAX { LEAF_EXT_MAX } else { LEAF_VENDOR };
        if leaf != max_selector {
            let max = self.leaves.entry((max_selector, 0)).or_default();
            max.eax = max.eax.max(leaf);
        }
        self.leaves.insert((leaf, subleaf), result);
        self
    }

    /// Overrides the maximum standard leaf reported by leaf 0.
    pub fn with_max_leaf(mut self, max: u32) -> Self {
        self.leaves.entry((LEAF_VENDOR, 0)).or_default().eax = max;
        self
    }

    /// Overrides the maximum extended leaf reported by leaf 0x80000000.
    pub fn with_max_ext_leaf(mut self, max: u32) -> Self {
        self.leaves.entry((LEAF_EXT_MAX, 0)).or_default().eax = max;
        self
    }

    pub fn with_xcr0(mut self, xcr0: u64) -> Self {
        self.xcr0 = xcr0;
        self
    }

    pub fn with_os_x64(mut self, os_x64: bool) -> Self {
        self.os_x64 = os_x64;
        self
    }

    /// Every `(leaf, subleaf)` queried so far, in order.
    pub fn queried(&self) -> Vec<(u32, u32)> {
        self.queried.borrow().clone()
    }

    pub fn xgetbv_calls(&self) -> usize {
        self.xgetbv_calls.get()
    }
}

impl CpuidSource for SyntheticCpu {
    fn cpuid(&self, leaf: u32, subleaf: u32) -> CpuidResult {
        self.queried.borrow_mut().push((leaf, subleaf));
        self.leaves.get(&(leaf, subleaf)).copied().unwrap_or_default()
    }

    fn xgetbv(&self, _index: u32) -> u64 {
        self.xgetbv_calls.set(self.xgetbv_calls.get() + 1);
        self.xcr0
    }

    fn os_x64(&self) -> bool {
        self.os_x64
    }
}
