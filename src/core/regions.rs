// storage / cache region bookkeeping
use crate::core::types::AddressRange;

/// Tracks the storage region (the logical address space backing overlay
/// content) and the cache region (the physical resident window). `None`
/// means a region was never configured, which callers must distinguish from
/// an empty list of ranges.
#[derive(Debug, Default)]
pub struct RegionTracker {
    storage: Option<Vec<AddressRange>>,
    cache: Option<Vec<AddressRange>>,
}

impl RegionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the storage region(s) wholesale.
    pub fn set_storage_regions(&mut self, ranges: Vec<AddressRange>) {
        self.storage = Some(ranges);
    }

    /// Replace the cache region(s) wholesale.
    pub fn set_cache_regions(&mut self, ranges: Vec<AddressRange>) {
        self.cache = Some(ranges);
    }

    pub fn storage_regions(&self) -> Option<&[AddressRange]> {
        self.storage.as_deref()
    }

    pub fn cache_regions(&self) -> Option<&[AddressRange]> {
        self.cache.as_deref()
    }
}
