// multi-group topology: load once, then translate addresses both ways
use log::debug;

use crate::core::error::OverlayError;
use crate::core::types::{Address, MultiGroupDesc};
use crate::policy::{FunctionBounds, OverlayPolicy};

/// Lazily built table of multi-groups. The group count starts at the -1
/// sentinel; once the policy reports a real count (zero or more) the table
/// is populated and never rebuilt for the life of the manager instance. A
/// count of -1 from the policy means "not known yet" and leaves the table
/// unloaded so the next call asks again.
#[derive(Debug)]
pub struct MultiGroupTable {
    count: i64,
    groups: Vec<MultiGroupDesc>,
}

impl Default for MultiGroupTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiGroupTable {
    pub fn new() -> Self {
        Self {
            count: -1,
            groups: Vec::new(),
        }
    }

    /// True once a definitive group count has been recorded.
    pub fn is_loaded(&self) -> bool {
        self.count >= 0
    }

    /// Load the table if it has not been loaded yet.
    ///
    /// The first call with a definitive answer queries the policy for the
    /// group count, then for each group's ordered member addresses. The
    /// first member is the primary and must resolve, via function-boundary
    /// lookup, to a function starting exactly at the reported address;
    /// anything else means the target's group data is malformed and the
    /// load aborts. A failed load leaves whatever was committed so far and
    /// is not retried.
    pub fn ensure_loaded(
        &mut self,
        policy: &mut dyn OverlayPolicy,
        bounds: &dyn FunctionBounds,
    ) -> Result<(), OverlayError> {
        if self.count >= 0 {
            return Ok(());
        }

        self.count = policy.multi_group_count()?.max(-1);
        debug!("multi-group count: {}", self.count);

        for index in 0..self.count {
            let addrs = policy.multi_group(index)?;
            debug!("multi-group {index}: {} member(s)", addrs.len());

            let Some((&primary, alternates)) = addrs.split_first() else {
                return Err(OverlayError::EmptyMultiGroup { index });
            };

            let (start, end) = bounds
                .resolve(primary)
                .ok_or(OverlayError::UnknownFunctionBounds { addr: primary })?;
            if start != primary {
                return Err(OverlayError::NotFunctionStart {
                    addr: primary,
                    start,
                });
            }
            debug!("  primary {primary:#x} spans [{start:#x}, {end:#x})");

            self.groups.push(MultiGroupDesc {
                base: start,
                len: end - start,
                alt_addrs: alternates.to_vec(),
            });
        }

        Ok(())
    }

    pub fn has_groups(&self) -> bool {
        self.count > 0
    }

    pub fn groups(&self) -> &[MultiGroupDesc] {
        &self.groups
    }

    /// Find the multi-group whose primary range contains `addr`, returning
    /// its alternates and the offset of `addr` within the range. Most
    /// addresses are in no multi-group, which is a miss, not an error.
    pub fn find_group(&self, addr: Address) -> Option<(&[Address], u64)> {
        if self.count <= 0 {
            return None;
        }

        // group enumeration order is not address-sorted; scan them all
        self.groups
            .iter()
            .find(|g| g.contains_primary(addr))
            .map(|g| (g.alt_addrs.as_slice(), addr - g.base))
    }

    /// Translate `addr` to its canonical (primary) equivalent. An address
    /// already in a primary range is returned unchanged; an address within
    /// an alternate's window (the window size being the primary's length)
    /// is mapped to the same offset in the primary range. Addresses in no
    /// multi-group at all translate to themselves.
    pub fn map_to_primary(&self, addr: Address) -> Address {
        if self.count <= 0 {
            return addr;
        }

        for group in &self.groups {
            if group.contains_primary(addr) {
                return addr;
            }

            for &alt in &group.alt_addrs {
                if addr >= alt && addr < alt + group.len {
                    return group.base + (addr - alt);
                }
            }
        }

        addr
    }
}
