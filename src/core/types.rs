// address-space primitives shared by every part of the engine
use serde::Serialize;

use crate::core::error::OverlayError;

/// A target address.
pub type Address = u64;

/// Identifier of a single overlay group on the target.
pub type GroupId = u32;

/// Half-open address range, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressRange {
    start: Address,
    end: Address,
}

impl AddressRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: Address, end: Address) -> Result<Self, OverlayError> {
        if start > end {
            return Err(OverlayError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First address within the range.
    pub fn start(&self) -> Address {
        self.start
    }

    /// First address past the end of the range.
    pub fn end(&self) -> Address {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// One active relocation: logical range `[src, src + len)` is currently
/// resident at `dst`. Never mutated after creation; the whole set is
/// discarded and rebuilt on every refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub src: Address,
    pub dst: Address,
    pub len: u64,
}

impl Mapping {
    pub fn new(src: Address, dst: Address, len: u64) -> Self {
        Self { src, dst, len }
    }
}

/// One multi-group: several distinct functions sharing a physical overlay
/// slot. `base`/`len` describe the primary function; each alternate address
/// opens a window of the same `len` in alternate space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiGroupDesc {
    /// Primary address for the function in this multi-group.
    pub base: Address,

    /// Length of the primary function.
    pub len: u64,

    /// Alternative addresses for the function, in discovery order.
    pub alt_addrs: Vec<Address>,
}

impl MultiGroupDesc {
    /// True when `addr` lies within the primary range `[base, base + len)`.
    pub fn contains_primary(&self, addr: Address) -> bool {
        addr >= self.base && addr < self.base + self.len
    }
}

/// Answer to the "is multi-group compiled in?" query. `Unknown` means the
/// policy cannot tell yet and must be asked again; the other two answers are
/// definitive and may be cached for the life of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiGroupSupport {
    Unknown,
    Disabled,
    Enabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_rejects_inverted_bounds() {
        let err = AddressRange::new(0x2000, 0x1000).unwrap_err();
        assert!(matches!(
            err,
            OverlayError::InvalidRange { start: 0x2000, end: 0x1000 }
        ));
    }

    #[test]
    fn range_is_half_open() {
        let r = AddressRange::new(0x1000, 0x1400).unwrap();
        assert!(r.contains(0x1000));
        assert!(r.contains(0x13ff));
        assert!(!r.contains(0x1400));
        assert_eq!(r.len(), 0x400);
    }

    #[test]
    fn empty_range_contains_nothing() {
        let r = AddressRange::new(0x1000, 0x1000).unwrap();
        assert!(r.is_empty());
        assert!(!r.contains(0x1000));
    }

    #[test]
    fn primary_range_check_uses_own_length() {
        let desc = MultiGroupDesc {
            base: 0x4000,
            len: 0x100,
            alt_addrs: vec![0x8000],
        };
        assert!(desc.contains_primary(0x4000));
        assert!(desc.contains_primary(0x40ff));
        assert!(!desc.contains_primary(0x4100));
        // alternate addresses are not part of the primary range
        assert!(!desc.contains_primary(0x8000));
    }
}
