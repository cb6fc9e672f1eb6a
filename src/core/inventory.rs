// refresh-window protocol for the active mapping list
use log::debug;

use crate::core::types::{Address, Mapping};

/// Ordered collection of active relocations, rebuilt wholesale on every
/// refresh cycle:
/// 1. `begin_refresh` opens a window (discarding any stale one),
/// 2. `add_mapping` appends entries one at a time while the window is open,
/// 3. `end_refresh` commits on success or clears everything on failure.
///
/// The cycle is repeatable indefinitely. A discovery failure degrades to
/// "no active mappings" rather than exposing a partial list.
#[derive(Debug, Default)]
pub struct MappingInventory {
    /// Present only while a refresh window is open.
    pending: Option<Vec<Mapping>>,

    /// Mappings from the last completed refresh.
    current: Vec<Mapping>,
}

impl MappingInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh refresh window, discarding any prior one.
    pub fn begin_refresh(&mut self) {
        self.pending = Some(Vec::new());
    }

    /// Append one mapping to the open window. Outside a window this is a
    /// silent no-op: the discovery callback may legitimately fire from
    /// contexts where no refresh is active.
    pub fn add_mapping(&mut self, src: Address, dst: Address, len: u64) {
        match &mut self.pending {
            Some(window) => {
                debug!("add_mapping src={src:#x} dst={dst:#x} len={len:#x}");
                window.push(Mapping::new(src, dst, len));
            }
            None => {
                debug!("ignoring add_mapping outside a refresh window (src={src:#x})");
            }
        }
    }

    /// Close the window. On failure the inventory is presented as empty,
    /// regardless of how many entries were appended.
    pub fn end_refresh(&mut self, success: bool) {
        match self.pending.take() {
            Some(window) if success => self.current = window,
            _ => self.current.clear(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Mappings from the last completed refresh.
    pub fn mappings(&self) -> &[Mapping] {
        &self.current
    }
}
