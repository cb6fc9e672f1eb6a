//! Collaborator seams the engine consumes but does not implement: the
//! user-overridable discovery policy, the function-boundary resolver, and
//! the execution context established around every call into policy code.

use thiserror::Error;

use crate::core::inventory::MappingInventory;
use crate::core::types::{Address, AddressRange, GroupId, MultiGroupSupport};

/// Failure reported by a policy override. Whether this is fatal depends on
/// the call site: a failed `read_mappings` degrades to an empty refresh,
/// while a failed topology query aborts the current request.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PolicyError {
    pub message: String,
}

impl PolicyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Region layout reported by the policy: the logical storage area overlays
/// are loaded from, and the physical cache window they are loaded into.
#[derive(Debug, Clone)]
pub struct RegionData {
    pub storage: Vec<AddressRange>,
    pub cache: Vec<AddressRange>,
}

/// Append-only handle over the mapping inventory, handed to the policy for
/// the duration of one `read_mappings` call. The policy reports mappings one
/// at a time and never owns the storage behind them.
pub struct MappingSink<'a> {
    inventory: &'a mut MappingInventory,
}

impl<'a> MappingSink<'a> {
    pub(crate) fn new(inventory: &'a mut MappingInventory) -> Self {
        Self { inventory }
    }

    /// Record one active mapping. Ignored if no refresh window is open.
    pub fn add_mapping(&mut self, src: Address, dst: Address, len: u64) {
        self.inventory.add_mapping(src, dst, len);
    }
}

/// Externally supplied mapping-discovery policy. Every method has a neutral
/// default, so a partial override only needs to supply what its target
/// actually supports; `Ok(None)` from the optional queries means
/// "unsupported" and is mapped to a sentinel by the manager.
pub trait OverlayPolicy {
    /// Name of the symbol whose execution should trigger a mapping refresh.
    /// `None` means no automatic trigger is configured.
    fn event_symbol_name(&self) -> Option<String> {
        None
    }

    /// Enumerate the currently active mappings through `sink`. An `Err`
    /// discards everything reported so far.
    fn read_mappings(&mut self, _sink: &mut MappingSink<'_>) -> Result<(), PolicyError> {
        Ok(())
    }

    /// Number of multi-groups, or -1 if the target is not far enough along
    /// to know yet (the engine will ask again later).
    fn multi_group_count(&mut self) -> Result<i64, PolicyError> {
        Ok(0)
    }

    /// Ordered member addresses of multi-group `index`; the first entry is
    /// the primary. A policy that reports a positive count must implement
    /// this, hence the failing default.
    fn multi_group(&mut self, index: i64) -> Result<Vec<Address>, PolicyError> {
        Err(PolicyError::new(format!(
            "no topology available for multi-group {index}"
        )))
    }

    /// Whether multi-group support is compiled into the target runtime.
    fn multi_group_support(&mut self) -> Result<MultiGroupSupport, PolicyError> {
        Ok(MultiGroupSupport::Unknown)
    }

    /// Size in bytes of overlay group `id`.
    fn group_size(&mut self, _id: GroupId) -> Result<Option<u64>, PolicyError> {
        Ok(None)
    }

    /// Storage-area base address of overlay group `id`.
    fn group_base_address(&mut self, _id: GroupId) -> Result<Option<Address>, PolicyError> {
        Ok(None)
    }

    /// Raw token at `index` in the target's multi-group table.
    fn multi_group_token(&mut self, _index: u32) -> Result<Option<Address>, PolicyError> {
        Ok(None)
    }

    /// Current region layout, or `None` if the policy has no region
    /// information yet.
    fn region_data(&mut self) -> Result<Option<RegionData>, PolicyError> {
        Ok(None)
    }
}

/// Function-boundary lookup: resolve an address to the half-open extent of
/// the enclosing function. An external symbol service, consumed here to
/// validate and delimit multi-group primaries.
pub trait FunctionBounds {
    fn resolve(&self, addr: Address) -> Option<(Address, Address)>;
}

/// Execution context required around calls into policy code. For a policy
/// backed by an embedded scripting runtime this is where the interpreter is
/// acquired and released; `exit` runs on every path out, error or not.
pub trait ExecutionScope {
    fn enter(&self) {}
    fn exit(&self) {}
}

/// Scope for policies that need no runtime entry.
#[derive(Debug, Default)]
pub struct NullScope;

impl ExecutionScope for NullScope {}

/// RAII wrapper: enters the scope on construction, exits on drop.
pub(crate) struct ScopeGuard<'a> {
    scope: &'a dyn ExecutionScope,
}

impl<'a> ScopeGuard<'a> {
    pub(crate) fn enter(scope: &'a dyn ExecutionScope) -> Self {
        scope.enter();
        Self { scope }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.scope.exit();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct CountingScope {
        enters: Cell<u32>,
        exits: Cell<u32>,
    }

    impl ExecutionScope for CountingScope {
        fn enter(&self) {
            self.enters.set(self.enters.get() + 1);
        }

        fn exit(&self) {
            self.exits.set(self.exits.get() + 1);
        }
    }

    #[test]
    fn scope_guard_exits_on_drop() {
        let scope = CountingScope {
            enters: Cell::new(0),
            exits: Cell::new(0),
        };

        {
            let _guard = ScopeGuard::enter(&scope);
            assert_eq!(scope.enters.get(), 1);
            assert_eq!(scope.exits.get(), 0);
        }

        assert_eq!(scope.exits.get(), 1);
    }

    #[test]
    fn scope_guard_exits_on_early_return() {
        let scope = CountingScope {
            enters: Cell::new(0),
            exits: Cell::new(0),
        };

        fn failing(scope: &CountingScope) -> Result<(), PolicyError> {
            let _guard = ScopeGuard::enter(scope);
            return Err(PolicyError::new("boom"));
        }

        assert!(failing(&scope).is_err());
        assert_eq!(scope.enters.get(), 1);
        assert_eq!(scope.exits.get(), 1);
    }

    #[test]
    fn default_policy_is_neutral() {
        struct Bare;
        impl OverlayPolicy for Bare {}

        let mut p = Bare;
        assert_eq!(p.event_symbol_name(), None);
        assert_eq!(p.multi_group_count().unwrap(), 0);
        assert_eq!(p.multi_group_support().unwrap(), MultiGroupSupport::Unknown);
        assert_eq!(p.group_size(3).unwrap(), None);
        assert_eq!(p.group_base_address(3).unwrap(), None);
        assert_eq!(p.multi_group_token(0).unwrap(), None);
        assert!(p.region_data().unwrap().is_none());
        // topology for a group that was never announced is malformed input
        assert!(p.multi_group(0).is_err());
    }
}
