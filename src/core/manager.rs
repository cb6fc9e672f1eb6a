// facade tying the engine together around a user-supplied policy
use log::{debug, warn};

use crate::core::error::OverlayError;
use crate::core::inventory::MappingInventory;
use crate::core::multigroup::MultiGroupTable;
use crate::core::regions::RegionTracker;
use crate::core::types::{
    Address, AddressRange, GroupId, Mapping, MultiGroupDesc, MultiGroupSupport,
};
use crate::policy::{ExecutionScope, FunctionBounds, MappingSink, NullScope, OverlayPolicy, ScopeGuard};

/// Debugger-visible overlay manager: orchestrates mapping refreshes,
/// multi-group resolution, and the optional per-group queries, delegating
/// discovery to an [`OverlayPolicy`] and function-boundary lookups to a
/// [`FunctionBounds`] service.
///
/// Every call into the policy is bracketed by the [`ExecutionScope`], so a
/// policy backed by a scripting runtime always runs inside an established
/// context, including on error paths.
pub struct OverlayManager {
    policy: Box<dyn OverlayPolicy>,
    bounds: Box<dyn FunctionBounds>,
    scope: Box<dyn ExecutionScope>,
    regions: RegionTracker,
    inventory: MappingInventory,
    multi_groups: MultiGroupTable,

    /// Definitive answer to the enable query, once one has arrived.
    multi_group_enabled: Option<bool>,

    /// Whether the host should re-read mappings when the event symbol hits.
    reload_on_event: bool,
}

impl OverlayManager {
    pub fn new(
        policy: Box<dyn OverlayPolicy>,
        bounds: Box<dyn FunctionBounds>,
        reload_on_event: bool,
    ) -> Self {
        Self::with_scope(policy, bounds, Box::new(NullScope), reload_on_event)
    }

    pub fn with_scope(
        policy: Box<dyn OverlayPolicy>,
        bounds: Box<dyn FunctionBounds>,
        scope: Box<dyn ExecutionScope>,
        reload_on_event: bool,
    ) -> Self {
        Self {
            policy,
            bounds,
            scope,
            regions: RegionTracker::new(),
            inventory: MappingInventory::new(),
            multi_groups: MultiGroupTable::new(),
            multi_group_enabled: None,
            reload_on_event,
        }
    }

    pub fn reload_on_event(&self) -> bool {
        self.reload_on_event
    }

    /// Replace the tracked storage region(s) wholesale.
    pub fn set_storage_regions(&mut self, ranges: Vec<AddressRange>) {
        self.regions.set_storage_regions(ranges);
    }

    /// Replace the tracked cache region(s) wholesale.
    pub fn set_cache_regions(&mut self, ranges: Vec<AddressRange>) {
        self.regions.set_cache_regions(ranges);
    }

    pub fn regions(&self) -> &RegionTracker {
        &self.regions
    }

    /// Pull the region layout from the policy and install it. A policy with
    /// no region information yet leaves the tracker untouched.
    pub fn load_region_data(&mut self) -> Result<(), OverlayError> {
        let _ctx = ScopeGuard::enter(self.scope.as_ref());

        debug!("loading region data from policy");
        if let Some(data) = self.policy.region_data()? {
            self.regions.set_storage_regions(data.storage);
            self.regions.set_cache_regions(data.cache);
        }
        Ok(())
    }

    /// Name of the symbol whose execution should trigger a refresh; empty
    /// when no automatic trigger is configured.
    pub fn event_symbol_name(&self) -> String {
        let _ctx = ScopeGuard::enter(self.scope.as_ref());

        self.policy.event_symbol_name().unwrap_or_default()
    }

    /// Rebuild the mapping inventory from the policy and return the result.
    /// A discovery failure is recoverable: the inventory is presented as
    /// empty rather than exposing a partial list.
    pub fn refresh_mappings(&mut self) -> &[Mapping] {
        debug!("refreshing overlay mappings");
        self.inventory.begin_refresh();

        let _ctx = ScopeGuard::enter(self.scope.as_ref());
        let outcome = self
            .policy
            .read_mappings(&mut MappingSink::new(&mut self.inventory));
        let success = match outcome {
            Ok(()) => true,
            Err(err) => {
                warn!("reading overlay mappings failed: {err}");
                false
            }
        };

        self.inventory.end_refresh(success);
        self.inventory.mappings()
    }

    /// Mappings from the last completed refresh.
    pub fn mappings(&self) -> &[Mapping] {
        self.inventory.mappings()
    }

    /// Whether the target has any multi-groups, loading the table on the
    /// first definitive answer. A malformed topology aborts with a fatal
    /// error and leaves the table incomplete for this instance's lifetime.
    pub fn has_multi_groups(&mut self) -> Result<bool, OverlayError> {
        if !self.multi_groups.is_loaded() {
            let _ctx = ScopeGuard::enter(self.scope.as_ref());
            self.multi_groups
                .ensure_loaded(self.policy.as_mut(), self.bounds.as_ref())?;
        }
        Ok(self.multi_groups.has_groups())
    }

    /// Loaded multi-group descriptors.
    pub fn multi_groups(&self) -> &[MultiGroupDesc] {
        self.multi_groups.groups()
    }

    /// Alternates and in-range offset for the multi-group whose primary
    /// range contains `addr`, if any. Operates on the table as currently
    /// loaded; see [`OverlayManager::has_multi_groups`].
    pub fn find_multi_group(&self, addr: Address) -> Option<(&[Address], u64)> {
        self.multi_groups.find_group(addr)
    }

    /// Canonical (primary) equivalent of `addr`; identity for addresses
    /// outside every multi-group.
    pub fn map_to_primary(&self, addr: Address) -> Address {
        self.multi_groups.map_to_primary(addr)
    }

    /// Whether multi-group support is compiled into the target runtime.
    /// An `Unknown` answer is reported as `false` but re-queried on the
    /// next call; a definitive answer is cached for good.
    pub fn is_multi_group_enabled(&mut self) -> Result<bool, OverlayError> {
        if let Some(enabled) = self.multi_group_enabled {
            return Ok(enabled);
        }

        let _ctx = ScopeGuard::enter(self.scope.as_ref());
        let answer = match self.policy.multi_group_support()? {
            MultiGroupSupport::Unknown => return Ok(false),
            MultiGroupSupport::Disabled => false,
            MultiGroupSupport::Enabled => true,
        };
        self.multi_group_enabled = Some(answer);
        Ok(answer)
    }

    /// Size in bytes of overlay group `id`, queried per call because some
    /// targets relocate groups between stops. Zero when the policy does not
    /// support the query.
    pub fn group_size(&mut self, id: GroupId) -> Result<u64, OverlayError> {
        let _ctx = ScopeGuard::enter(self.scope.as_ref());
        Ok(self.policy.group_size(id)?.unwrap_or(0))
    }

    /// Storage-area base address of overlay group `id`, uncached like
    /// [`OverlayManager::group_size`]. Zero when unsupported.
    pub fn group_base_address(&mut self, id: GroupId) -> Result<Address, OverlayError> {
        let _ctx = ScopeGuard::enter(self.scope.as_ref());
        Ok(self.policy.group_base_address(id)?.unwrap_or(0))
    }

    /// Raw token at `index` in the target's multi-group table. Zero when
    /// unsupported.
    pub fn multi_group_token(&mut self, index: u32) -> Result<Address, OverlayError> {
        let _ctx = ScopeGuard::enter(self.scope.as_ref());
        Ok(self.policy.multi_group_token(index)?.unwrap_or(0))
    }

    pub(crate) fn cached_multi_group_enabled(&self) -> Option<bool> {
        self.multi_group_enabled
    }
}

/// Explicit install point for the single active manager. The surrounding
/// session layer owns one of these; there is no implicit process global.
#[derive(Default)]
pub struct ManagerSlot {
    active: Option<OverlayManager>,
}

impl ManagerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a manager, returning the one it displaced, if any.
    pub fn install(&mut self, manager: OverlayManager) -> Option<OverlayManager> {
        self.active.replace(manager)
    }

    /// Remove and return the active manager.
    pub fn uninstall(&mut self) -> Option<OverlayManager> {
        self.active.take()
    }

    pub fn is_installed(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&OverlayManager> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut OverlayManager> {
        self.active.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{FunctionBounds, OverlayPolicy};

    struct NoBounds;

    impl FunctionBounds for NoBounds {
        fn resolve(&self, _addr: Address) -> Option<(Address, Address)> {
            None
        }
    }

    struct Inert;

    impl OverlayPolicy for Inert {}

    fn mk_manager() -> OverlayManager {
        OverlayManager::new(Box::new(Inert), Box::new(NoBounds), true)
    }

    #[test]
    fn neutral_policy_yields_neutral_answers() {
        let mut mgr = mk_manager();

        assert!(mgr.refresh_mappings().is_empty());
        assert_eq!(mgr.event_symbol_name(), "");
        assert!(!mgr.has_multi_groups().unwrap());
        assert_eq!(mgr.group_size(7).unwrap(), 0);
        assert_eq!(mgr.group_base_address(7).unwrap(), 0);
        assert_eq!(mgr.multi_group_token(0).unwrap(), 0);
        assert_eq!(mgr.map_to_primary(0x1234), 0x1234);
        assert!(mgr.find_multi_group(0x1234).is_none());
        assert!(mgr.reload_on_event());
    }

    #[test]
    fn unknown_support_is_false_but_not_cached() {
        let mut mgr = mk_manager();

        assert!(!mgr.is_multi_group_enabled().unwrap());
        assert_eq!(mgr.cached_multi_group_enabled(), None);
    }

    #[test]
    fn slot_install_displaces_and_uninstall_empties() {
        let mut slot = ManagerSlot::new();
        assert!(!slot.is_installed());

        assert!(slot.install(mk_manager()).is_none());
        assert!(slot.is_installed());

        // a second install hands back the first manager
        assert!(slot.install(mk_manager()).is_some());

        assert!(slot.uninstall().is_some());
        assert!(!slot.is_installed());
        assert!(slot.active().is_none());
    }
}
