pub mod core;
pub mod policy;
pub mod report;

pub use crate::core::error::OverlayError;
pub use crate::core::inventory::MappingInventory;
pub use crate::core::manager::{ManagerSlot, OverlayManager};
pub use crate::core::multigroup::MultiGroupTable;
pub use crate::core::regions::RegionTracker;
pub use crate::core::types::{
    Address, AddressRange, GroupId, Mapping, MultiGroupDesc, MultiGroupSupport,
};
pub use crate::policy::{
    ExecutionScope, FunctionBounds, MappingSink, NullScope, OverlayPolicy, PolicyError,
    RegionData,
};
pub use crate::report::StatusReport;
