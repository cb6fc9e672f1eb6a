//! Read-only status snapshot of a manager, for display or serialization by
//! the surrounding session layer.

use std::fmt;

use serde::Serialize;

use crate::core::manager::OverlayManager;
use crate::core::types::{AddressRange, Mapping, MultiGroupDesc};

/// Snapshot of everything the manager currently knows: configured regions,
/// the mappings from the last completed refresh, the loaded multi-groups,
/// and the cached enable flag (`None` while still undetermined).
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub storage_regions: Option<Vec<AddressRange>>,
    pub cache_regions: Option<Vec<AddressRange>>,
    pub mappings: Vec<Mapping>,
    pub multi_groups: Vec<MultiGroupDesc>,
    pub multi_group_enabled: Option<bool>,
}

impl StatusReport {
    pub fn capture(manager: &OverlayManager) -> Self {
        Self {
            storage_regions: manager.regions().storage_regions().map(<[_]>::to_vec),
            cache_regions: manager.regions().cache_regions().map(<[_]>::to_vec),
            mappings: manager.mappings().to_vec(),
            multi_groups: manager.multi_groups().to_vec(),
            multi_group_enabled: manager.cached_multi_group_enabled(),
        }
    }
}

impl OverlayManager {
    pub fn status_report(&self) -> StatusReport {
        StatusReport::capture(self)
    }
}

fn write_region_rows(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    regions: &Option<Vec<AddressRange>>,
) -> fmt::Result {
    match regions {
        None => writeln!(f, "  {label:<9}not configured"),
        Some(ranges) => {
            for r in ranges {
                writeln!(
                    f,
                    "  {label:<9}{:<12}{:<12}{:<8}",
                    format!("{:#x}", r.start()),
                    format!("{:#x}", r.end()),
                    format!("{:#x}", r.len()),
                )?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overlay regions:")?;
        writeln!(f, "  {:<9}{:<12}{:<12}{:<8}", "Region", "Start", "End", "Size")?;
        write_region_rows(f, "storage", &self.storage_regions)?;
        write_region_rows(f, "cache", &self.cache_regions)?;

        writeln!(f)?;
        writeln!(f, "Current overlay mappings:")?;
        if self.mappings.is_empty() {
            writeln!(f, "  No overlay groups are currently mapped.")?;
        } else {
            writeln!(
                f,
                "  {:<12}{:<12}{:<8}",
                "Storage", "Cache", "Size"
            )?;
            for m in &self.mappings {
                writeln!(
                    f,
                    "  {:<12}{:<12}{:<8}",
                    format!("{:#x}", m.src),
                    format!("{:#x}", m.dst),
                    format!("{:#x}", m.len),
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Overlay multi-groups:")?;
        match self.multi_group_enabled {
            Some(false) => writeln!(f, "  Not supported by this target.")?,
            _ if self.multi_groups.is_empty() => writeln!(f, "  None loaded.")?,
            _ => {
                writeln!(
                    f,
                    "  {:<12}{:<12}{:<8}{}",
                    "Base", "End", "Size", "Alternates"
                )?;
                for g in &self.multi_groups {
                    let alts = g
                        .alt_addrs
                        .iter()
                        .map(|a| format!("{a:#x}"))
                        .collect::<Vec<_>>()
                        .join(" ");
                    writeln!(
                        f,
                        "  {:<12}{:<12}{:<8}{alts}",
                        format!("{:#x}", g.base),
                        format!("{:#x}", g.base + g.len),
                        format!("{:#x}", g.len),
                    )?;
                }
            }
        }

        Ok(())
    }
}
