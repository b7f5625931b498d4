//! Device state ingest — applies a [`Reported`] delta to a [`DeviceModel`].
//!
//! Fields are processed in a fixed order: identity, maps, region echoes,
//! switch creation, attributes, then mission phase and battery. Absent
//! fields never clear anything. Applying the same delta twice leaves every
//! dirty flag as the first application left it.

use crate::delta::{LastCommand, Reported};
use crate::device::replace_if_changed;
use crate::entity::{ErrorSource, HubEntity, VacuumStatus};
use crate::error::ValidationError;
use crate::id::{MapId, RegionId};
use crate::model::DeviceModel;
use crate::topology::{MapUpsert, Region, RegionKind};

/// Outcome of one [`DeviceModel::apply`] call, for the caller to log and act
/// upon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Command topics of switches created by this delta.
    pub created_switches: Vec<String>,
    pub maps_created: usize,
    pub regions_changed: usize,
    /// Map id of a region echo that referenced an unknown map.
    pub orphan_map: Option<MapId>,
    /// Regions dropped because of an unknown type tag, as `(id, tag)`.
    pub skipped_regions: Vec<(String, String)>,
    /// Phase that is not part of the phase table.
    pub unknown_phase: Option<String>,
}

impl IngestReport {
    /// Whether the topology registry changed.
    #[must_use]
    pub fn topology_changed(&self) -> bool {
        self.maps_created > 0 || self.regions_changed > 0
    }
}

impl DeviceModel {
    /// Apply a delta reported by the robot.
    pub fn apply(&mut self, reported: &Reported) -> IngestReport {
        let mut report = IngestReport::default();
        self.apply_identity(reported);
        self.apply_maps(reported, &mut report);
        if let Some(last) = &reported.last_command {
            self.apply_last_command(last, &mut report);
        }
        report.created_switches = self.register_missing_switches();
        self.apply_attributes(reported);
        self.apply_mission(reported, &mut report);
        report
    }

    fn apply_identity(&mut self, reported: &Reported) {
        let mut changed = false;
        if let Some(name) = &reported.name {
            changed |= replace_if_changed(&mut self.device.name, name);
        }
        if let Some(sku) = &reported.sku {
            changed |= replace_if_changed(&mut self.device.model, sku);
        }
        if let Some(version) = &reported.software_ver {
            changed |= replace_if_changed(&mut self.device.sw_version, version);
        }
        if changed {
            self.vacuum.rename(&self.device.name);
            self.vacuum.core_mut().mark_config_dirty();
        }
    }

    fn apply_maps(&mut self, reported: &Reported, report: &mut IngestReport) {
        let Some(pmaps) = &reported.pmaps else {
            return;
        };
        for (id, name) in pmaps.iter().flatten() {
            if self.topology.upsert_map(MapId::new(id.as_str()), name) == MapUpsert::Created {
                report.maps_created += 1;
            }
        }
        self.refresh_map_count();
    }

    fn apply_last_command(&mut self, last: &LastCommand, report: &mut IngestReport) {
        let Some(pmap_id) = last.pmap_id.as_deref().filter(|id| !id.is_empty()) else {
            return;
        };
        let mut regions = Vec::with_capacity(last.regions.len());
        for region in &last.regions {
            match RegionKind::from_tag(&region.region_type) {
                Some(kind) => regions.push(Region {
                    id: RegionId::new(region.region_id.as_str()),
                    kind,
                }),
                None => report
                    .skipped_regions
                    .push((region.region_id.clone(), region.region_type.clone())),
            }
        }
        match self.topology.upsert_regions(&MapId::new(pmap_id), regions) {
            Ok(changed) => report.regions_changed += changed,
            Err(ValidationError::UnknownMap(map_id)) => report.orphan_map = Some(map_id),
            Err(_) => {}
        }
    }

    fn apply_attributes(&mut self, reported: &Reported) {
        let vacuum = &mut self.vacuum;
        if let Some(bin) = &reported.bin {
            if let Some(present) = bin.present {
                vacuum.core_mut().set_attribute("bin_present", present);
                vacuum.set_error(ErrorSource::BinAbsent, !present);
            }
            if let Some(full) = bin.full {
                vacuum.core_mut().set_attribute("bin_full", full);
            }
        }
        if let Some(level) = reported.tank_level {
            vacuum.core_mut().set_attribute("tank_level", level);
            vacuum.set_error(ErrorSource::TankEmpty, level == 0);
        }
        if let Some(open) = reported.lid_open {
            vacuum.core_mut().set_attribute("lid_open", open);
            vacuum.set_error(ErrorSource::LidOpen, open);
        }
        if let Some(present) = reported.tank_present {
            vacuum.core_mut().set_attribute("tank_present", present);
            vacuum.set_error(ErrorSource::TankAbsent, !present);
        }
        if let Some(pad) = &reported.detected_pad {
            vacuum.core_mut().set_attribute("pad", pad.as_str());
            vacuum.set_error(ErrorSource::PadInvalid, pad == "invalid");
        }
    }

    fn apply_mission(&mut self, reported: &Reported, report: &mut IngestReport) {
        let phase = reported
            .clean_mission_status
            .as_ref()
            .and_then(|s| s.phase.as_deref());
        if let Some(phase) = phase {
            match VacuumStatus::from_phase(phase) {
                Some(status) => self.vacuum.set_phase_status(status),
                None => report.unknown_phase = Some(phase.to_string()),
            }
        }
        if let Some(level) = reported.battery_percent {
            self.vacuum.set_battery_level(level);
        }
    }
}
