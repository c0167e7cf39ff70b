use sysinfo::{DiskKind, Disks};

use crate::core::telemetry::metrics::{DiskSample, DriveType, ProviderError, SampleResult};
use crate::core::telemetry::provider::MetricProvider;

/// Space usage of one named volume (a drive letter on Windows, a mount
/// point elsewhere).
pub struct DiskProvider {
    volume: String,
}

impl DiskProvider {
    pub fn new(volume: &str) -> Self {
        Self {
            volume: volume.trim().to_string(),
        }
    }
}

/// `"C"`, `"c:"` and `"C:\"` all select the `C:\` mount point; anything
/// else must match the mount point exactly.
pub fn matches_volume(mount_point: &str, volume: &str) -> bool {
    let letter = volume.trim_end_matches(['\\', '/']).trim_end_matches(':');
    if letter.len() == 1 && letter.chars().all(|c| c.is_ascii_alphabetic()) {
        let mount = mount_point.trim_end_matches(['\\', '/']);
        return mount.eq_ignore_ascii_case(&format!("{}:", letter));
    }
    mount_point == volume
}

fn drive_type(kind: DiskKind, removable: bool) -> DriveType {
    if removable {
        return DriveType::Removable;
    }
    match kind {
        DiskKind::HDD | DiskKind::SSD => DriveType::Fixed,
        DiskKind::Unknown(_) => DriveType::Unknown,
    }
}

impl MetricProvider for DiskProvider {
    type Sample = DiskSample;

    fn name(&self) -> &'static str {
        "disk"
    }

    fn sample(&self) -> SampleResult<DiskSample> {
        let disks = Disks::new_with_refreshed_list();

        let disk = disks
            .iter()
            .find(|d| matches_volume(&d.mount_point().to_string_lossy(), &self.volume))
            .ok_or_else(|| ProviderError::unavailable(format!("volume {} not mounted", self.volume)))?;

        let total = disk.total_space();
        Ok(DiskSample {
            volume_label: disk.name().to_string_lossy().to_string(),
            total_bytes: total,
            free_bytes: disk.available_space().min(total),
            format: disk.file_system().to_string_lossy().to_string(),
            drive_type: drive_type(disk.kind(), disk.is_removable()),
        })
    }
}
