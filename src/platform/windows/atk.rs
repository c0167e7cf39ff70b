use crate::core::telemetry::fan::{FanChannel, FanStatusReader};
use crate::error::{MonError, Result};

#[cfg(windows)]
use serde::Deserialize;

#[cfg(windows)]
use super::core::run_powershell_json;

#[cfg(windows)]
#[derive(Deserialize, Debug)]
struct DstsResult {
    device_status: u32,
}

/// Reads fan status words through the ASUS ATK WMI `DSTS` method.
#[derive(Debug, Default)]
pub struct AtkFanReader;

impl AtkFanReader {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(any(windows, test))]
fn dsts_command(device_id: u32) -> String {
    format!(
        "Get-CimInstance -Namespace root/WMI -ClassName AsusAtkWmi_WMNB | \
         Invoke-CimMethod -MethodName DSTS -Arguments @{{Device_ID={}}} | \
         Select-Object device_status | ConvertTo-Json",
        device_id
    )
}

impl FanStatusReader for AtkFanReader {
    #[cfg(windows)]
    fn read_status(&self, channel: FanChannel) -> Result<u32> {
        let result: DstsResult = run_powershell_json(&dsts_command(channel.device_id()))
            .map_err(|e| MonError::metric_collection(format!("ATK DSTS {:?}: {}", channel, e)))?;
        Ok(result.device_status)
    }

    #[cfg(not(windows))]
    fn read_status(&self, _channel: FanChannel) -> Result<u32> {
        Err(MonError::metric_collection("ATK WMI is only available on Windows"))
    }
}
