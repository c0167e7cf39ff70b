//! Fan speed decoding for the ASUS ATK `DSTS` status word.
//!
//! The firmware reports fan speed as `0x0001XXXX`, where the high word is a
//! presence marker and `XXXX` is the speed in hundreds of RPM.

/// Presence marker subtracted from the reinterpreted status word.
pub const FAN_STATUS_BIAS: i64 = 0x0001_0000;

/// Anything above this is treated as "fan not present" garbage.
pub const MAX_PLAUSIBLE_RPM: i64 = 20_000;

/// ATK device channel that carries a fan status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FanChannel {
    Cpu,
    Gpu,
}

impl FanChannel {
    /// ATK `Device_ID` for this channel.
    pub fn device_id(self) -> u32 {
        match self {
            FanChannel::Cpu => 1114131, // 0x00110013
            FanChannel::Gpu => 1114132, // 0x00110014
        }
    }

    pub fn from_device_id(device_id: u32) -> Option<Self> {
        match device_id {
            1114131 => Some(FanChannel::Cpu),
            1114132 => Some(FanChannel::Gpu),
            _ => None,
        }
    }

    /// Turns a raw status word read from this channel into RPM.
    ///
    /// Pure and deterministic. Results that would be negative or implausibly
    /// large clamp to 0.
    pub fn decode(self, status_word: u32) -> u32 {
        let hex = format!("{:08x}", status_word);
        let reinterpreted = match i64::from_str_radix(&hex, 16) {
            Ok(value) => value,
            Err(_) => return 0,
        };

        let rpm = (reinterpreted - FAN_STATUS_BIAS) * 100;
        if !(0..=MAX_PLAUSIBLE_RPM).contains(&rpm) {
            log::trace!(
                "{:?} fan status {:#010x} decodes to {} rpm, clamping to 0",
                self,
                status_word,
                rpm
            );
            return 0;
        }

        rpm as u32
    }
}

/// Source of raw fan status words.
pub trait FanStatusReader: Send + Sync {
    fn read_status(&self, channel: FanChannel) -> crate::error::Result<u32>;
}

/// Reads and decodes a channel, yielding 0 on any failure.
pub fn read_fan_rpm(reader: &dyn FanStatusReader, channel: FanChannel) -> u32 {
    match reader.read_status(channel) {
        Ok(status) => channel.decode(status),
        Err(e) => {
            log::warn!("Failed to read {:?} fan status: {}", channel, e);
            0
        }
    }
}
