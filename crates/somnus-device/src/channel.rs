//! Sensor channels of a monitoring device.

use serde::{Deserialize, Serialize};

/// One of the two independent sensor lines of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorChannel {
    /// Airway pressure sensor.
    Pressure,
    /// Breathing sound sensor.
    Sound,
}

impl SensorChannel {
    /// Both channels, in protocol order (pressure is always driven first).
    pub const ALL: [SensorChannel; 2] = [SensorChannel::Pressure, SensorChannel::Sound];

    /// Stable lowercase name used in logs and scripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorChannel::Pressure => "pressure",
            SensorChannel::Sound => "sound",
        }
    }
}

impl std::fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_display() {
        assert_eq!(SensorChannel::Pressure.to_string(), "pressure");
        assert_eq!(SensorChannel::Sound.to_string(), "sound");
    }

    #[test]
    fn protocol_order_starts_with_pressure() {
        assert_eq!(SensorChannel::ALL[0], SensorChannel::Pressure);
        assert_eq!(SensorChannel::ALL[1], SensorChannel::Sound);
    }

    #[test]
    fn channel_serde_uses_lowercase() {
        let json = serde_json::to_string(&SensorChannel::Sound).unwrap();
        assert_eq!(json, "\"sound\"");
        let back: SensorChannel = serde_json::from_str("\"pressure\"").unwrap();
        assert_eq!(back, SensorChannel::Pressure);
    }
}
