//! Configuration snapshots
//!
//! Saves the controller's sensitivity level and each electrode's enable flag
//! and baseline as pretty-printed JSON:
//!
//! ```json
//! {
//!   "sensitivity_level": 3,
//!   "electrodes": {
//!     "0": { "enabled": true, "baseline": 512 }
//!   }
//! }
//! ```
//!
//! Snapshots are write-only; nothing reads them back into the device.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

use crate::touch::{ElectrodeId, SensitivityLevel, TouchStatus};

/// Persisted state of one electrode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectrodeSnapshot {
    /// Whether the channel was active
    pub enabled: bool,
    /// Baseline at save time
    pub baseline: u32,
}

/// Persisted subset of a [`TouchStatus`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Global sensitivity level
    pub sensitivity_level: SensitivityLevel,
    /// One entry per electrode the device reported
    pub electrodes: BTreeMap<ElectrodeId, ElectrodeSnapshot>,
}

impl ConfigSnapshot {
    /// Capture the persisted fields of `status`
    pub fn from_status(status: &TouchStatus) -> Self {
        let electrodes = status
            .electrodes
            .iter()
            .map(|(id, reading)| {
                (
                    *id,
                    ElectrodeSnapshot {
                        enabled: reading.enabled,
                        baseline: reading.baseline,
                    },
                )
            })
            .collect();

        Self {
            sensitivity_level: status.sensitivity_level,
            electrodes,
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> io::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write the snapshot to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let content = self.to_json()?;
        fs::write(path, content)?;
        info!(
            "Configuration saved to {} ({} electrodes)",
            path.display(),
            self.electrodes.len()
        );
        Ok(())
    }
}

impl From<&TouchStatus> for ConfigSnapshot {
    fn from(status: &TouchStatus) -> Self {
        Self::from_status(status)
    }
}

/// Save the persisted fields of `status` to `path`
pub fn save_config<P: AsRef<Path>>(path: P, status: &TouchStatus) -> io::Result<()> {
    ConfigSnapshot::from_status(status).save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::ElectrodeReading;

    #[test]
    fn test_snapshot_excludes_runtime_fields() {
        let mut status = TouchStatus::default();
        status.electrodes.insert(
            ElectrodeId::new(5).unwrap(),
            ElectrodeReading {
                enabled: true,
                baseline: 640,
                filtered: 600,
                delta: 40,
                touched: true,
            },
        );
        let json = ConfigSnapshot::from_status(&status).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["sensitivity_level"], 3);
        assert_eq!(value["electrodes"]["5"]["enabled"], true);
        assert_eq!(value["electrodes"]["5"]["baseline"], 640);
        let electrode = value["electrodes"]["5"].as_object().unwrap();
        assert_eq!(electrode.len(), 2);
        assert!(!json.contains("filtered"));
        assert!(!json.contains("delta"));
    }

    #[test]
    fn test_empty_status() {
        let json = ConfigSnapshot::from_status(&TouchStatus::default())
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["electrodes"].as_object().unwrap().is_empty());
    }
}
