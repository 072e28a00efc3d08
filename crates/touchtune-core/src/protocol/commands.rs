//! Protocol commands
//!
//! Defines the line commands understood by the touch controller firmware.

use std::fmt;

use crate::touch::{ElectrodeId, ElectrodeThreshold, SensitivityLevel};

/// Commands sent to the touch controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Query touch status ('T')
    QueryStatus,

    /// Force baseline recalibration ('C')
    ForceCalibration,

    /// Restore default touch configuration ('R')
    Reset,

    /// Set the global sensitivity level ('S<level>')
    SetSensitivity(SensitivityLevel),

    /// Set custom thresholds for one electrode ('E<id>,<touch>,<release>')
    SetThreshold {
        /// Target electrode
        electrode: ElectrodeId,
        /// New threshold pair
        threshold: ElectrodeThreshold,
    },
}

impl Command {
    /// Text sent on the wire, without the line terminator
    pub fn wire_form(&self) -> String {
        match self {
            Command::QueryStatus => "T".to_string(),
            Command::ForceCalibration => "C".to_string(),
            Command::Reset => "R".to_string(),
            Command::SetSensitivity(level) => format!("S{}", level.value()),
            Command::SetThreshold {
                electrode,
                threshold,
            } => format!(
                "E{},{},{}",
                electrode.index(),
                threshold.touch(),
                threshold.release()
            ),
        }
    }

    /// Convert command to bytes, appending newline for transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.wire_form().into_bytes();
        bytes.push(b'\n');
        bytes
    }

    /// Keyword whose presence in the response acknowledges this command
    pub fn ack_keyword(&self) -> Option<&'static str> {
        match self {
            Command::QueryStatus => None,
            Command::ForceCalibration => Some("calibration"),
            Command::Reset => Some("reset"),
            Command::SetSensitivity(_) => Some("sensitivity changed"),
            Command::SetThreshold { .. } => Some("threshold set"),
        }
    }

    /// Check whether `response` acknowledges this command.
    ///
    /// Commands without an ack keyword are acknowledged by any non-empty response.
    pub fn is_acknowledged<S: AsRef<str>>(&self, response: &[S]) -> bool {
        match self.ack_keyword() {
            Some(keyword) => contains_keyword(response, keyword),
            None => !response.is_empty(),
        }
    }

    /// Whether this command invalidates previously read baselines
    pub fn changes_baseline(&self) -> bool {
        matches!(self, Command::ForceCalibration | Command::Reset)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire_form())
    }
}

/// Case-insensitive keyword search across all response lines
pub fn contains_keyword<S: AsRef<str>>(response: &[S], keyword: &str) -> bool {
    let joined = response
        .iter()
        .map(|line| line.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();
    joined.contains(&keyword.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_forms() {
        assert_eq!(Command::QueryStatus.wire_form(), "T");
        assert_eq!(Command::ForceCalibration.wire_form(), "C");
        assert_eq!(Command::Reset.wire_form(), "R");
        assert_eq!(
            Command::SetSensitivity(SensitivityLevel::new(4).unwrap()).wire_form(),
            "S4"
        );
        let cmd = Command::SetThreshold {
            electrode: ElectrodeId::new(11).unwrap(),
            threshold: ElectrodeThreshold::new(12, 6).unwrap(),
        };
        assert_eq!(cmd.wire_form(), "E11,12,6");
    }

    #[test]
    fn test_to_bytes() {
        assert_eq!(Command::QueryStatus.to_bytes(), b"T\n".to_vec());
    }

    #[test]
    fn test_ack_is_case_insensitive() {
        let cmd = Command::SetSensitivity(SensitivityLevel::default());
        assert!(cmd.is_acknowledged(&["Touch Sensitivity CHANGED to level 3 (Medium)"]));
        assert!(!cmd.is_acknowledged(&["Invalid sensitivity level"]));
        let empty: [&str; 0] = [];
        assert!(!cmd.is_acknowledged(&empty));
    }

    #[test]
    fn test_ack_keyword_may_span_any_line() {
        assert!(Command::ForceCalibration
            .is_acknowledged(&["ok", "Baseline calibration started", "done"]));
        assert!(Command::Reset.is_acknowledged(&["Touch configuration RESET to defaults"]));
        assert!(!Command::Reset.is_acknowledged(&["Unknown command"]));
    }

    #[test]
    fn test_threshold_ack_requires_singular_phrase() {
        let cmd = Command::SetThreshold {
            electrode: ElectrodeId::new(0).unwrap(),
            threshold: ElectrodeThreshold::new(8, 4).unwrap(),
        };
        assert!(cmd.is_acknowledged(&["Electrode 0 threshold set: touch=8, release=4"]));
        assert!(!cmd.is_acknowledged(&["Electrode 0 thresholds set: touch=8, release=4"]));
    }

    #[test]
    fn test_query_status_ack() {
        assert!(Command::QueryStatus.is_acknowledged(&["Global Level: 3"]));
        assert!(!Command::QueryStatus.changes_baseline());
        assert!(Command::ForceCalibration.changes_baseline());
    }
}
