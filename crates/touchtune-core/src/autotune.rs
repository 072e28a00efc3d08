//! AutoTune Module
//!
//! Derives per-electrode touch/release thresholds from measured noise.
//!
//! The procedure:
//! - force a recalibration and wait for it to settle
//! - query status and measure noise as |baseline - filtered| per enabled electrode
//! - scale noise into a threshold pair inside fixed bounds
//! - ask the caller for confirmation, then apply electrode by electrode
//!
//! Application is not atomic. Each electrode succeeds or fails on its own and a
//! partially applied result is a normal outcome.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::protocol::{Command, Connection, ProtocolError, Transport};
use crate::touch::{ElectrodeId, ElectrodeThreshold, TouchStatus};

/// Bounds used when turning noise into thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoTuneLimits {
    /// Lowest touch threshold ever suggested
    pub min_touch: u32,
    /// Highest touch threshold ever suggested
    pub max_touch: u32,
    /// Lowest release threshold ever suggested
    pub min_release: u32,
    /// Highest release threshold ever suggested
    pub max_release: u32,
}

impl Default for AutoTuneLimits {
    fn default() -> Self {
        Self {
            min_touch: 3,
            max_touch: 30,
            min_release: 1,
            max_release: 15,
        }
    }
}

/// Recommended thresholds for one electrode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdSuggestion {
    /// Electrode the suggestion is for
    pub electrode: ElectrodeId,
    /// Suggested touch threshold
    pub touch: u8,
    /// Suggested release threshold
    pub release: u8,
    /// Measured |baseline - filtered|
    pub noise: u32,
}

impl ThresholdSuggestion {
    /// Suggested thresholds as a validated pair
    pub fn threshold(&self) -> Result<ElectrodeThreshold, ProtocolError> {
        Ok(ElectrodeThreshold::new(self.touch, self.release)?)
    }
}

/// Threshold pair for a given noise level
pub fn thresholds_for_noise(noise: u32, limits: &AutoTuneLimits) -> (u8, u8) {
    let touch = noise
        .saturating_mul(2)
        .saturating_add(5)
        .max(limits.min_touch)
        .min(limits.max_touch);
    let release = noise
        .saturating_add(2)
        .max(limits.min_release)
        .min(limits.max_release);
    (
        touch.min(u8::MAX as u32) as u8,
        release.min(u8::MAX as u32) as u8,
    )
}

/// One suggestion per enabled electrode, in ascending electrode order
pub fn suggest_thresholds(status: &TouchStatus) -> Vec<ThresholdSuggestion> {
    suggest_thresholds_with(status, &AutoTuneLimits::default())
}

/// Same as [`suggest_thresholds`] with custom bounds
pub fn suggest_thresholds_with(
    status: &TouchStatus,
    limits: &AutoTuneLimits,
) -> Vec<ThresholdSuggestion> {
    status
        .enabled_electrodes()
        .map(|(electrode, reading)| {
            let noise = reading.noise();
            let (touch, release) = thresholds_for_noise(noise, limits);
            ThresholdSuggestion {
                electrode,
                touch,
                release,
                noise,
            }
        })
        .collect()
}

/// Per-electrode result of applying suggestions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoTuneReport {
    /// Electrodes the device acknowledged
    pub applied: Vec<ElectrodeId>,
    /// Electrodes that were rejected or failed, with the reason
    pub failed: Vec<(ElectrodeId, String)>,
}

impl AutoTuneReport {
    /// Number of electrodes that were attempted
    pub fn attempted(&self) -> usize {
        self.applied.len() + self.failed.len()
    }

    /// Whether every attempted electrode was applied
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// How an auto-tune run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoTuneOutcome {
    /// The caller declined; nothing was written
    Cancelled(Vec<ThresholdSuggestion>),
    /// Suggestions were applied (possibly only partly)
    Applied {
        suggestions: Vec<ThresholdSuggestion>,
        report: AutoTuneReport,
    },
}

/// Drives the calibrate → measure → suggest → apply cycle
#[derive(Debug, Clone, Default)]
pub struct AutoTuner {
    limits: AutoTuneLimits,
    settle: Option<Duration>,
}

impl AutoTuner {
    /// Auto-tuner with default bounds and the connection's auto-tune settle time
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom threshold bounds
    pub fn with_limits(mut self, limits: AutoTuneLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Override the wait after calibration
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = Some(settle);
        self
    }

    /// Recalibrate and return a fresh status.
    ///
    /// Fails with [`ProtocolError::NotAcknowledged`] if the device does not
    /// confirm the calibration.
    pub fn measure<T: Transport>(
        &self,
        conn: &mut Connection<T>,
    ) -> Result<TouchStatus, ProtocolError> {
        let settle = self
            .settle
            .unwrap_or_else(|| Duration::from_millis(conn.timing().autotune_settle_ms));
        info!("AutoTune: forcing calibration, keep hands off the wheel");
        if !conn.force_calibration_with_settle(settle)? {
            return Err(ProtocolError::NotAcknowledged(
                Command::ForceCalibration.wire_form(),
            ));
        }
        conn.query_status()
    }

    /// Compute suggestions for a status snapshot
    pub fn suggest(&self, status: &TouchStatus) -> Vec<ThresholdSuggestion> {
        suggest_thresholds_with(status, &self.limits)
    }

    /// Apply suggestions one electrode at a time.
    ///
    /// A failure on one electrode does not stop the others.
    pub fn apply<T: Transport>(
        &self,
        conn: &mut Connection<T>,
        suggestions: &[ThresholdSuggestion],
    ) -> AutoTuneReport {
        let mut report = AutoTuneReport::default();
        for suggestion in suggestions {
            let result = suggestion
                .threshold()
                .and_then(|threshold| conn.apply_threshold(suggestion.electrode, threshold));
            match result {
                Ok(true) => report.applied.push(suggestion.electrode),
                Ok(false) => {
                    warn!(
                        "AutoTune: electrode {} rejected thresholds {}/{}",
                        suggestion.electrode, suggestion.touch, suggestion.release
                    );
                    report
                        .failed
                        .push((suggestion.electrode, "not acknowledged".to_string()));
                }
                Err(e) => {
                    warn!("AutoTune: electrode {} failed: {}", suggestion.electrode, e);
                    report.failed.push((suggestion.electrode, e.to_string()));
                }
            }
        }
        info!(
            "AutoTune completed: {}/{} electrodes configured",
            report.applied.len(),
            report.attempted()
        );
        report
    }

    /// Run the full cycle. `confirm` sees the suggestions and returns `true`
    /// to apply them.
    pub fn run<T, F>(
        &self,
        conn: &mut Connection<T>,
        confirm: F,
    ) -> Result<AutoTuneOutcome, ProtocolError>
    where
        T: Transport,
        F: FnOnce(&[ThresholdSuggestion]) -> bool,
    {
        let status = self.measure(conn)?;
        let suggestions = self.suggest(&status);

        if !confirm(&suggestions) {
            info!("AutoTune cancelled");
            return Ok(AutoTuneOutcome::Cancelled(suggestions));
        }

        let report = self.apply(conn, &suggestions);
        Ok(AutoTuneOutcome::Applied {
            suggestions,
            report,
        })
    }
}
