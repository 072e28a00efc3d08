//! Demo Mode - Simulated touch controller
//!
//! Answers the line protocol the same way the firmware does, so the tools can
//! be exercised without hardware. Readings jitter around a per-electrode
//! baseline by a configurable noise amplitude.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use crate::protocol::{ProtocolError, Transport};
use crate::touch::{ElectrodeId, ElectrodeThreshold, SensitivityLevel, ELECTRODE_COUNT};

/// Baselines outside this window get an electrode disabled on calibration
const HEALTHY_BASELINE: std::ops::RangeInclusive<u32> = 50..=1000;

#[derive(Debug, Clone)]
struct SimElectrode {
    enabled: bool,
    baseline: u32,
    noise: u32,
    threshold: ElectrodeThreshold,
    reject_thresholds: bool,
}

/// In-process stand-in for the touch controller
pub struct SimulatedController {
    rng: StdRng,
    level: SensitivityLevel,
    custom_per_pad: bool,
    electrodes: Vec<SimElectrode>,
    input: Vec<u8>,
    pending: VecDeque<String>,
    received: Vec<String>,
    silent: bool,
}

impl Default for SimulatedController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedController {
    /// Create a controller with random jitter
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a controller with reproducible jitter
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let level = SensitivityLevel::default();
        let electrodes = ElectrodeId::all()
            .map(|id| SimElectrode {
                enabled: true,
                baseline: if id.is_small_pad() {
                    180
                } else {
                    400 + id.index() as u32 * 20
                },
                noise: 2,
                threshold: level.thresholds_for(id),
                reject_thresholds: false,
            })
            .collect();

        Self {
            rng,
            level,
            custom_per_pad: false,
            electrodes,
            input: Vec::new(),
            pending: VecDeque::new(),
            received: Vec::new(),
            silent: false,
        }
    }

    fn electrode_mut(&mut self, id: ElectrodeId) -> &mut SimElectrode {
        &mut self.electrodes[id.index() as usize]
    }

    /// Set the noise amplitude of one electrode
    pub fn set_noise(&mut self, id: ElectrodeId, noise: u32) -> &mut Self {
        self.electrode_mut(id).noise = noise;
        self
    }

    /// Set the noise amplitude of every electrode
    pub fn set_noise_all(&mut self, noise: u32) -> &mut Self {
        for electrode in &mut self.electrodes {
            electrode.noise = noise;
        }
        self
    }

    /// Set the baseline of one electrode
    pub fn set_baseline(&mut self, id: ElectrodeId, baseline: u32) -> &mut Self {
        self.electrode_mut(id).baseline = baseline;
        self
    }

    /// Enable or disable one electrode
    pub fn set_enabled(&mut self, id: ElectrodeId, enabled: bool) -> &mut Self {
        self.electrode_mut(id).enabled = enabled;
        self
    }

    /// Make the device refuse threshold changes for one electrode
    pub fn reject_thresholds(&mut self, id: ElectrodeId) -> &mut Self {
        self.electrode_mut(id).reject_thresholds = true;
        self
    }

    /// Stop answering anything
    pub fn set_silent(&mut self, silent: bool) -> &mut Self {
        self.silent = silent;
        self
    }

    /// Current global level
    pub fn level(&self) -> SensitivityLevel {
        self.level
    }

    /// Whether per-pad thresholds have been customized since the last reset
    pub fn has_custom_thresholds(&self) -> bool {
        self.custom_per_pad
    }

    /// Thresholds currently active on `id`
    pub fn threshold(&self, id: ElectrodeId) -> ElectrodeThreshold {
        self.electrodes[id.index() as usize].threshold
    }

    /// Every command line received so far
    pub fn received(&self) -> &[String] {
        &self.received
    }

    fn reply(&mut self, line: impl Into<String>) {
        self.pending.push_back(line.into());
    }

    fn apply_level(&mut self, level: SensitivityLevel) {
        self.level = level;
        for id in ElectrodeId::all() {
            self.electrode_mut(id).threshold = level.thresholds_for(id);
        }
    }

    fn handle_line(&mut self, line: &str) {
        debug!("SimulatedController: received '{}'", line);
        self.received.push(line.to_string());
        if self.silent {
            return;
        }

        match line.chars().next() {
            Some('T') if line.len() == 1 => self.print_status(),
            Some('C') if line.len() == 1 => self.calibrate(),
            Some('R') if line.len() == 1 => self.reset(),
            Some('S') => self.set_level(&line[1..]),
            Some('E') => self.set_threshold(&line[1..]),
            _ => self.reply(format!("Unknown command: {}", line)),
        }
    }

    fn print_status(&mut self) {
        self.reply("=== Touch Sensitivity Status ===");
        self.reply(format!(
            "Global Level: {} ({})",
            self.level,
            self.level.name()
        ));
        let custom = if self.custom_per_pad { "Enabled" } else { "Disabled" };
        self.reply(format!("Custom Per-Pad: {}", custom));
        self.reply("Electrode Status:");

        for index in 0..ELECTRODE_COUNT as usize {
            let electrode = self.electrodes[index].clone();
            let jitter = if electrode.noise == 0 {
                0
            } else {
                self.rng
                    .gen_range(-(electrode.noise as i64)..=electrode.noise as i64)
            };
            let filtered = (electrode.baseline as i64 + jitter).max(0) as u32;
            let delta = electrode.baseline.saturating_sub(filtered);
            let touched = electrode.enabled && delta >= electrode.threshold.touch() as u32;
            self.reply(format!(
                "Electrode {}: {} {} {} {} {}",
                index,
                if electrode.enabled { "Y" } else { "N" },
                electrode.baseline,
                filtered,
                delta,
                if touched { "Y" } else { "N" }
            ));
        }
        self.reply("================================");
    }

    fn calibrate(&mut self) {
        self.reply("Performing baseline calibration...");
        for index in 0..ELECTRODE_COUNT as usize {
            if !self.electrodes[index].enabled {
                continue;
            }
            let drift: i64 = self.rng.gen_range(-2..=2);
            let electrode = &mut self.electrodes[index];
            electrode.baseline = (electrode.baseline as i64 + drift).max(0) as u32;
            if !HEALTHY_BASELINE.contains(&electrode.baseline) {
                electrode.enabled = false;
                self.pending.push_back(format!(
                    "Electrode {} disabled due to poor baseline reading",
                    index
                ));
            }
        }
        self.reply("Baseline calibration completed");
    }

    fn reset(&mut self) {
        self.custom_per_pad = false;
        self.apply_level(SensitivityLevel::default());
        self.reply("Touch configuration reset to defaults");
    }

    fn set_level(&mut self, arg: &str) {
        match arg.trim().parse::<i64>().map(SensitivityLevel::new) {
            Ok(Ok(level)) => {
                self.apply_level(level);
                self.reply(format!(
                    "Touch sensitivity changed to level {} ({})",
                    level,
                    level.name()
                ));
            }
            _ => self.reply(format!("Invalid sensitivity level: {}", arg)),
        }
    }

    fn set_threshold(&mut self, args: &str) {
        let values: Vec<Option<i64>> = args
            .split(',')
            .map(|v| v.trim().parse::<i64>().ok())
            .collect();
        let parsed = match values.as_slice() {
            [Some(id), Some(touch), Some(release)] => ElectrodeId::new(*id)
                .and_then(|id| ElectrodeThreshold::new(*touch, *release).map(|t| (id, t)))
                .ok(),
            _ => None,
        };

        let Some((id, threshold)) = parsed else {
            self.reply(format!("Invalid electrode threshold: {}", args));
            return;
        };

        if self.electrodes[id.index() as usize].reject_thresholds {
            self.reply(format!("Electrode {} threshold rejected", id));
            return;
        }

        self.electrode_mut(id).threshold = threshold;
        self.custom_per_pad = true;
        self.reply(format!(
            "Electrode {} threshold set: touch={}, release={}",
            id,
            threshold.touch(),
            threshold.release()
        ));
    }
}

impl Transport for SimulatedController {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.input.extend_from_slice(bytes);
        while let Some(pos) = self.input.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.input.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                self.handle_line(&line);
            }
        }
        Ok(())
    }

    fn drain_lines(&mut self, _timeout: Duration) -> Result<Vec<String>, ProtocolError> {
        Ok(self.pending.drain(..).collect())
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        self.pending.clear();
        Ok(())
    }
}
