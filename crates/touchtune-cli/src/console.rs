//! User-facing tuning actions
//!
//! Each action talks to the device through a [`Connection`] and reports to
//! the user through a line-oriented input/output pair, so the same code
//! serves the one-shot flags, the interactive shell and the tests.

use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::debug;
use touchtune_core::autotune::{AutoTuneOutcome, AutoTuner, ThresholdSuggestion};
use touchtune_core::protocol::{Connection, Transport};
use touchtune_core::snapshot::save_config;
use touchtune_core::touch::{ElectrodeId, ElectrodeThreshold};

use crate::render;

/// Prompted input and printed output for one session
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print one line
    pub fn say(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", text.as_ref())
    }

    /// Print a prompt and read one trimmed line. `None` means end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let answer = self.ask(prompt)?;
        Ok(matches!(answer.as_deref(), Some(a) if a.eq_ignore_ascii_case("y")))
    }

    fn ask_number(&mut self, prompt: &str) -> io::Result<Option<i64>> {
        match self.ask(prompt)? {
            Some(text) => match text.parse::<i64>() {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    self.say("Error: Please enter valid numbers")?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub fn show_status<T: Transport>(&mut self, conn: &mut Connection<T>) -> Result<()> {
        let status = conn.query_status()?;
        self.say(render::status_table(&status))?;
        Ok(())
    }

    pub fn set_level<T: Transport>(&mut self, conn: &mut Connection<T>, level: u8) -> Result<()> {
        if conn.set_sensitivity_level(level)? {
            self.say(format!("✓ Sensitivity level set to {}", level))?;
        } else {
            self.say("✗ Failed to set sensitivity level")?;
        }
        Ok(())
    }

    pub fn calibrate<T: Transport>(&mut self, conn: &mut Connection<T>) -> Result<()> {
        self.say("Forcing calibration...")?;
        if conn.force_calibration()? {
            self.say("✓ Calibration started")?;
            self.show_status(conn)
        } else {
            self.say("✗ Failed to start calibration")?;
            Ok(())
        }
    }

    /// Prompt for an electrode and its thresholds, checking each answer as it
    /// is entered.
    pub fn set_threshold<T: Transport>(&mut self, conn: &mut Connection<T>) -> Result<()> {
        let Some(electrode) = self.ask_number("Enter electrode number (0-11): ")? else {
            return Ok(());
        };
        let electrode = match ElectrodeId::new(electrode) {
            Ok(id) => id,
            Err(e) => {
                self.say(format!("Error: {}", e))?;
                return Ok(());
            }
        };

        let Some(touch) = self.ask_number("Enter touch threshold (1-255): ")? else {
            return Ok(());
        };
        let Some(release) = self.ask_number("Enter release threshold (1-255): ")? else {
            return Ok(());
        };
        let threshold = match ElectrodeThreshold::new(touch, release) {
            Ok(threshold) => threshold,
            Err(e) => {
                self.say(format!("Error: {}", e))?;
                return Ok(());
            }
        };

        if conn.apply_threshold(electrode, threshold)? {
            self.say(format!(
                "✓ Electrode {} thresholds set: touch={}, release={}",
                electrode,
                threshold.touch(),
                threshold.release()
            ))?;
        } else {
            self.say("✗ Failed to set electrode thresholds")?;
        }
        Ok(())
    }

    fn review(&mut self, suggestions: &[ThresholdSuggestion]) -> io::Result<bool> {
        self.say("Analyzing electrode performance...")?;
        if suggestions.is_empty() {
            self.say("No enabled electrodes to tune")?;
            return Ok(false);
        }
        self.say(render::suggestions_table(suggestions))?;
        self.confirm("Apply these settings? (y/n): ")
    }

    pub fn auto_tune<T: Transport>(&mut self, conn: &mut Connection<T>) -> Result<()> {
        self.say("Starting auto-tune process...")?;
        self.say("Please don't touch the device during calibration...")?;

        let mut prompt_error = None;
        let outcome = AutoTuner::new().run(conn, |suggestions| {
            self.review(suggestions).unwrap_or_else(|e| {
                prompt_error = Some(e);
                false
            })
        })?;
        if let Some(e) = prompt_error {
            return Err(e.into());
        }

        match outcome {
            AutoTuneOutcome::Cancelled(_) => self.say("Auto-tune cancelled")?,
            AutoTuneOutcome::Applied {
                suggestions,
                report,
            } => {
                for electrode in &report.applied {
                    self.say(format!("✓ Applied settings for electrode {}", electrode))?;
                }
                for (electrode, reason) in &report.failed {
                    debug!("auto-tune: electrode {} failed: {}", electrode, reason);
                    self.say(format!(
                        "✗ Failed to apply settings for electrode {}",
                        electrode
                    ))?;
                }
                self.say(format!(
                    "Auto-tune completed: {}/{} electrodes configured",
                    report.applied.len(),
                    suggestions.len()
                ))?;
            }
        }
        Ok(())
    }

    pub fn reset<T: Transport>(&mut self, conn: &mut Connection<T>) -> Result<()> {
        if !self.confirm("Reset all touch settings to defaults? (y/n): ")? {
            return Ok(());
        }
        if conn.reset_to_defaults()? {
            self.say("✓ Touch configuration reset to defaults")?;
            self.show_status(conn)
        } else {
            self.say("✗ Failed to reset configuration")?;
            Ok(())
        }
    }

    pub fn save<T: Transport>(&mut self, conn: &mut Connection<T>, path: &Path) -> Result<()> {
        let status = conn.query_status()?;
        match save_config(path, &status) {
            Ok(()) => self.say(format!("✓ Configuration saved to {}", path.display()))?,
            Err(e) => self.say(format!("✗ Failed to save configuration: {}", e))?,
        }
        Ok(())
    }

    pub fn help(&mut self) -> Result<()> {
        self.say(render::help())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use touchtune_core::demo::SimulatedController;
    use touchtune_core::protocol::TimingConfig;

    fn sim_connection() -> Connection<SimulatedController> {
        let mut sim = SimulatedController::with_seed(11);
        sim.set_noise_all(0);
        Connection::with_transport(sim, TimingConfig::immediate())
    }

    type TestConsole<'a> = Console<&'a [u8], &'a mut Vec<u8>>;
    type SimConnection = Connection<SimulatedController>;

    fn run_with<F>(input: &str, f: F) -> (String, SimConnection)
    where
        F: FnOnce(&mut TestConsole<'_>, &mut SimConnection) -> Result<()>,
    {
        let mut conn = sim_connection();
        let mut out = Vec::new();
        let mut console = Console::new(input.as_bytes(), &mut out);
        f(&mut console, &mut conn).unwrap();
        drop(console);
        (String::from_utf8(out).unwrap(), conn)
    }

    #[test]
    fn test_set_threshold_prompts() {
        let (out, conn) = run_with("11\n9\n3\n", |c, conn| c.set_threshold(conn));
        assert!(out.contains("✓ Electrode 11 thresholds set: touch=9, release=3"));
        assert_eq!(conn.transport().received(), &["E11,9,3".to_string()]);
    }

    #[test]
    fn test_set_threshold_rejects_bad_answers_without_io() {
        for input in ["12\n", "x\n", "0\n8\n8\n", "0\n300\n4\n", ""] {
            let (_, conn) = run_with(input, |c, conn| c.set_threshold(conn));
            assert!(conn.transport().received().is_empty(), "input {:?}", input);
        }
    }

    #[test]
    fn test_auto_tune_confirmed() {
        let (out, conn) = run_with("y\n", |c, conn| c.auto_tune(conn));
        assert!(out.contains("Recommended thresholds:"));
        assert!(out.contains("Auto-tune completed: 12/12 electrodes configured"));
        assert!(conn.transport().has_custom_thresholds());
    }

    #[test]
    fn test_auto_tune_declined_or_eof() {
        for input in ["n\n", ""] {
            let (out, conn) = run_with(input, |c, conn| c.auto_tune(conn));
            assert!(out.contains("Auto-tune cancelled"));
            assert!(!conn.transport().has_custom_thresholds());
        }
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let (out, conn) = run_with("n\n", |c, conn| c.reset(conn));
        assert!(!out.contains('✓'));
        assert!(conn.transport().received().is_empty());

        let (out, conn) = run_with("Y\n", |c, conn| c.reset(conn));
        assert!(out.contains("✓ Touch configuration reset to defaults"));
        assert_eq!(
            conn.transport().received(),
            &["R".to_string(), "T".to_string()]
        );
    }
}
