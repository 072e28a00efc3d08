//! Interactive tuning shell

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{debug, warn};
use touchtune_core::protocol::{Connection, ProtocolError, Transport};

use crate::console::Console;

const PROMPT: &str = "\nTouch Tuner> ";

/// Everything the shell understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    SetLevel(u8),
    Status,
    Calibrate,
    SetThreshold,
    AutoTune,
    Reset,
    Help,
    Quit,
}

/// Input token to command
const COMMANDS: &[(&str, ShellCommand)] = &[
    ("1", ShellCommand::SetLevel(1)),
    ("2", ShellCommand::SetLevel(2)),
    ("3", ShellCommand::SetLevel(3)),
    ("4", ShellCommand::SetLevel(4)),
    ("5", ShellCommand::SetLevel(5)),
    ("s", ShellCommand::Status),
    ("c", ShellCommand::Calibrate),
    ("e", ShellCommand::SetThreshold),
    ("a", ShellCommand::AutoTune),
    ("r", ShellCommand::Reset),
    ("h", ShellCommand::Help),
    ("help", ShellCommand::Help),
    ("q", ShellCommand::Quit),
];

impl ShellCommand {
    /// Look up a typed token, ignoring case and surrounding whitespace
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        COMMANDS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, command)| *command)
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    fn dispatch<T: Transport>(
        &mut self,
        conn: &mut Connection<T>,
        command: ShellCommand,
    ) -> Result<()> {
        match command {
            ShellCommand::SetLevel(level) => self.set_level(conn, level),
            ShellCommand::Status => self.show_status(conn),
            ShellCommand::Calibrate => self.calibrate(conn),
            ShellCommand::SetThreshold => self.set_threshold(conn),
            ShellCommand::AutoTune => self.auto_tune(conn),
            ShellCommand::Reset => self.reset(conn),
            ShellCommand::Help => self.help(),
            ShellCommand::Quit => Ok(()),
        }
    }

    /// Read commands until `q` or end of input.
    ///
    /// Device errors are reported and the session continues unless the link
    /// itself is gone.
    pub fn run_shell<T: Transport>(&mut self, conn: &mut Connection<T>) -> Result<()> {
        self.say(crate::render::banner())?;

        loop {
            let Some(line) = self.ask(PROMPT)? else {
                debug!("shell: end of input");
                self.say("")?;
                break;
            };
            if line.is_empty() {
                continue;
            }

            let Some(command) = ShellCommand::parse(&line) else {
                self.say("Unknown command. Type 'h' for help.")?;
                continue;
            };
            if command == ShellCommand::Quit {
                break;
            }

            if let Err(e) = self.dispatch(conn, command) {
                match e.downcast_ref::<ProtocolError>() {
                    Some(protocol) if !protocol.is_recoverable() => return Err(e),
                    Some(_) => {
                        warn!("shell: {:?} failed: {}", command, e);
                        self.say(format!("Error: {}", e))?;
                    }
                    None => return Err(e),
                }
            }
        }

        self.say("Exiting...")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use touchtune_core::demo::SimulatedController;
    use touchtune_core::protocol::TimingConfig;

    fn session(input: &str, sim: SimulatedController) -> (String, Vec<String>) {
        let mut conn = Connection::with_transport(sim, TimingConfig::immediate());
        let mut out = Vec::new();
        Console::new(input.as_bytes(), &mut out)
            .run_shell(&mut conn)
            .unwrap();
        let received = conn.into_transport().received().to_vec();
        (String::from_utf8(out).unwrap(), received)
    }

    #[test]
    fn test_token_table() {
        assert_eq!(ShellCommand::parse("3"), Some(ShellCommand::SetLevel(3)));
        assert_eq!(ShellCommand::parse(" S "), Some(ShellCommand::Status));
        assert_eq!(ShellCommand::parse("HELP"), Some(ShellCommand::Help));
        assert_eq!(ShellCommand::parse("h"), Some(ShellCommand::Help));
        assert_eq!(ShellCommand::parse("6"), None);
        assert_eq!(ShellCommand::parse("quit"), None);
    }

    #[test]
    fn test_commands_reach_the_device() {
        let (out, received) = session("4\ns\nc\nq\nS1\n", SimulatedController::with_seed(1));
        assert!(out.contains("✓ Sensitivity level set to 4"));
        assert!(out.contains("Global Sensitivity Level: 4 (High)"));
        assert!(out.contains("✓ Calibration started"));
        assert!(out.ends_with("Exiting...\n"));
        // Nothing after `q` is read
        assert_eq!(received, vec!["S4", "T", "C", "T"]);
    }

    #[test]
    fn test_eof_ends_session() {
        let (out, received) = session("s\n", SimulatedController::with_seed(1));
        assert!(out.contains("Current Status:"));
        assert!(out.ends_with("Exiting...\n"));
        assert_eq!(received, vec!["T"]);
    }

    #[test]
    fn test_unknown_and_empty_input() {
        let (out, received) = session("\nxyz\nh\nq\n", SimulatedController::with_seed(1));
        assert!(out.contains("Unknown command. Type 'h' for help."));
        assert!(out.contains("Touch Sensitivity Tuning Help:"));
        assert!(received.is_empty());
    }

    #[test]
    fn test_timeout_is_reported_and_session_continues() {
        let mut sim = SimulatedController::with_seed(1);
        sim.set_silent(true);
        let (out, received) = session("s\n2\nq\n", sim);
        assert_eq!(out.matches("Error: ").count(), 2);
        assert_eq!(received, vec!["T", "S2"]);
    }

    #[test]
    fn test_full_interactive_session() {
        let mut sim = SimulatedController::with_seed(8);
        sim.set_noise_all(0);
        let input = "s\n2\ne\n3\n20\n10\na\ny\nr\ny\nq\n";
        let (out, received) = session(input, sim);

        assert!(out.contains("✓ Electrode 3 thresholds set: touch=20, release=10"));
        assert!(out.contains("Auto-tune completed: 12/12 electrodes configured"));
        assert!(out.contains("✓ Touch configuration reset to defaults"));
        assert_eq!(&received[..3], &["T", "S2", "E3,20,10"]);
        assert_eq!(&received[received.len() - 2..], &["R", "T"]);
    }
}
