//! Status response parsing
//!
//! The controller answers a status query with free-form text. Each line is
//! classified on its own into a [`ResponseLine`]; a malformed line is dropped
//! without affecting the rest of the batch.
//!
//! Recognized shapes:
//! - `Electrode <id>: <Y/N> <baseline> <filtered> <delta> <Y/N>`
//! - `Global Level: <n> (<name>)`

use tracing::debug;

use super::{ElectrodeId, ElectrodeReading, SensitivityLevel, TouchStatus};

const ELECTRODE_MARKER: &str = "Electrode";
const GLOBAL_LEVEL_MARKER: &str = "Global Level:";

/// Minimum number of fields in an electrode row (id plus five values)
const ELECTRODE_FIELDS: usize = 6;

/// Classification of a single response line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine {
    /// A complete electrode row
    Electrode(ElectrodeId, ElectrodeReading),
    /// The global sensitivity level row
    GlobalLevel(SensitivityLevel),
    /// Looked like a known row but could not be decoded
    Malformed(String),
    /// Anything else the device printed
    Unrecognized,
}

/// Classify one line of device output
pub fn parse_line(line: &str) -> ResponseLine {
    if line.contains(ELECTRODE_MARKER) && line.contains(':') {
        parse_electrode_row(line)
    } else if line.contains(GLOBAL_LEVEL_MARKER) {
        parse_global_level(line)
    } else {
        ResponseLine::Unrecognized
    }
}

fn parse_electrode_row(line: &str) -> ResponseLine {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    // The device prefixes rows with a bare label ("Electrode 3: ...")
    if tokens.first() == Some(&ELECTRODE_MARKER) {
        tokens.remove(0);
    }

    if tokens.len() < ELECTRODE_FIELDS {
        return ResponseLine::Malformed(format!(
            "expected {} fields, found {}",
            ELECTRODE_FIELDS,
            tokens.len()
        ));
    }

    let digits: String = tokens[0].chars().filter(|c| c.is_ascii_digit()).collect();
    let id = match digits.parse::<i64>().ok().map(ElectrodeId::new) {
        Some(Ok(id)) => id,
        Some(Err(e)) => return ResponseLine::Malformed(e.to_string()),
        None => return ResponseLine::Malformed(format!("bad electrode id '{}'", tokens[0])),
    };

    let baseline = match tokens[2].parse::<u32>() {
        Ok(v) => v,
        Err(_) => return ResponseLine::Malformed(format!("bad baseline '{}'", tokens[2])),
    };
    let filtered = match tokens[3].parse::<u32>() {
        Ok(v) => v,
        Err(_) => return ResponseLine::Malformed(format!("bad filtered value '{}'", tokens[3])),
    };
    let delta = match tokens[4].parse::<i32>() {
        Ok(v) => v,
        Err(_) => return ResponseLine::Malformed(format!("bad delta '{}'", tokens[4])),
    };

    ResponseLine::Electrode(
        id,
        ElectrodeReading {
            enabled: tokens[1] == "Y",
            baseline,
            filtered,
            delta,
            touched: tokens[5] == "Y",
        },
    )
}

fn parse_global_level(line: &str) -> ResponseLine {
    let Some(token) = line.split_whitespace().nth(2) else {
        return ResponseLine::Malformed("missing level value".to_string());
    };
    match token.parse::<i64>() {
        Ok(value) => match SensitivityLevel::new(value) {
            Ok(level) => ResponseLine::GlobalLevel(level),
            Err(e) => ResponseLine::Malformed(e.to_string()),
        },
        Err(_) => ResponseLine::Malformed(format!("bad level '{}'", token)),
    }
}

/// Build a [`TouchStatus`] from the lines of a status response.
///
/// Returns `None` only when `lines` is empty. Malformed lines are skipped and a
/// missing or unreadable level leaves the default in place.
pub fn parse_status<S: AsRef<str>>(lines: &[S]) -> Option<TouchStatus> {
    if lines.is_empty() {
        return None;
    }

    let mut status = TouchStatus::default();
    for line in lines {
        let line = line.as_ref();
        match parse_line(line) {
            ResponseLine::Electrode(id, reading) => {
                status.electrodes.insert(id, reading);
            }
            ResponseLine::GlobalLevel(level) => status.sensitivity_level = level,
            ResponseLine::Malformed(reason) => {
                debug!("parse_status: skipping line {:?}: {}", line, reason);
            }
            ResponseLine::Unrecognized => {}
        }
    }
    Some(status)
}
