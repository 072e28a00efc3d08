//! Text rendering for status tables and suggestions

use std::fmt::Write;
use touchtune_core::autotune::ThresholdSuggestion;
use touchtune_core::touch::{classify, ElectrodeId, HealthCategory, SensitivityLevel, TouchStatus};

const RULE: &str = "============================================================";

fn yes_no(flag: bool) -> char {
    if flag {
        'Y'
    } else {
        'N'
    }
}

/// Session banner with the command summary
pub fn banner() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Izod Mini Touch Sensitivity Tuner");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Commands:");
    let _ = writeln!(out, "  1-5: Set global sensitivity level");
    let _ = writeln!(out, "  s: Show current status");
    let _ = writeln!(out, "  c: Force calibration");
    let _ = writeln!(out, "  e: Set electrode threshold");
    let _ = writeln!(out, "  a: Auto-tune sensitivity");
    let _ = writeln!(out, "  r: Reset to defaults");
    let _ = writeln!(out, "  h: Help");
    let _ = writeln!(out, "  q: Quit");
    let _ = writeln!(out, "{}", RULE);
    out
}

/// Status table with one row per electrode, `?` for rows the device omitted
pub fn status_table(status: &TouchStatus) -> String {
    let mut out = String::new();
    let level = status.sensitivity_level;
    let _ = writeln!(out, "Current Status:");
    let _ = writeln!(
        out,
        "Global Sensitivity Level: {} ({})",
        level,
        level.name()
    );
    let _ = writeln!(out, "Electrodes:");
    let _ = writeln!(
        out,
        "  ID | Enabled | Baseline | Filtered | Delta | Touched | Health"
    );
    let _ = writeln!(
        out,
        "-----|---------|----------|----------|-------|---------|--------"
    );

    for id in ElectrodeId::all() {
        match status.electrode(id) {
            Some(reading) => {
                let _ = writeln!(
                    out,
                    "  {:2} |    {}    |   {:4}   |   {:4}   | {:5} |    {}    | {}",
                    id.index(),
                    yes_no(reading.enabled),
                    reading.baseline,
                    reading.filtered,
                    reading.delta,
                    yes_no(reading.touched),
                    classify(reading)
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "  {:2} |    ?    |    ?     |    ?     |   ?   |    ?    |   ?",
                    id.index()
                );
            }
        }
    }
    out
}

/// Auto-tune recommendations
pub fn suggestions_table(suggestions: &[ThresholdSuggestion]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Recommended thresholds:");
    let _ = writeln!(out, "Electrode | Touch | Release | Noise Level");
    let _ = writeln!(out, "----------|-------|---------|------------");
    for s in suggestions {
        let _ = writeln!(
            out,
            "    {:2}    |  {:3}  |   {:3}   |     {:3}",
            s.electrode.index(),
            s.touch,
            s.release,
            s.noise
        );
    }
    out
}

/// Detailed help
pub fn help() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Touch Sensitivity Tuning Help:");
    let _ = writeln!(out);
    let _ = writeln!(out, "Sensitivity Levels:");
    for level in SensitivityLevel::all() {
        let defaults = level.default_thresholds();
        let _ = writeln!(
            out,
            "  {} - {:<9} (touch {}, release {})",
            level,
            level.name(),
            defaults.touch(),
            defaults.release()
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Electrode Health:");
    let mut categories = HealthCategory::all();
    categories.rotate_right(1);
    for category in categories {
        let _ = writeln!(out, "  {:<5} - {}", category, category.description());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Tips:");
    let _ = writeln!(
        out,
        "- Start with global sensitivity levels before custom thresholds"
    );
    let _ = writeln!(out, "- Use auto-tune for initial setup");
    let _ = writeln!(out, "- Higher touch thresholds = less sensitive");
    let _ = writeln!(out, "- Release threshold must be lower than touch threshold");
    let _ = writeln!(out, "- Small pad (electrode 11) may need different settings");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchtune_core::touch::ElectrodeReading;

    #[test]
    fn test_status_table_marks_missing_rows() {
        let mut status = TouchStatus::default();
        status.electrodes.insert(
            ElectrodeId::new(0).unwrap(),
            ElectrodeReading {
                enabled: true,
                baseline: 45,
                filtered: 50,
                delta: 5,
                touched: false,
            },
        );
        let table = status_table(&status);
        let rows: Vec<&str> = table.lines().filter(|l| l.starts_with("  ")).collect();

        // header plus 12 electrodes
        assert_eq!(rows.len(), 13);
        assert!(rows[1].ends_with("LOW"));
        assert!(rows[2].ends_with('?'));
        assert!(table.contains("Global Sensitivity Level: 3 (Medium)"));
    }

    #[test]
    fn test_help_lists_every_category() {
        let text = help();
        for category in HealthCategory::all() {
            assert!(text.contains(category.label()));
        }
        assert!(text.contains("5 - Very High"));
    }
}
