//! Toolchain console parsing.
//!
//! The testbench asserts on the value written at the result RAM address
//! and reports `passed<N>` or `failed<N>` with the observed value.

use std::sync::OnceLock;

use centroid_selector::Mask;
use regex::Regex;
use serde::{Deserialize, Serialize};

fn verdict() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(passed|failed)(\d+)").expect("verdict pattern is valid"))
}

/// Lines mentioning `needle`, trimmed.
fn lines_containing(output: &str, needle: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.contains(needle))
        .map(|line| line.trim().to_string())
        .collect()
}

// ── Synthesis ───────────────────────────────────────────────────────

/// Warnings and errors from a Vivado batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl SynthesisReport {
    /// A line mentioning both markers counts as an error only.
    pub fn parse(output: &str) -> Self {
        let errors = lines_containing(output, "ERROR");
        let warnings = lines_containing(output, "WARNING")
            .into_iter()
            .filter(|line| !line.contains("ERROR"))
            .collect();
        Self { warnings, errors }
    }

    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ── Simulation ──────────────────────────────────────────────────────

/// Verdict for one simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationOutcome {
    /// The testbench read back the expected mask.
    Passed { observed: Mask },
    /// The testbench reported a mismatch, or never reported at all.
    Failed {
        observed: Option<Mask>,
        errors: Vec<String>,
    },
    /// Interactive run; nothing to check.
    Unchecked,
}

impl SimulationOutcome {
    pub fn parse(output: &str) -> Self {
        let first = |kind: &str| {
            verdict()
                .captures_iter(output)
                .find(|caps| &caps[1] == kind)
                .and_then(|caps| caps[2].parse::<u8>().ok())
                .map(Mask::new)
        };

        if let Some(observed) = first("passed") {
            return Self::Passed { observed };
        }

        Self::Failed {
            observed: first("failed"),
            errors: lines_containing(output, "ERROR"),
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// Value read back from the result address, when reported.
    pub fn observed(&self) -> Option<Mask> {
        match self {
            Self::Passed { observed } => Some(*observed),
            Self::Failed { observed, .. } => *observed,
            Self::Unchecked => None,
        }
    }
}
