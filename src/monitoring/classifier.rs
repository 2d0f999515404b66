//! Decides whether a record's output is alert-worthy

use serde::{Deserialize, Serialize};
use std::fmt;

const MISSING_ARGUMENT_MARKER: &str = "the following required arguments were not provided";
const UNRECOGNIZED_MARKER: &str = "unrecognized";
const GENERIC_ERROR_MARKERS: [&str; 3] = ["error", "unrecognized", "failed"];

/// Alert kinds, in classification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    MissingArgument,
    UnrecognizedCommand,
    GenericError,
}

impl AlertKind {
    /// Title used in the alert message
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::MissingArgument => "Missing required argument",
            AlertKind::UnrecognizedCommand => "Unrecognized command",
            AlertKind::GenericError => "CLI error detected",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertKind::MissingArgument => "missing_argument",
            AlertKind::UnrecognizedCommand => "unrecognized_command",
            AlertKind::GenericError => "generic_error",
        };
        f.write_str(name)
    }
}

/// Classify a record's output; first matching rule wins.
pub fn classify(output: &str) -> Option<AlertKind> {
    let lowered = output.to_lowercase();

    if lowered.contains(MISSING_ARGUMENT_MARKER) {
        Some(AlertKind::MissingArgument)
    } else if lowered.contains(UNRECOGNIZED_MARKER) {
        Some(AlertKind::UnrecognizedCommand)
    } else if GENERIC_ERROR_MARKERS.iter().any(|m| lowered.contains(m)) {
        Some(AlertKind::GenericError)
    } else {
        None
    }
}
