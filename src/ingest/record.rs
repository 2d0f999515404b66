use super::timestamp::TimestampNormalizer;
use crate::utils::MalformedLineError;
use serde_json::{Map, Value};

/// One parsed telemetry entry
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// UTC epoch seconds
    pub timestamp_utc: i64,
    pub command: String,
    pub subcommand: String,
    pub args: String,
    pub output: String,
    pub duration_seconds: f64,
}

impl LogRecord {
    /// `command subcommand args` with empty parts left out
    pub fn command_line(&self) -> String {
        [
            self.command.as_str(),
            self.subcommand.as_str(),
            self.args.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Turns raw source lines into records
#[derive(Debug, Clone, Copy)]
pub struct RecordParser {
    normalizer: TimestampNormalizer,
}

impl RecordParser {
    pub fn new(normalizer: TimestampNormalizer) -> Self {
        Self { normalizer }
    }

    /// Parse one source line as raw bytes.
    ///
    /// Lines that are not valid UTF-8 are malformed as a whole.
    pub fn parse_bytes(&self, line: &[u8]) -> Result<Option<LogRecord>, MalformedLineError> {
        let text = std::str::from_utf8(line)
            .map_err(|e| MalformedLineError::InvalidUtf8(e.to_string()))?;
        self.parse(text)
    }

    /// Parse one source line.
    ///
    /// Returns `Ok(None)` for a blank line.
    pub fn parse(&self, line: &str) -> Result<Option<LogRecord>, MalformedLineError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| MalformedLineError::InvalidJson(e.to_string()))?;
        let object = value.as_object().ok_or(MalformedLineError::NotAnObject)?;

        let timestamp = object
            .get("timestamp")
            .and_then(Value::as_str)
            .ok_or(MalformedLineError::MissingTimestamp)?;
        let timestamp_utc = self.normalizer.normalize(timestamp)?;

        Ok(Some(LogRecord {
            timestamp_utc,
            command: text_field(object, "command"),
            subcommand: text_field(object, "subcommand"),
            args: text_field(object, "args"),
            output: text_field(object, "output"),
            duration_seconds: duration_field(object),
        }))
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn duration_field(object: &Map<String, Value>) -> f64 {
    let duration = match object.get("duration") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    duration.filter(|d| d.is_finite()).unwrap_or(0.0)
}
