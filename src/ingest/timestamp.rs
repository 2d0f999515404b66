use crate::utils::TimestampFormatError;
use chrono::{FixedOffset, NaiveDateTime, TimeZone};

/// Source timestamp layout
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Converts source-local timestamps into UTC epoch seconds
#[derive(Debug, Clone, Copy)]
pub struct TimestampNormalizer {
    offset: FixedOffset,
}

impl TimestampNormalizer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn normalize(&self, value: &str) -> Result<i64, TimestampFormatError> {
        let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| {
            TimestampFormatError {
                value: value.to_string(),
                reason: e.to_string(),
            }
        })?;

        // A fixed offset has exactly one mapping for every local time
        let local = self
            .offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| TimestampFormatError {
                value: value.to_string(),
                reason: "local time does not exist in the source zone".to_string(),
            })?;

        Ok(local.timestamp())
    }
}
