pub mod error;
pub mod logging;

pub use error::{AppError, MalformedLineError, TimestampFormatError};
