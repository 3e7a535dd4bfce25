use crate::error::Error;

/// Result type alias used throughout the riffle crates.
pub type Result<T> = std::result::Result<T, Error>;
