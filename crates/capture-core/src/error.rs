use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identifier errors
    #[error("Invalid device guid: {0}")]
    InvalidGuid(String),

    // Peer code mapping errors
    #[error("Invalid SocketCam status {code} for {platform}")]
    InvalidStatusCode { platform: String, code: u8 },

    #[error("Invalid trigger mode: {0}")]
    InvalidTriggerMode(u8),

    #[error("Invalid property id: {0:#010x}")]
    InvalidPropertyId(u32),

    #[error("Invalid event category: {0}")]
    InvalidEventCategory(i32),

    #[error("Invalid data source status: {0}")]
    InvalidDataSourceStatus(u8),

    #[error("Unexpected property value: expected {expected}, got {actual}")]
    UnexpectedPropertyValue { expected: String, actual: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
