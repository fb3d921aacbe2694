//! Error types for Slotcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SlotcastError>;

#[derive(Error, Debug)]
pub enum SlotcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("No weekly schedule available for this user")]
    NoScheduleAvailable,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SlotcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SlotcastError::InvalidInput(_) => 3,
            SlotcastError::NoScheduleAvailable => 3,
            SlotcastError::Publish(PublishError::NotConnected(_)) => 2,
            SlotcastError::Publish(_) => 1,
            SlotcastError::Config(_) => 1,
            SlotcastError::Database(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown platform tag in database: {0}")]
    UnknownPlatform(String),

    #[error("Corrupt value in database: {0}")]
    CorruptValue(String),
}

/// Outcomes of a publish attempt.
///
/// `NotConnected` and `UnsupportedPlatform` are expected conditions, not
/// faults: the post stays queued and the dispatcher logs the attempt. Only
/// user action (connecting the account, registering the platform) resolves
/// them.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    #[error("No credential on file: {0}")]
    NotConnected(String),

    #[error("Platform rejected the post: {0}")]
    RemoteRejected(String),

    #[error("No publisher registered for platform: {0}")]
    UnsupportedPlatform(String),
}
