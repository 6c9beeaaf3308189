use thiserror::Error;

// === StorageError ===

/// Errors raised by a storage area or by the fallback chain.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage area cannot be used in this context.
    #[error("Storage area unavailable: {0}")]
    Unavailable(String),
    /// The backing database rejected the operation.
    #[error("Storage database error: {0}")]
    DatabaseError(String),
    /// A stored value could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    SerializationError(String),
    /// Every area in the fallback chain failed; carries the last failure.
    #[error("All storage areas failed: {0}")]
    Exhausted(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

// === PresetError ===

/// User-facing validation errors for preset operations.
#[derive(Debug, Error)]
pub enum PresetError {
    /// The preset name is empty after trimming.
    #[error("Please enter a preset name.")]
    EmptyName,
    /// The name collides with a built-in preset, an alias, or the custom sentinel.
    #[error("Preset name is reserved: {0}")]
    ReservedName(String),
    /// A custom preset with the same name already exists.
    #[error("A preset named \"{0}\" already exists.")]
    DuplicateName(String),
    /// Visibility can only be toggled for built-in presets.
    #[error("Unknown built-in preset: {0}")]
    UnknownBuiltin(String),
    /// The preset table could not be read or written.
    #[error("Preset storage error: {0}")]
    Storage(#[from] StorageError),
}

// === SettingsError ===

/// Errors related to persisting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A domain-scoped operation was called without a usable hostname.
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
    /// The settings could not be persisted.
    #[error("Settings storage error: {0}")]
    Storage(#[from] StorageError),
}

// === MessageError ===

/// Errors produced while validating an inbound message.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The payload is not an object with a string `type` field.
    #[error("Malformed message: {0}")]
    Malformed(String),
    /// The `type` field names no known message kind.
    #[error("Unknown message type: {0}")]
    UnknownType(String),
    /// A required payload field is missing or has the wrong shape.
    #[error("Invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: String, reason: String },
}
