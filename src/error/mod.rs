//! Error handling module for the batch encoder

use thiserror::Error;

/// Main error type for plan compilation and the batch driver
#[derive(Error, Debug)]
pub enum EncodeError {
    /// Requested profile key is not in the profile table
    #[error("Unknown {kind} profile '{key}'")]
    UnknownProfile { kind: ProfileKind, key: String },

    /// Resize modifier is not `WxH`
    #[error("Invalid resize format '{value}'. Use WxH.")]
    InvalidResize { value: String },

    /// Crop modifier is not `L,T,R,B`
    #[error("Invalid crop format '{value}'. Use L,T,R,B.")]
    InvalidCrop { value: String },

    /// VPP modifier is not one of none/edge/deband/both
    #[error("Invalid vpp mode '{value}'. Use none, edge, deband or both.")]
    InvalidVpp { value: String },

    /// A required request field is empty
    #[error("Missing --{field} value")]
    MissingInput { field: String },

    /// Raw probe output could not be parsed
    #[error("Failed to probe media file: {message}")]
    Probe { message: String },

    /// Internal plan invariant was violated
    #[error("Plan consistency violated: {message}")]
    PlanConsistency { message: String },

    /// Configuration file could not be understood
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Target scanning failed
    #[error("Scan failed: {message}")]
    Scan { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Which profile table a key was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Video,
    Audio,
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::Video => write!(f, "Video"),
            ProfileKind::Audio => write!(f, "Audio"),
        }
    }
}

impl EncodeError {
    /// Errors that abort the whole batch before any stage is built
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Errors that degrade a single file instead of aborting
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EncodeError::Probe { .. })
    }

    pub(crate) fn probe(message: impl Into<String>) -> Self {
        EncodeError::Probe {
            message: message.into(),
        }
    }

    pub(crate) fn consistency(message: impl Into<String>) -> Self {
        EncodeError::PlanConsistency {
            message: message.into(),
        }
    }
}

/// Result type alias for batch encoder operations
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;
