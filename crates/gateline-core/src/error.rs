//! Error types shared across the gateline workspace.
//!
//! All registry operations fail synchronously with one of these stable codes;
//! none is retried automatically. Lockout is a protocol state, not an error,
//! and never appears here.

use thiserror::Error;

/// Result type alias for gateline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the line registry and the credential link.
#[derive(Debug, Error)]
pub enum Error {
    // Registry errors
    /// A live resource already holds this physical line.
    #[error("Line {line} is already exported")]
    AlreadyExported { line: u32 },

    /// Every slot in the fixed line table is occupied.
    #[error("Line table is full ({max} lines)")]
    CapacityExceeded { max: usize },

    /// Operation on an absent or just-removed resource.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Operation rejected by the resource's current configuration.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Malformed caller input.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    // Interrupt errors
    /// An interrupt is already bound to this resource.
    #[error("Interrupt already armed on line {line}")]
    AlreadyArmed { line: u32 },

    /// No interrupt is bound to this resource.
    #[error("No interrupt armed on line {line}")]
    NotArmed { line: u32 },

    /// The physical line cannot deliver edge interrupts.
    #[error("Interrupt unobtainable for line {line}")]
    InterruptUnavailable { line: u32 },

    /// A notification or console channel closed underneath an operation.
    #[error("Channel closed: {context}")]
    ChannelClosed { context: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new already-exported error.
    pub fn already_exported(line: u32) -> Self {
        Self::AlreadyExported { line }
    }

    /// Create a new capacity-exceeded error.
    pub fn capacity_exceeded(max: usize) -> Self {
        Self::CapacityExceeded { max }
    }

    /// Create a new not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a new permission-denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new already-armed error.
    pub fn already_armed(line: u32) -> Self {
        Self::AlreadyArmed { line }
    }

    /// Create a new not-armed error.
    pub fn not_armed(line: u32) -> Self {
        Self::NotArmed { line }
    }

    /// Create a new interrupt-unavailable error.
    pub fn interrupt_unavailable(line: u32) -> Self {
        Self::InterruptUnavailable { line }
    }

    /// Create a new channel-closed error.
    pub fn channel_closed(context: impl Into<String>) -> Self {
        Self::ChannelClosed {
            context: context.into(),
        }
    }
}
