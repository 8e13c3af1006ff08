//! Shared error classification.
//!
//! Each crate keeps its own error enum next to the code that produces it
//! ([`crate::LevelError`], the content `LoadError`, the runtime battle and
//! story errors). They all implement [`GameError`] so logs carry a stable
//! code and a severity.

/// How bad an error is for the running session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// The move or story is refused; the world is unchanged and play goes on.
    Recoverable,
    /// A host request was malformed or arrived out of order.
    Validation,
    /// Something the host environment should not have allowed (I/O, tasks).
    Internal,
    /// The level or runtime cannot be used.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

pub trait GameError: std::error::Error {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier for logs, e.g. `"LEVEL_MISSING_SPAWN"`.
    fn error_code(&self) -> &'static str;
}
