//! Error types.

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by fallible constructors and configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A level name could not be parsed.
    #[error("invalid log level `{0}`")]
    InvalidLevel(String),

    /// A level directive such as `a.b=debug` could not be parsed.
    #[error("invalid level directive `{directive}`: {reason}")]
    InvalidDirective {
        directive: String,
        reason: &'static str,
    },

    /// A logger name is not a well-formed dotted identifier.
    #[error("invalid logger name `{name}`: {reason}")]
    InvalidLoggerName { name: String, reason: &'static str },

    /// A configuration source failed to produce a configuration.
    #[error("configuration source failed: {0}")]
    ConfigSource(String),
}

impl Error {
    pub(crate) fn directive(directive: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidDirective {
            directive: directive.into(),
            reason,
        }
    }

    pub(crate) fn logger_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidLoggerName {
            name: name.into(),
            reason,
        }
    }

    /// Wraps a failure reported by a [`ConfigSource`](crate::gate::ConfigSource).
    pub fn config_source(message: impl std::fmt::Display) -> Self {
        Self::ConfigSource(message.to_string())
    }
}

/// Misuse of the scope discipline.
///
/// This is a programming error rather than a recoverable condition, so it is
/// kept apart from [`Error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    /// A scope was closed while a newer scope on the same key was still open.
    #[error("log context scope for key `{key}` closed out of order")]
    OutOfOrder { key: String },
}
