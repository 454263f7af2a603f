//! Error types for flag declaration, parsing, and environment overlay.
//!
//! A single [`Error`] covers both the overlay operations
//! ([`resolve`](crate::resolve), [`disable`](crate::disable),
//! [`set_custom_name`](crate::set_custom_name)) and the flag set they operate
//! on. Every variant is a startup misconfiguration; callers are expected to
//! report it and exit rather than retry.

use thiserror::Error;

use crate::value::{ValueError, ValueType};

/// Errors returned by flag sets and the environment overlay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An overlay operation referenced a flag that was never declared.
    #[error("flag does not exist: {0}")]
    FlagNotFound(String),

    /// A second custom environment name was assigned to the same flag.
    #[error("custom environment name already defined for flag '{flag}' (existing: {existing})")]
    DuplicateCustomName {
        /// Flag the second assignment targeted.
        flag: String,
        /// Name stored by the first assignment.
        existing: String,
    },

    /// A bool flag's environment variable held something other than a bool literal.
    #[error("bool flag '{flag}' got value '{value}' from {env_name}, expected 'true' or 'false'")]
    InvalidBoolEnvValue {
        /// Flag being resolved.
        flag: String,
        /// Environment variable that was read.
        env_name: String,
        /// Raw value found in the environment.
        value: String,
    },

    /// A flag with the same name is already declared in this set.
    #[error("flag redefined: {0}")]
    DuplicateFlag(String),

    /// clap rejected the command line, e.g. an unknown flag or a missing
    /// value. Holds clap's rendered message.
    #[error("{0}")]
    CommandLine(String),

    /// A command-line value was rejected by the flag's setter.
    #[error("invalid argument for flag '{flag}': {source}")]
    InvalidValue {
        /// Flag being set.
        flag: String,
        /// Setter failure.
        #[source]
        source: ValueError,
    },

    /// A typed getter was called for a flag of a different type.
    #[error("flag '{flag}' is of type {actual}, not {expected}")]
    TypeMismatch {
        /// Flag that was read.
        flag: String,
        /// Type the caller asked for.
        expected: ValueType,
        /// Declared type of the flag.
        actual: ValueType,
    },

    /// `-h` or `--help` was given and no such flag is declared.
    #[error("help requested")]
    HelpRequested,
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
