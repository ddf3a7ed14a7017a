//! Error types shared by every layer of the converter.

use std::fmt;

use thiserror::Error;

/// Result type for conversion operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while opening, running or closing a conversion
#[derive(Debug, Error)]
pub enum Error {
    /// The alias could not be resolved to a canonical encoding name.
    #[error("unknown encoding name: {0}")]
    NameNotFound(String),

    /// An empty string was passed where an encoding name is required.
    #[error("encoding name is empty")]
    EmptyName,

    /// The canonical name is known but no converter (built-in or external) handles it.
    #[error("no converter available for encoding {0}")]
    UnsupportedEncoding(String),

    /// The input ends in the middle of a character.
    #[error("incomplete multibyte sequence at end of input")]
    BadSequence,

    /// The input contains an invalid byte pattern, or a character has no
    /// equivalent in the target encoding and strict mode was requested.
    #[error("invalid or unconvertible character in input")]
    InvalidCharacter,

    /// The destination buffer has no room for the next character.
    #[error("output buffer is full")]
    OutputFull,

    /// An external CCS table file could not be used.
    #[error("cannot load table {name}: {reason}")]
    TableLoad {
        /// CCS name the table was requested for
        name: String,
        /// What was wrong with the file
        reason: String,
    },

    /// An I/O error while reading an external table file.
    #[error("I/O error while loading table {name}: {source}")]
    Io {
        /// CCS name the table was requested for
        name: String,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// A buffer could not be allocated.
    #[error("memory allocation failed")]
    AllocationFailure,
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    /// See [`Error::NameNotFound`] and [`Error::EmptyName`].
    NameNotFound,
    /// See [`Error::UnsupportedEncoding`].
    UnsupportedEncoding,
    /// See [`Error::BadSequence`].
    BadSequence,
    /// See [`Error::InvalidCharacter`].
    InvalidCharacter,
    /// See [`Error::OutputFull`].
    OutputFull,
    /// See [`Error::TableLoad`] and [`Error::Io`].
    TableLoadFailure,
    /// See [`Error::AllocationFailure`].
    AllocationFailure,
}

impl Error {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NameNotFound(_) | Error::EmptyName => ErrorKind::NameNotFound,
            Error::UnsupportedEncoding(_) => ErrorKind::UnsupportedEncoding,
            Error::BadSequence => ErrorKind::BadSequence,
            Error::InvalidCharacter => ErrorKind::InvalidCharacter,
            Error::OutputFull => ErrorKind::OutputFull,
            Error::TableLoad { .. } | Error::Io { .. } => ErrorKind::TableLoadFailure,
            Error::AllocationFailure => ErrorKind::AllocationFailure,
        }
    }

    pub(crate) fn table_load(name: &str, reason: impl Into<String>) -> Self {
        Error::TableLoad {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::AllocationFailure
    }
}

/// Outcome of a single-character codec call that did not produce a character.
///
/// A codec returning one of these has left both cursors untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CesError {
    /// More input bytes are needed than remain.
    BadSequence,
    /// Impossible byte pattern on decode, or no mapping on encode.
    InvalidCharacter,
    /// The output sink cannot take the encoded bytes.
    NoSpace,
}

impl fmt::Display for CesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CesError::BadSequence => write!(f, "incomplete sequence"),
            CesError::InvalidCharacter => write!(f, "invalid character"),
            CesError::NoSpace => write!(f, "no space"),
        }
    }
}

impl From<CesError> for Error {
    fn from(err: CesError) -> Self {
        match err {
            CesError::BadSequence => Error::BadSequence,
            CesError::InvalidCharacter => Error::InvalidCharacter,
            CesError::NoSpace => Error::OutputFull,
        }
    }
}
