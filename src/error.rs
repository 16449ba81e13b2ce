//! Error types for the DSN reader.
//!
//! [`LexError`] is the cause recorded by the lexer when a scan goes wrong.
//! [`DsnError`] is the unified error returned by every public operation; it
//! attaches the source location the problem was detected at.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::dsn::TokenKind;

/// Result type alias using [`DsnError`].
pub type Result<T> = std::result::Result<T, DsnError>;

/// A position in DSN source text, used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// Name of the input (usually a file name), if one was given
    pub source: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column within the line, counted in UTF-8 code points
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}:{}:{}", source, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// Fatal conditions hit while scanning. Once recorded the lexer stays failed.
#[derive(Error, Debug, Clone)]
pub enum LexError {
    /// A backslash appeared inside a quoted string
    #[error("does not support escaping")]
    Escape,

    /// A raw newline appeared inside a quoted string
    #[error("newline in string")]
    NewlineInString,

    /// Input ended before the closing quote
    #[error("unterminated string")]
    UnterminatedString,

    /// A closing parenthesis had no matching opening one
    #[error("unbalanced parentheses")]
    UnbalancedParens,

    /// The stream is not valid UTF-8
    #[error("invalid UTF-8 in input")]
    InvalidUtf8,

    /// The underlying reader failed
    #[error("read failed: {0}")]
    Io(#[source] Arc<std::io::Error>),
}

impl From<std::io::Error> for LexError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl PartialEq for LexError {
    /// I/O failures compare by error kind.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// Unified error type for all DSN operations.
#[derive(Error, Debug)]
pub enum DsnError {
    // ============ Lexing Errors ============
    /// The lexer stopped on a fatal condition
    #[error("{source} {location}")]
    Lexer {
        location: Location,
        #[source]
        source: LexError,
    },

    /// A character that cannot start any token
    #[error("illegal token {location}")]
    IllegalToken { location: Location },

    // ============ Structural Errors ============
    /// `((` with no declaration name in between
    #[error("adjacent open parentheses {location}")]
    AdjacentOpenParens { location: Location },

    /// Something other than an identifier followed `(`
    #[error("{found} as declaration name, want IDENTIFIER {location}")]
    ExpectedIdentifier { found: TokenKind, location: Location },

    /// Input ended while declarations were still open
    #[error("unclosed parentheses ({depth} open) {location}")]
    UnclosedParens { location: Location, depth: usize },

    // ============ Netlist Errors ============
    /// Pads handed to a component were not strictly increasing
    #[error("invalid pads for component '{component}': {message}")]
    InvalidPads { component: String, message: String },

    /// A `pins` entry did not have the `REF-PAD` shape
    #[error("malformed pin reference '{pin}'")]
    UnknownPin { pin: String },

    // ============ I/O Errors ============
    /// Error opening or reading a DSN file
    #[error("failed to read DSN file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DsnError {
    /// Create a lexer error
    pub fn lexer(location: Location, source: LexError) -> Self {
        Self::Lexer { location, source }
    }

    /// Create an invalid pads error
    pub fn invalid_pads(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPads {
            component: component.into(),
            message: message.into(),
        }
    }

    /// The location the error was detected at, if it came from the reader.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::Lexer { location, .. }
            | Self::IllegalToken { location }
            | Self::AdjacentOpenParens { location }
            | Self::ExpectedIdentifier { location, .. }
            | Self::UnclosedParens { location, .. } => Some(location),
            _ => None,
        }
    }
}
