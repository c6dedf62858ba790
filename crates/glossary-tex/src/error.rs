//! Error types for scanning, entry parsing and fragment decoding

/// Error type for parsing failures
///
/// Every failure is returned as a value. A bulk import records the failing
/// offset and keeps scanning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Error))]
#[cfg_attr(feature = "uniffi", uniffi(flat_error))]
pub enum ParseError {
    /// End of text was reached before the opener at `open_at` was closed
    #[error("unbalanced delimiter opened at byte {open_at}")]
    UnbalancedDelimiter { open_at: usize },

    /// No opening delimiter was found at or after `from`
    #[error("no opening delimiter found after byte {from}")]
    MissingOpenDelimiter { from: usize },

    /// A field asked for with [`crate::GlossaryEntry::require`] is absent
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// The key or the body of an entry could not be extracted
    #[error("malformed entry at byte {offset}: {reason}")]
    MalformedEntry { offset: usize, reason: String },

    /// A field name also occurs inside a sibling field's value.
    ///
    /// Raised by [`crate::scanner::check_unambiguous`]; extraction itself
    /// never fails with it.
    #[error("ambiguous match for field: {0}")]
    AmbiguousFieldMatch(String),
}

impl ParseError {
    /// Wrap a scanner failure as a malformed entry at `offset`
    pub(crate) fn into_malformed(self, offset: usize, what: &str) -> Self {
        match self {
            ParseError::MalformedEntry { .. } => self,
            other => ParseError::MalformedEntry {
                offset,
                reason: format!("{}: {}", what, other),
            },
        }
    }
}

/// Result type alias for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
