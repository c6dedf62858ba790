//! Glossary entry parsing and field formatting
//!
//! Reads and writes `\newglossaryentry` definitions for the LaTeX
//! `glossaries` package, and converts each field between the text shown in
//! an editor and the fragment written to the document.
//!
//! Features:
//! - Brace-balanced scanner for nested field values
//! - Entry parser and canonical entry serializer
//! - Bidirectional field format engine (bold, italic, math mode,
//!   first-letter bold, escaped backslash)
//! - `\group{}` annotation codec
//! - Whole-document import/export with category headers and comments
//!
//! ```
//! use glossary_tex::{format_text, parse_fragment, FormatDescriptor, FormatType};
//!
//! let d = FormatDescriptor::new(FormatType::MathBold, true);
//! let fragment = format_text("signal", &d);
//! assert_eq!(fragment, "$\\mathbf{signal}$");
//! assert_eq!(parse_fragment(&fragment).unwrap().descriptor, d);
//! ```

pub mod config;
pub mod document;
mod editable;
pub mod entry;
mod error;
pub mod format;
mod group;
pub mod scanner;

pub use config::{ConfigError, GlossaryConfig};
pub use document::{
    parse_document, write_document, Category, DocumentParseResult, EntryParseError,
    GlossaryDocument,
};
pub use editable::{EditableEntry, EditableField, StoredFormats};
pub use entry::{
    entries, entry_body, format_entries, format_entry, parse_entries, parse_entry, GlossaryEntry,
};
pub use error::{ParseError, Result};
pub use format::{
    decode_or_raw, format_field, format_text, parse_fragment, parse_fragment_with, DecodedField,
    FieldKind, FormatDescriptor, FormatType, FormattedText,
};
pub use group::{decode_group, encode_group};
pub use scanner::{
    ambiguous_fields, check_unambiguous, extract_balanced, extract_braced, extract_field,
    is_balanced, Balanced,
};

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
