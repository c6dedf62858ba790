//! Field formatting engine
//!
//! Converts between the editable form of a field (raw text plus a
//! [`FormatDescriptor`]) and the canonical LaTeX fragment written into the
//! glossary entry.
//!
//! | format type        | math mode | encoded as                     |
//! |--------------------|-----------|--------------------------------|
//! | `Normal`           | off       | `text`                         |
//! | `Bold`             | off       | `\textbf{text}`                |
//! | `Italic`           | off       | `\textit{text}`                |
//! | `Normal`           | on        | `$text$`                       |
//! | `MathBold`         | on        | `$\mathbf{text}$`              |
//! | `MathItalic`       | on        | `$\mathit{text}$`              |
//! | `EscapedBackslash` | ignored   | `\textbackslash text`          |
//!
//! Decoding cannot recover `first_letter_bold`; callers that need it persist
//! the descriptor next to the fragment.

use nom::{
    bytes::complete::take_while1,
    character::complete::char,
    sequence::preceded,
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};
use crate::scanner::{braced, first_unbalanced};

/// Math-mode delimiter
pub const MATH_DELIMITER: char = '$';

/// Command that renders a literal backslash
pub const ESCAPE_TOKEN: &str = "\\textbackslash";

pub const BOLD_COMMAND: &str = "\\textbf";
pub const ITALIC_COMMAND: &str = "\\textit";
pub const MATH_BOLD_COMMAND: &str = "\\mathbf";
pub const MATH_ITALIC_COMMAND: &str = "\\mathit";

/// Typographic treatment applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
#[serde(rename_all = "snake_case")]
pub enum FormatType {
    #[default]
    Normal,
    Bold,
    Italic,
    MathBold,
    MathItalic,
    EscapedBackslash,
}

impl FormatType {
    /// All format types, in the order an editor lists them
    pub const ALL: [FormatType; 6] = [
        Self::Normal,
        Self::Bold,
        Self::Italic,
        Self::MathBold,
        Self::MathItalic,
        Self::EscapedBackslash,
    ];

    /// Whether this type may be selected with math mode set to `math_mode`
    pub fn is_valid_in(self, math_mode: bool) -> bool {
        match self {
            Self::Normal => true,
            Self::Bold | Self::Italic => !math_mode,
            Self::MathBold | Self::MathItalic | Self::EscapedBackslash => math_mode,
        }
    }

    /// Format types selectable in the given mode
    pub fn options(math_mode: bool) -> Vec<FormatType> {
        Self::ALL
            .iter()
            .copied()
            .filter(|t| t.is_valid_in(math_mode))
            .collect()
    }

    /// The type to keep after switching math mode: unchanged when still
    /// valid, `Normal` otherwise
    pub fn reset_for_mode(self, math_mode: bool) -> Self {
        if self.is_valid_in(math_mode) {
            self
        } else {
            Self::Normal
        }
    }

    /// Wrapping command, if any
    pub fn command(self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::Bold => Some(BOLD_COMMAND),
            Self::Italic => Some(ITALIC_COMMAND),
            Self::MathBold => Some(MATH_BOLD_COMMAND),
            Self::MathItalic => Some(MATH_ITALIC_COMMAND),
            Self::EscapedBackslash => Some(ESCAPE_TOKEN),
        }
    }

    /// Name used when the descriptor is stored outside the fragment
    pub fn as_str(self) -> &'static str {
        self.command().unwrap_or("normal")
    }

    /// Parse a stored format name (case-insensitive, tolerant of a trailing
    /// `{}` and the legacy `Normale` label)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        let s = s.trim();
        let s = s.strip_suffix("{}").unwrap_or(s);
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.command().is_some_and(|cmd| cmd.eq_ignore_ascii_case(s)))
            .unwrap_or(Self::Normal)
    }

    /// Decode a bare command name (without backslash) into a wrapping type
    fn from_wrapper(name: &str) -> Option<Self> {
        match name {
            "textbf" => Some(Self::Bold),
            "textit" => Some(Self::Italic),
            "mathbf" => Some(Self::MathBold),
            "mathit" => Some(Self::MathItalic),
            _ => None,
        }
    }
}

/// Per-field formatting state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
#[serde(default)]
pub struct FormatDescriptor {
    pub format_type: FormatType,
    pub is_math_mode: bool,
    /// Bold the first letter of every word; only honoured on the `first` field
    pub first_letter_bold: bool,
}

impl FormatDescriptor {
    pub fn new(format_type: FormatType, is_math_mode: bool) -> Self {
        Self {
            format_type,
            is_math_mode,
            first_letter_bold: false,
        }
    }

    /// Descriptor with only the first-letter-bold flag set
    pub fn first_letter_bold() -> Self {
        Self {
            first_letter_bold: true,
            ..Self::default()
        }
    }

    /// Switch math mode, resetting a format type the new mode does not allow
    pub fn set_math_mode(&mut self, math_mode: bool) {
        self.is_math_mode = math_mode;
        self.format_type = self.format_type.reset_for_mode(math_mode);
    }

    /// Copy of this descriptor with the flags `field` does not support cleared
    pub fn for_field(mut self, field: FieldKind) -> Self {
        if field != FieldKind::First {
            self.first_letter_bold = false;
        }
        self
    }
}

/// The formatted fields of a glossary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Name,
    First,
    Text,
    Description,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [Self::Name, Self::First, Self::Text, Self::Description];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::First => "first",
            Self::Text => "text",
            Self::Description => "description",
        }
    }
}

/// Raw text and the descriptor recovered from a fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FormattedText {
    pub text: String,
    pub descriptor: FormatDescriptor,
}

/// Outcome of a best-effort decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct DecodedField {
    pub text: String,
    pub descriptor: FormatDescriptor,
    /// Set when the fragment could not be decoded and was kept verbatim
    pub needs_review: bool,
}

/// Encode raw text into its canonical fragment
pub fn format_text(text: &str, descriptor: &FormatDescriptor) -> String {
    if text.is_empty() {
        return String::new();
    }

    if descriptor.format_type == FormatType::EscapedBackslash {
        return format!("{} {}", ESCAPE_TOKEN, text).trim().to_string();
    }

    let mut result = if descriptor.first_letter_bold {
        bold_first_letters(text)
    } else {
        match descriptor.format_type.command() {
            Some(command) => wrap(command, text),
            None => text.to_string(),
        }
    };

    if descriptor.is_math_mode && !is_math_wrapped(&result) {
        result = format!("{0}{1}{0}", MATH_DELIMITER, result);
    }

    result
}

#[cfg(feature = "uniffi")]
#[uniffi::export]
pub fn format_text_ffi(text: String, descriptor: FormatDescriptor) -> String {
    format_text(&text, &descriptor)
}

/// Encode raw text for a specific entry field
pub fn format_field(field: FieldKind, text: &str, descriptor: &FormatDescriptor) -> String {
    format_text(text, &descriptor.for_field(field))
}

/// Decode a fragment into raw text and a descriptor
///
/// Fails only when the fragment's braces are unbalanced.
pub fn parse_fragment(fragment: &str) -> Result<FormattedText> {
    if let Some(open_at) = first_unbalanced(fragment) {
        return Err(ParseError::UnbalancedDelimiter { open_at });
    }

    if let Some(text) = fragment
        .strip_prefix(ESCAPE_TOKEN)
        .and_then(|rest| rest.strip_prefix(' '))
    {
        return Ok(FormattedText {
            text: text.to_string(),
            descriptor: FormatDescriptor::new(FormatType::EscapedBackslash, true),
        });
    }

    let (inner, is_math_mode) = if is_math_wrapped(fragment) {
        (&fragment[1..fragment.len() - 1], true)
    } else {
        (fragment, false)
    };

    if let Ok(("", (name, content))) = wrapper(inner) {
        if let Some(format_type) = FormatType::from_wrapper(name) {
            let implied_math = matches!(format_type, FormatType::MathBold | FormatType::MathItalic);
            return Ok(FormattedText {
                text: content.to_string(),
                descriptor: FormatDescriptor::new(format_type, is_math_mode || implied_math),
            });
        }
    }

    Ok(FormattedText {
        text: inner.to_string(),
        descriptor: FormatDescriptor::new(FormatType::Normal, is_math_mode),
    })
}

#[cfg(feature = "uniffi")]
#[uniffi::export]
pub fn parse_fragment_ffi(fragment: String) -> Result<FormattedText> {
    parse_fragment(&fragment)
}

/// Recover raw text from a fragment whose descriptor is already known
///
/// Used when the descriptor was persisted next to the fragment. Unlike
/// [`parse_fragment`] this undoes first-letter bolding.
pub fn parse_fragment_with(fragment: &str, descriptor: &FormatDescriptor) -> Result<String> {
    if !descriptor.first_letter_bold || descriptor.format_type == FormatType::EscapedBackslash {
        return parse_fragment(fragment).map(|decoded| decoded.text);
    }
    if let Some(open_at) = first_unbalanced(fragment) {
        return Err(ParseError::UnbalancedDelimiter { open_at });
    }
    let inner = if descriptor.is_math_mode && is_math_wrapped(fragment) {
        &fragment[1..fragment.len() - 1]
    } else {
        fragment
    };
    Ok(unbold_first_letters(inner))
}

/// Decode a fragment, falling back to the verbatim fragment on failure
///
/// A fragment that decodes but would not encode back to the same bytes
/// (`$$`, `\textbf{}`, a trailing space after the escape token) is kept
/// verbatim as well, so editing never rewrites it silently.
pub fn decode_or_raw(fragment: &str) -> DecodedField {
    match parse_fragment(fragment) {
        Ok(decoded) if format_text(&decoded.text, &decoded.descriptor) == fragment => DecodedField {
            text: decoded.text,
            descriptor: decoded.descriptor,
            needs_review: false,
        },
        Ok(_) => {
            tracing::warn!("Keeping non-canonical fragment verbatim: {:?}", fragment);
            DecodedField::verbatim(fragment)
        }
        Err(e) => {
            tracing::warn!("Keeping undecodable fragment verbatim: {}", e);
            DecodedField::verbatim(fragment)
        }
    }
}

impl DecodedField {
    /// The fragment itself, flagged for review
    pub fn verbatim(fragment: &str) -> Self {
        Self {
            text: fragment.to_string(),
            descriptor: FormatDescriptor::default(),
            needs_review: true,
        }
    }
}

/// Whether `s` starts and ends with the math delimiter
pub fn is_math_wrapped(s: &str) -> bool {
    s.len() >= 2 && s.starts_with(MATH_DELIMITER) && s.ends_with(MATH_DELIMITER)
}

fn wrap(command: &str, text: &str) -> String {
    format!("{}{{{}}}", command, text)
}

/// `\command{content}` at the start of the input
fn wrapper(input: &str) -> IResult<&str, (&str, &str)> {
    let (rest, name) = preceded(char('\\'), take_while1(|c: char| c.is_ascii_alphabetic()))(input)?;
    let (rest, content) = braced(rest)?;
    Ok((rest, (name, content)))
}

/// Bold the first letter of each word
///
/// In a word holding both `(` and `)` only the part before the `(` counts;
/// the word is left alone when that part is empty.
fn bold_first_letters(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            if word.starts_with(ESCAPE_TOKEN) || is_math_wrapped(word) {
                return word.to_string();
            }
            let head = match word.find('(') {
                Some(paren) if word.contains(')') => &word[..paren],
                _ => word,
            };
            let mut chars = head.chars();
            match chars.next() {
                Some(first) => format!(
                    "{}{{{}}}{}",
                    BOLD_COMMAND,
                    first,
                    &word[first.len_utf8()..]
                ),
                None => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inverse of [`bold_first_letters`] for the words it rewrites
fn unbold_first_letters(text: &str) -> String {
    let prefix = format!("{}{{", BOLD_COMMAND);
    text.split_whitespace()
        .map(|word| {
            let Some(rest) = word.strip_prefix(&prefix) else {
                return word.to_string();
            };
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(first), Some('}')) if first != '}' => format!("{}{}", first, chars.as_str()),
                _ => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
