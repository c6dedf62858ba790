//! Glossary entry parsing and serialization
//!
//! An entry looks like:
//!
//! ```text
//! \newglossaryentry{NMR}{
//!     type=\acronymtype,
//!     name={NMR},
//!     first={nuclear magnetic resonance (NMR)},
//!     text={NMR},
//!     description={A spectroscopic technique.},
//!     group={Physics}
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::config::GlossaryConfig;
use crate::error::{ParseError, Result};
use crate::format::{FieldKind, MATH_DELIMITER};
use crate::group::decode_group;
use crate::scanner::{extract_braced, extract_field};

/// A parsed glossary entry; field values are canonical fragments
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct GlossaryEntry {
    pub key: String,
    pub entry_type: Option<String>,
    pub name: Option<String>,
    pub first: Option<String>,
    pub text: Option<String>,
    pub description: Option<String>,
    pub group: Option<String>,
    /// `name` is fully wrapped in math delimiters
    pub is_math: bool,
}

impl GlossaryEntry {
    /// Create an empty entry
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Get a formatted field's fragment
    pub fn field(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::Name => self.name.as_deref(),
            FieldKind::First => self.first.as_deref(),
            FieldKind::Text => self.text.as_deref(),
            FieldKind::Description => self.description.as_deref(),
        }
    }

    /// Get a formatted field's fragment, failing when it is absent
    pub fn require(&self, kind: FieldKind) -> Result<&str> {
        self.field(kind)
            .ok_or_else(|| ParseError::FieldNotFound(kind.as_str().to_string()))
    }

    /// Set a formatted field's fragment; setting `name` refreshes `is_math`
    pub fn set_field(&mut self, kind: FieldKind, value: impl Into<String>) {
        let value = Some(value.into());
        match kind {
            FieldKind::Name => {
                self.name = value;
                self.is_math = name_is_math(self.name.as_deref());
            }
            FieldKind::First => self.first = value,
            FieldKind::Text => self.text = value,
            FieldKind::Description => self.description = value,
        }
    }

    /// The group label without any `\group{}` wrapper, if non-empty
    pub fn group_label(&self) -> Option<&str> {
        self.group
            .as_deref()
            .map(decode_group)
            .filter(|label| !label.is_empty())
    }
}

/// Whether a `name` fragment both starts and ends with the math delimiter
pub fn name_is_math(name: Option<&str>) -> bool {
    name.is_some_and(|n| !n.is_empty() && n.starts_with(MATH_DELIMITER) && n.ends_with(MATH_DELIMITER))
}

/// Parse the entry whose marker starts at (or before) `start`
///
/// The key is the first balanced group after `start`, the body is the next
/// balanced group after the key. Missing fields are left as `None`.
pub fn parse_entry(source: &str, start: usize) -> Result<GlossaryEntry> {
    let (key, body) = locate(source, start)?;

    let field = |name: &str| extract_field(body, name).map(str::to_string);
    let name = field("name");

    Ok(GlossaryEntry {
        key: key.to_string(),
        entry_type: field("type"),
        is_math: name_is_math(name.as_deref()),
        name,
        first: field("first"),
        text: field("text"),
        description: field("description"),
        group: field("group"),
    })
}

#[cfg(feature = "uniffi")]
#[uniffi::export]
pub fn parse_entry_ffi(source: String, start: u64) -> Result<GlossaryEntry> {
    parse_entry(&source, start as usize)
}

/// Raw body text of the entry at `start`, between its outer braces
pub fn entry_body(source: &str, start: usize) -> Result<&str> {
    locate(source, start).map(|(_, body)| body)
}

/// Find the trimmed key and the body of the entry at `start`
fn locate(source: &str, start: usize) -> Result<(&str, &str)> {
    let key = extract_braced(source, start).map_err(|e| e.into_malformed(start, "key"))?;
    let key_text = key.content.trim();
    if key_text.is_empty() {
        return Err(ParseError::MalformedEntry {
            offset: start,
            reason: "empty key".to_string(),
        });
    }

    let body = extract_braced(source, key.close + 1).map_err(|e| e.into_malformed(start, "body"))?;
    if body.content.trim().is_empty() {
        return Err(ParseError::MalformedEntry {
            offset: start,
            reason: "empty body".to_string(),
        });
    }

    Ok((key_text, body.content))
}

/// Iterator over every entry marker in a source text, in source order
///
/// Yields the marker offset with the parse outcome. A failing entry does
/// not stop the scan; the cursor always moves past the marker.
pub struct Entries<'a> {
    source: &'a str,
    marker: &'a str,
    pos: usize,
}

impl<'a> Iterator for Entries<'a> {
    type Item = (usize, Result<GlossaryEntry>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.marker.is_empty() {
            return None;
        }
        let found = self.source.get(self.pos..)?.find(self.marker)?;
        let offset = self.pos + found;
        self.pos = offset + self.marker.len();
        Some((offset, parse_entry(self.source, offset)))
    }
}

/// Enumerate the entries introduced by `marker` in `source`
pub fn entries<'a>(source: &'a str, marker: &'a str) -> Entries<'a> {
    Entries {
        source,
        marker,
        pos: 0,
    }
}

/// Parse every entry in `source`, keeping failures alongside successes
pub fn parse_entries(source: &str, config: &GlossaryConfig) -> Vec<(usize, Result<GlossaryEntry>)> {
    entries(source, &config.entry_marker).collect()
}

/// Serialize an entry in the canonical layout
pub fn format_entry(entry: &GlossaryEntry, config: &GlossaryConfig) -> String {
    let indent = config.indentation();
    let entry_type = entry
        .entry_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(config.default_entry_type.as_str());

    let mut lines = vec![format!("{}type={}", indent, entry_type)];
    for kind in FieldKind::ALL {
        lines.push(format!(
            "{}{}={{{}}}",
            indent,
            kind.as_str(),
            entry.field(kind).unwrap_or_default()
        ));
    }
    if let Some(label) = entry.group_label() {
        lines.push(format!("{}group={{{}}}", indent, label));
    }

    format!(
        "{}{{{}}}{{\n{}\n}}",
        config.entry_marker,
        entry.key,
        lines.join(",\n")
    )
}

#[cfg(feature = "uniffi")]
#[uniffi::export]
pub fn format_entry_ffi(entry: GlossaryEntry, config: GlossaryConfig) -> String {
    format_entry(&entry, &config)
}

/// Serialize several entries separated by blank lines
pub fn format_entries(entries: &[GlossaryEntry], config: &GlossaryConfig) -> String {
    entries
        .iter()
        .map(|e| format_entry(e, config))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 1-based line number of a byte offset
pub(crate) fn line_of(source: &str, offset: usize) -> u32 {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "\\newglossaryentry{TRM}{\ntype=acronymtype,\nname={Term},\nfirst={Term},\ntext={Term},\ndescription={A term.}\n}";

    #[test]
    fn test_parse_simple_entry() {
        let entry = parse_entry(SIMPLE, 0).unwrap();
        assert_eq!(entry.key, "TRM");
        assert_eq!(entry.entry_type.as_deref(), Some("acronymtype"));
        assert_eq!(entry.name.as_deref(), Some("Term"));
        assert_eq!(entry.first.as_deref(), Some("Term"));
        assert_eq!(entry.text.as_deref(), Some("Term"));
        assert_eq!(entry.description.as_deref(), Some("A term."));
        assert_eq!(entry.group, None);
        assert!(!entry.is_math);
    }

    #[test]
    fn test_parse_math_entry() {
        let source = "\\newglossaryentry{v}{type=main, name={$\\mathbf{v}$}, text={$v$}}";
        let entry = parse_entry(source, 0).unwrap();
        assert!(entry.is_math);
        assert_eq!(entry.name.as_deref(), Some("$\\mathbf{v}$"));
        assert_eq!(entry.first, None);
    }

    #[test]
    fn test_parse_group() {
        let source = "\\newglossaryentry{k}{name={N}, group={\\group{Physics}}}";
        let entry = parse_entry(source, 0).unwrap();
        assert_eq!(entry.group.as_deref(), Some("\\group{Physics}"));
        assert_eq!(entry.group_label(), Some("Physics"));
    }

    #[test]
    fn test_require_missing_field() {
        let source = "\\newglossaryentry{v}{type=main, name={$\\mathbf{v}$}, text={$v$}}";
        let entry = parse_entry(source, 0).unwrap();
        assert_eq!(entry.require(FieldKind::Text), Ok("$v$"));
        assert_eq!(
            entry.require(FieldKind::First),
            Err(ParseError::FieldNotFound("first".to_string()))
        );
        assert_eq!(
            entry.require(FieldKind::First).unwrap_err().to_string(),
            "field not found: first"
        );
    }

    #[test]
    fn test_missing_body_is_malformed() {
        let err = parse_entry("\\newglossaryentry{k}", 0).unwrap_err();
        assert!(matches!(err, ParseError::MalformedEntry { offset: 0, .. }));
    }

    #[test]
    fn test_unbalanced_body_is_malformed() {
        let err = parse_entry("\\newglossaryentry{k}{name={N}", 0).unwrap_err();
        match err {
            ParseError::MalformedEntry { reason, .. } => assert!(reason.starts_with("body")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_key_is_malformed() {
        assert!(parse_entry("\\newglossaryentry{ }{name={N}}", 0).is_err());
    }

    #[test]
    fn test_entries_skip_failures() {
        let source = format!(
            "{}\n\\newglossaryentry{{}}{{name={{X}}}}\n{}",
            SIMPLE,
            SIMPLE.replace("TRM", "TWO")
        );
        let results: Vec<_> = entries(&source, "\\newglossaryentry").collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].1.as_ref().unwrap().key, "TRM");
        assert!(results[1].1.is_err());
        assert_eq!(results[2].1.as_ref().unwrap().key, "TWO");
    }

    #[test]
    fn test_format_entry_layout() {
        let entry = parse_entry(SIMPLE, 0).unwrap();
        let formatted = format_entry(&entry, &GlossaryConfig::default());
        assert_eq!(
            formatted,
            "\\newglossaryentry{TRM}{\n    type=acronymtype,\n    name={Term},\n    first={Term},\n    text={Term},\n    description={A term.}\n}"
        );
    }

    #[test]
    fn test_format_entry_defaults_and_group() {
        let mut entry = GlossaryEntry::new("k");
        entry.set_field(FieldKind::Name, "$x$");
        entry.group = Some("\\group{Maths}".to_string());
        assert!(entry.is_math);

        let formatted = format_entry(&entry, &GlossaryConfig::default());
        assert!(formatted.contains("    type=\\acronymtype,\n"));
        assert!(formatted.contains("    first={},\n"));
        assert!(formatted.ends_with("    group={Maths}\n}"));
    }

    #[test]
    fn test_format_then_parse_preserves_fields() {
        let mut entry = GlossaryEntry::new("NMR");
        entry.entry_type = Some("\\acronymtype".to_string());
        entry.set_field(FieldKind::Name, "NMR");
        entry.set_field(FieldKind::First, "\\textbf{n}uclear (NMR)");
        entry.set_field(FieldKind::Text, "NMR");
        entry.set_field(FieldKind::Description, "Uses {nested} braces.");
        entry.group = Some("Physics".to_string());

        let formatted = format_entry(&entry, &GlossaryConfig::default());
        assert_eq!(parse_entry(&formatted, 0).unwrap(), entry);
    }

    #[test]
    fn test_entry_body() {
        assert_eq!(
            entry_body("\\newglossaryentry{k}{ name={N} }", 0).unwrap(),
            " name={N} "
        );
    }

    #[test]
    fn test_line_of() {
        assert_eq!(line_of("a\nb\nc", 0), 1);
        assert_eq!(line_of("a\nb\nc", 2), 2);
        assert_eq!(line_of("a\nb\nc", 100), 3);
    }
}
