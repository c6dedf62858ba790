//! Whole-document import and export
//!
//! A glossary document is a sequence of categories, each introduced by a
//! header framed by two banner lines and optionally followed by a one-line
//! comment:
//!
//! ```text
//! %%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%
//! % DEFINIZIONI Physics
//! %%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%
//! % Terms from the physics chapters
//!
//! \newglossaryentry{NMR}{
//!     ...
//! }
//! ```
//!
//! Splitting on the banner yields the header in one section and the comment
//! plus entries in the next, so the comment is found by looking one section
//! ahead of the header.

use nom::{
    bytes::complete::{tag, take_while, take_while1},
    character::complete::space1,
    IResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GlossaryConfig;
use crate::entry::{entries, entry_body, format_entry, line_of, GlossaryEntry};
use crate::group::{decode_group, encode_group};
use crate::scanner::check_unambiguous;

/// A named category of entries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub comment: Option<String>,
    /// Stored group annotation, `\group{label}`
    pub group: Option<String>,
    pub entries: Vec<GlossaryEntry>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Bare group label, if any
    pub fn group_label(&self) -> Option<&str> {
        self.group
            .as_deref()
            .map(decode_group)
            .filter(|label| !label.is_empty())
    }

    /// Store a group label; an empty label clears the group
    pub fn set_group(&mut self, label: &str) {
        self.group = encode_group(label);
    }

    /// Find an entry by key (case-insensitive)
    pub fn entry(&self, key: &str) -> Option<&GlossaryEntry> {
        self.entries.iter().find(|e| e.key.eq_ignore_ascii_case(key))
    }

    /// Insert an entry, replacing one whose key matches case-insensitively
    ///
    /// Returns the replaced entry.
    pub fn insert_entry(&mut self, entry: GlossaryEntry) -> Option<GlossaryEntry> {
        match self
            .entries
            .iter_mut()
            .find(|e| e.key.eq_ignore_ascii_case(&entry.key))
        {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// Remove an entry by key (case-insensitive)
    pub fn remove_entry(&mut self, key: &str) -> Option<GlossaryEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.key.eq_ignore_ascii_case(key))?;
        Some(self.entries.remove(idx))
    }
}

/// All categories of a glossary
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlossaryDocument {
    pub categories: Vec<Category>,
}

impl GlossaryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a category by name (case-insensitive)
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Find a category by name (case-insensitive), creating it if missing
    pub fn category_mut(&mut self, name: &str) -> &mut Category {
        let idx = match self
            .categories
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
        {
            Some(idx) => idx,
            None => {
                self.categories.push(Category::new(name));
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx]
    }

    /// Remove a category by name (case-insensitive)
    pub fn remove_category(&mut self, name: &str) -> Option<Category> {
        let idx = self
            .categories
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))?;
        Some(self.categories.remove(idx))
    }

    /// Total number of entries across categories
    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(|c| c.entries.len()).sum()
    }
}

/// An entry that failed to parse during import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryParseError {
    /// Byte offset of the entry marker in the document
    pub offset: usize,
    pub line: u32,
    pub message: String,
}

/// Result of importing a document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentParseResult {
    pub document: GlossaryDocument,
    pub errors: Vec<EntryParseError>,
}

/// Import every category and entry from a glossary document
pub fn parse_document(source: &str, config: &GlossaryConfig) -> DocumentParseResult {
    let mut result = DocumentParseResult::default();
    let sections = split_sections(source, &config.banner());
    let mut current = config.default_category.clone();

    for (i, (section_start, section)) in sections.iter().enumerate() {
        if section.trim().is_empty() {
            continue;
        }

        let header = section
            .lines()
            .find_map(|line| category_header(line.trim(), &config.section_keyword));

        if let Some(name) = header {
            debug!("Found category header: {}", name);
            let comment = sections
                .get(i + 1)
                .and_then(|(_, next)| next.trim().lines().next())
                .map(str::trim)
                .filter(|line| line.starts_with('%'))
                .map(|line| line.trim_start_matches('%').trim().to_string())
                .filter(|comment| !comment.is_empty());

            let category = result.document.category_mut(name);
            category.comment = comment;
            current = category.name.clone();
        }

        let starts_with_header = section
            .trim()
            .lines()
            .next()
            .is_some_and(|line| category_header(line.trim(), &config.section_keyword).is_some());
        if starts_with_header {
            continue;
        }

        for (offset, parsed) in entries(section, &config.entry_marker) {
            let global = section_start + offset;
            match parsed {
                Ok(entry) => {
                    if let Err(e) = entry_body(section, offset).and_then(check_unambiguous) {
                        warn!(
                            "Entry {} at line {}: {}",
                            entry.key,
                            line_of(source, global),
                            e
                        );
                    }
                    add_entry(&mut result.document, &current, entry);
                }
                Err(e) => {
                    let line = line_of(source, global);
                    warn!("Skipping entry at line {} (byte {}): {}", line, global, e);
                    result.errors.push(EntryParseError {
                        offset: global,
                        line,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    result
}

fn add_entry(document: &mut GlossaryDocument, category_name: &str, entry: GlossaryEntry) {
    let category = document.category_mut(category_name);
    if category.group.is_none() {
        if let Some(label) = entry.group_label() {
            category.group = encode_group(label);
        }
    }
    if let Some(replaced) = category.insert_entry(entry) {
        debug!(
            "Entry {} replaced an earlier definition in {}",
            replaced.key, category.name
        );
    }
}

/// Split on banner lines, keeping each section's byte offset
fn split_sections<'a>(source: &'a str, banner: &str) -> Vec<(usize, &'a str)> {
    let mut sections = Vec::new();
    let mut start = 0;
    for (idx, _) in source.match_indices(banner) {
        sections.push((start, &source[start..idx]));
        start = idx + banner.len();
    }
    sections.push((start, &source[start..]));
    sections
}

/// Category name from a `% <keyword> <name>` header line
fn category_header<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let (_, name) = header_line(line, keyword).ok()?;
    let name = name.trim_end_matches('%').trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn header_line<'a>(input: &'a str, keyword: &str) -> IResult<&'a str, &'a str> {
    let (rest, _) = take_while1(|c: char| c == '%')(input)?;
    let (rest, _) = take_while(|c: char| c == ' ' || c == '\t')(rest)?;
    let (rest, _) = tag(keyword)(rest)?;
    let (rest, _) = space1(rest)?;
    Ok((&rest[rest.len()..], rest))
}

/// Export a document in the canonical layout
///
/// Categories are sorted by name and entries by key. A category's group
/// takes precedence over an entry's own group label.
pub fn write_document(document: &GlossaryDocument, config: &GlossaryConfig) -> String {
    let banner = config.banner();
    let mut categories: Vec<&Category> = document
        .categories
        .iter()
        .filter(|c| {
            !(config.skip_default_category_on_export
                && c.name.eq_ignore_ascii_case(&config.default_category))
        })
        .collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));

    let mut content = String::new();
    for category in categories {
        content.push_str(&banner);
        content.push('\n');
        content.push_str(&format!("% {} {}\n", config.section_keyword, category.name));
        content.push_str(&banner);
        content.push('\n');

        if let Some(comment) = category.comment.as_deref().map(str::trim) {
            if !comment.is_empty() {
                let single_line = comment.lines().map(str::trim).collect::<Vec<_>>().join(" ");
                content.push_str(&format!("% {}\n", single_line));
            }
        }
        content.push('\n');

        let mut entries: Vec<&GlossaryEntry> = category.entries.iter().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        for entry in entries {
            let mut entry = entry.clone();
            if let Some(label) = category.group_label() {
                entry.group = Some(label.to_string());
            }
            content.push_str(&format_entry(&entry, config));
            content.push_str("\n\n");
        }
    }
    content
}
