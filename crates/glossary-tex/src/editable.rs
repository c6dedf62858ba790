//! Editable view of a glossary entry
//!
//! An editor works on raw text plus a [`FormatDescriptor`] per field. This
//! module decodes stored fragments into that form and encodes them back.
//! Descriptors persisted next to the fragments take precedence over what
//! can be recovered from the fragment itself.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entry::GlossaryEntry;
use crate::format::{
    decode_or_raw, format_field, format_text, parse_fragment_with, DecodedField, FieldKind,
    FormatDescriptor,
};
use crate::group::decode_group;

/// Descriptors stored separately from the fragments, keyed by field
pub type StoredFormats = HashMap<FieldKind, FormatDescriptor>;

/// One field as shown in the editor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct EditableField {
    pub text: String,
    pub descriptor: FormatDescriptor,
    /// The stored fragment could not be decoded and is shown verbatim
    pub needs_review: bool,
}

impl EditableField {
    pub fn new(text: impl Into<String>, descriptor: FormatDescriptor) -> Self {
        Self {
            text: text.into(),
            descriptor,
            needs_review: false,
        }
    }

    /// Decode a stored fragment, preferring a separately stored descriptor
    pub fn decode(fragment: &str, stored: Option<&FormatDescriptor>) -> Self {
        let Some(descriptor) = stored else {
            return decode_or_raw(fragment).into();
        };
        match parse_fragment_with(fragment, descriptor) {
            Ok(text) if format_text(&text, descriptor) == fragment => Self::new(text, *descriptor),
            Ok(_) => {
                tracing::warn!(
                    "Stored format does not reproduce fragment, keeping it verbatim: {:?}",
                    fragment
                );
                DecodedField::verbatim(fragment).into()
            }
            Err(e) => {
                tracing::warn!("Keeping undecodable fragment verbatim: {}", e);
                DecodedField::verbatim(fragment).into()
            }
        }
    }

    /// Encode for `kind`
    pub fn encode(&self, kind: FieldKind) -> String {
        if self.needs_review {
            return self.text.clone();
        }
        format_field(kind, &self.text, &self.descriptor)
    }
}

impl From<DecodedField> for EditableField {
    fn from(decoded: DecodedField) -> Self {
        Self {
            text: decoded.text,
            descriptor: decoded.descriptor,
            needs_review: decoded.needs_review,
        }
    }
}

/// An entry loaded into the editor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct EditableEntry {
    pub key: String,
    pub category: String,
    pub entry_type: Option<String>,
    pub name: EditableField,
    pub first: EditableField,
    pub text: EditableField,
    pub description: EditableField,
    /// Bare group label, without the `\group{}` wrapper
    pub group: String,
    pub math_mode: bool,
}

impl EditableEntry {
    /// Decode a parsed entry for editing
    pub fn from_entry(entry: &GlossaryEntry, category: &str, stored: &StoredFormats) -> Self {
        let decode = |kind: FieldKind| {
            EditableField::decode(entry.field(kind).unwrap_or_default(), stored.get(&kind))
        };
        Self {
            key: entry.key.clone(),
            category: category.to_string(),
            entry_type: entry.entry_type.clone(),
            name: decode(FieldKind::Name),
            first: decode(FieldKind::First),
            text: decode(FieldKind::Text),
            description: decode(FieldKind::Description),
            group: entry.group.as_deref().map(decode_group).unwrap_or_default().to_string(),
            math_mode: entry.is_math,
        }
    }

    pub fn field(&self, kind: FieldKind) -> &EditableField {
        match kind {
            FieldKind::Name => &self.name,
            FieldKind::First => &self.first,
            FieldKind::Text => &self.text,
            FieldKind::Description => &self.description,
        }
    }

    pub fn field_mut(&mut self, kind: FieldKind) -> &mut EditableField {
        match kind {
            FieldKind::Name => &mut self.name,
            FieldKind::First => &mut self.first,
            FieldKind::Text => &mut self.text,
            FieldKind::Description => &mut self.description,
        }
    }

    /// Toggle math mode on the name, first and text fields
    ///
    /// Format types the new mode does not allow fall back to `Normal`.
    pub fn set_math_mode(&mut self, math_mode: bool) {
        self.math_mode = math_mode;
        for kind in [FieldKind::Name, FieldKind::First, FieldKind::Text] {
            self.field_mut(kind).descriptor.set_math_mode(math_mode);
        }
    }

    /// Whether any field was loaded verbatim and needs a manual look
    pub fn needs_review(&self) -> bool {
        FieldKind::ALL.iter().any(|kind| self.field(*kind).needs_review)
    }

    /// Descriptors to persist alongside the encoded fragments
    pub fn formats(&self) -> StoredFormats {
        FieldKind::ALL
            .iter()
            .map(|kind| (*kind, self.field(*kind).descriptor.for_field(*kind)))
            .collect()
    }

    /// Encode the edited fields back into a parsed entry
    pub fn to_entry(&self) -> GlossaryEntry {
        let mut entry = GlossaryEntry::new(self.key.trim());
        entry.entry_type = self.entry_type.clone();
        for kind in FieldKind::ALL {
            entry.set_field(kind, self.field(kind).encode(kind));
        }
        let label = decode_group(&self.group);
        if !label.is_empty() {
            entry.group = Some(label.to_string());
        }
        entry
    }
}
