//! Snapshot tests for exported glossary markup

use glossary_tex::{
    format_entries, format_entry, write_document, FieldKind, GlossaryConfig, GlossaryDocument,
    GlossaryEntry,
};
use insta::assert_snapshot;

fn entry(key: &str, name: &str, first: &str, description: &str) -> GlossaryEntry {
    let mut entry = GlossaryEntry::new(key);
    entry.set_field(FieldKind::Name, name);
    entry.set_field(FieldKind::First, first);
    entry.set_field(FieldKind::Text, name);
    entry.set_field(FieldKind::Description, description);
    entry
}

#[test]
fn test_snapshot_entry() {
    let mut e = entry("NMR", "NMR", "nuclear magnetic resonance", "A technique.");
    e.group = Some("Spectroscopy".to_string());
    assert_snapshot!(format_entry(&e, &GlossaryConfig::default()), @r"
\newglossaryentry{NMR}{
    type=\acronymtype,
    name={NMR},
    first={nuclear magnetic resonance},
    text={NMR},
    description={A technique.},
    group={Spectroscopy}
}
");
}

#[test]
fn test_snapshot_entries_separated_by_blank_line() {
    let entries = [
        entry("A", "A", "alpha", "First."),
        entry("B", "B", "beta", "Second."),
    ];
    let formatted = format_entries(&entries, &GlossaryConfig::default());
    assert!(formatted.contains("}\n\n\\newglossaryentry{B}{"));
    assert_snapshot!(formatted, @r"
\newglossaryentry{A}{
    type=\acronymtype,
    name={A},
    first={alpha},
    text={A},
    description={First.}
}

\newglossaryentry{B}{
    type=\acronymtype,
    name={B},
    first={beta},
    text={B},
    description={Second.}
}
");
}

#[test]
fn test_snapshot_document() {
    let mut document = GlossaryDocument::new();
    let physics = document.category_mut("Physics");
    physics.comment = Some("Terms from the physics chapters".to_string());
    physics.insert_entry(entry("B", "$\\mathbf{B}$", "$\\mathbf{B}$", "Magnetic field."));

    let exported = write_document(&document, &GlossaryConfig::default());
    assert_snapshot!(exported.trim_end(), @r"
%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%
% DEFINIZIONI Physics
%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%
% Terms from the physics chapters

\newglossaryentry{B}{
    type=\acronymtype,
    name={$\mathbf{B}$},
    first={$\mathbf{B}$},
    text={$\mathbf{B}$},
    description={Magnetic field.}
}
");
}
