use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Notebook {
    pub title: String,
    pub author: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlight {
    /// Empty when the color span is missing or malformed.
    pub color: String,
    /// Zero when the export has no page numbers.
    pub page: u32,
    pub location: u32,
    pub text: String,
    /// Empty when no note is attached.
    pub note: String,
}

impl Notebook {
    pub fn highlight_count(&self) -> usize {
        self.sections.iter().map(|s| s.highlights.len()).sum()
    }

    pub fn note_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.highlights.iter())
            .filter(|h| h.has_note())
            .count()
    }
}

impl Highlight {
    pub fn has_note(&self) -> bool {
        !self.note.is_empty()
    }
}

/// Plain-text outline of the notebook, used for verbose diagnostics.
impl fmt::Display for Notebook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "'{}' by {}", self.title, self.author)?;
        for (i, section) in self.sections.iter().enumerate() {
            writeln!(f, "Section {:02}: {}", i + 1, section.title)?;
            for (j, h) in section.highlights.iter().enumerate() {
                writeln!(f, "Highlight {:02}-{}", i + 1, j + 1)?;
                writeln!(f, "\tText: {}", h.text)?;
                writeln!(f, "\tNote: {}", h.note)?;
            }
        }
        Ok(())
    }
}
