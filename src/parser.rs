use crate::dom::{class_attr, find_first_by_class, first_child_text, parse_html_str, text_of};
use crate::models::{Highlight, Notebook, Section};
use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;
use std::sync::LazyLock;

pub const BODY_CONTAINER_CLASS: &str = "bodyContainer";
pub const SECTION_CLASS: &str = "sectionHeading";
pub const HEADING_CLASS: &str = "noteHeading";
pub const TEXT_CLASS: &str = "noteText";
pub const AUTHOR_CLASS: &str = "authors";
pub const TITLE_CLASS: &str = "bookTitle";

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Location (\d+)").unwrap());
static PAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Page (\d+)").unwrap());

#[derive(Debug, PartialEq)]
pub enum ParseError {
    NoBodyContainer,
    InvalidNumber { field: &'static str, value: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::NoBodyContainer => {
                write!(f, "expected element with class=\"{}\"", BODY_CONTAINER_CLASS)
            }
            ParseError::InvalidNumber { field, value } => {
                write!(f, "invalid {} number in highlight heading: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Class labels recognized on the direct children of the body container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Section,
    Heading,
    Text,
    Author,
    Title,
    Other,
}

impl NodeClass {
    pub fn from_label(label: &str) -> Self {
        match label {
            SECTION_CLASS => NodeClass::Section,
            HEADING_CLASS => NodeClass::Heading,
            TEXT_CLASS => NodeClass::Text,
            AUTHOR_CLASS => NodeClass::Author,
            TITLE_CLASS => NodeClass::Title,
            _ => NodeClass::Other,
        }
    }

    pub fn of(node: &Handle) -> Self {
        Self::from_label(&class_attr(node))
    }
}

/// What a `noteHeading` element announces: a new highlight, or the note
/// attached to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingKind {
    Highlight,
    Note,
    Other,
}

impl HeadingKind {
    pub fn of(node: &Handle) -> Self {
        let text = first_child_text(node);
        let text = text.trim_start();
        if text.starts_with("Highlight") {
            HeadingKind::Highlight
        } else if text.starts_with("Note") {
            HeadingKind::Note
        } else {
            HeadingKind::Other
        }
    }
}

/// Parses an exported notebook held in memory.
pub fn parse_notebook(html: &str) -> Result<Notebook, ParseError> {
    let dom = parse_html_str(html);
    parse_document(&dom.document)
}

/// Extracts the notebook from a parsed document. The body container's
/// children are a flat list; the section/highlight nesting is rebuilt from
/// their order alone.
pub fn parse_document(root: &Handle) -> Result<Notebook, ParseError> {
    let container =
        find_first_by_class(root, BODY_CONTAINER_CLASS).ok_or(ParseError::NoBodyContainer)?;

    let mut builder = NotebookBuilder::default();
    for child in container.children.borrow().iter() {
        builder.visit(child)?;
    }

    Ok(builder.finish())
}

/// Reads color, page and location from a highlight heading such as
///
/// ```html
/// <div class="noteHeading">
///     Highlight(<span class="highlight_yellow">yellow</span>) - Ch. 10 > Page 115 · Location 954
/// </div>
/// ```
///
/// Text and note are left empty for the caller to fill in.
pub fn parse_highlight_header(node: &Handle) -> Result<Highlight, ParseError> {
    let mut h = Highlight::default();

    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { .. } => {
                let text = text_of(child).unwrap_or_default();
                if let Some(caps) = LOCATION_RE.captures(&text) {
                    h.location = parse_number("location", &caps[1])?;
                }
                if let Some(caps) = PAGE_RE.captures(&text) {
                    h.page = parse_number("page", &caps[1])?;
                }
            }
            NodeData::Element { .. } => {
                // The color span is classed highlight_<color>
                let label = class_attr(child);
                match label.split_once('_') {
                    Some((_, color)) => h.color = color.to_string(),
                    None => log::debug!("highlight color class '{}' has no color suffix", label),
                }
            }
            _ => {}
        }
    }

    if h.location == 0 {
        log::warn!("highlight heading without a location");
    }

    Ok(h)
}

/// Trimmed text of a `noteText` element. Any other node yields "".
pub fn extract_text(node: &Handle) -> String {
    if NodeClass::of(node) != NodeClass::Text {
        return String::new();
    }
    first_child_text(node).trim().to_string()
}

fn parse_number(field: &'static str, digits: &str) -> Result<u32, ParseError> {
    digits.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: digits.to_string(),
    })
}

#[derive(Default)]
struct NotebookBuilder {
    notebook: Notebook,
    section: Option<Section>,
    highlight: Option<Highlight>,
    // Set by a "Note" heading: the next text body belongs to the note of the
    // current highlight, not to a new highlight.
    expecting_note: bool,
}

impl NotebookBuilder {
    fn visit(&mut self, node: &Handle) -> Result<(), ParseError> {
        match NodeClass::of(node) {
            NodeClass::Section => {
                self.flush();
                self.section = Some(Section {
                    title: first_child_text(node).trim().to_string(),
                    highlights: Vec::new(),
                });
            }
            NodeClass::Heading => match HeadingKind::of(node) {
                HeadingKind::Highlight => {
                    self.flush_highlight();
                    self.highlight = Some(parse_highlight_header(node)?);
                }
                HeadingKind::Note => self.expecting_note = true,
                HeadingKind::Other => {}
            },
            NodeClass::Text => {
                let text = extract_text(node);
                let into_note = std::mem::take(&mut self.expecting_note);
                match self.highlight.as_mut() {
                    Some(h) if into_note => h.note = text,
                    Some(h) => h.text = text,
                    None => log::warn!("dropping text with no highlight before it: '{}'", text),
                }
            }
            NodeClass::Author => self.notebook.author = first_child_text(node).trim().to_string(),
            NodeClass::Title => self.notebook.title = first_child_text(node).trim().to_string(),
            NodeClass::Other => {}
        }
        Ok(())
    }

    /// Moves the current highlight into the current section, opening an
    /// untitled section if the export has highlights before any heading.
    fn flush_highlight(&mut self) {
        if let Some(h) = self.highlight.take() {
            self.section
                .get_or_insert_with(Section::default)
                .highlights
                .push(h);
        }
    }

    /// Closes the current section. Runs on every section start and once at
    /// the end of input; absent cursors are skipped, never pushed as blanks.
    fn flush(&mut self) {
        self.flush_highlight();
        if let Some(section) = self.section.take() {
            self.notebook.sections.push(section);
        }
    }

    fn finish(mut self) -> Notebook {
        self.flush();
        self.notebook
    }
}
