//! Domain types for representing an opened word-processing document.

use serde::{Deserialize, Serialize};

/// An opened document: its body paragraphs in order, plus the run format of
/// the default paragraph style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Body paragraphs in document order.
    pub paragraphs: Vec<Paragraph>,

    /// Font of the document's default paragraph style.
    ///
    /// This is the fallback appearance of any run without explicit overrides.
    pub default_font: RunFormat,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from a list of paragraphs.
    pub fn with_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            default_font: RunFormat::default(),
        }
    }

    /// Effective text of every paragraph, in order.
    pub fn texts(&self) -> Vec<String> {
        self.paragraphs.iter().map(Paragraph::text).collect()
    }
}

/// Font size stored in half-points, the unit OOXML uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontSize(u32);

impl FontSize {
    /// Font size from whole points.
    pub const fn from_points(points: u32) -> Self {
        Self(points * 2)
    }

    /// Font size from half-points.
    pub const fn from_half_points(half_points: u32) -> Self {
        Self(half_points)
    }

    pub fn half_points(self) -> u32 {
        self.0
    }

}

/// A length in twentieths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Twips(i32);

impl Twips {
    /// Twips in one inch.
    pub const PER_INCH: i32 = 1440;

    pub const fn new(twips: i32) -> Self {
        Self(twips)
    }

    /// Length from inches, rounded to the nearest twip.
    pub fn from_inches(inches: f64) -> Self {
        Self((inches * f64::from(Self::PER_INCH)).round() as i32)
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
    /// Both edges flush.
    Justify,
    /// A value this model does not interpret, kept as written.
    Other(String),
}

/// Run-level character formatting.
///
/// `None` means the value is inherited from the paragraph or document style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFormat {
    /// Font family name.
    pub family: Option<String>,

    /// Font size.
    pub size: Option<FontSize>,

    /// Bold flag.
    pub bold: Option<bool>,
}

impl RunFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn with_size(mut self, size: FontSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    /// Whether the run is explicitly bold. An inherited flag counts as not bold.
    pub fn is_bold(&self) -> bool {
        self.bold == Some(true)
    }

    pub fn is_empty(&self) -> bool {
        self.family.is_none() && self.size.is_none() && self.bold.is_none()
    }
}

/// A piece of format-specific markup carried through normalization untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Local element name, used to keep schema order when re-rendering.
    pub name: String,

    /// Serialized markup, exactly as read.
    pub xml: String,
}

impl Fragment {
    pub fn new(name: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xml: xml.into(),
        }
    }
}

/// Non-text run content placed after the first `offset` bytes of the run's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineFragment {
    pub offset: usize,
    pub fragment: Fragment,
}

/// Qualified attribute name and unescaped value.
pub type Attribute = (String, String);

/// Paragraph markup the normalizer does not interpret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphMarkup {
    /// Attributes of the paragraph element itself.
    pub attributes: Vec<Attribute>,

    /// Paragraph properties other than style, alignment, and indentation.
    pub properties: Vec<Fragment>,

    /// Indentation attributes other than the first-line indent.
    pub indent: Vec<Attribute>,

    /// Non-run content after the last run.
    pub trailing: Vec<Fragment>,
}

/// Run markup the normalizer does not interpret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMarkup {
    /// Non-run paragraph content directly preceding this run.
    pub leading: Vec<Fragment>,

    /// Attributes of the run element itself.
    pub attributes: Vec<Attribute>,

    /// Run properties other than font family, size, and bold.
    pub properties: Vec<Fragment>,

    /// Font attributes other than the family names.
    pub fonts: Vec<Attribute>,

    /// Run content that is not text (drawings, page breaks, field
    /// characters), anchored in the run's text so its order is kept.
    pub content: Vec<InlineFragment>,
}

/// A contiguous span of text sharing one set of attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub format: RunFormat,
    pub markup: RunMarkup,
}

impl Run {
    /// Create a run with inherited formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: RunFormat) -> Self {
        self.format = format;
        self
    }

    /// Append non-text content after the current end of the text.
    pub fn push_content(&mut self, fragment: Fragment) {
        self.markup.content.push(InlineFragment {
            offset: self.text.len(),
            fragment,
        });
    }

    /// Whether removing this run would lose nothing but empty text.
    fn is_disposable(&self) -> bool {
        self.text.is_empty() && self.markup.content.is_empty()
    }

    /// Remove the first `len` bytes of text; content anchored inside the
    /// removed text moves to the start.
    fn remove_text_prefix(&mut self, len: usize) {
        self.text.drain(..len);
        for item in &mut self.markup.content {
            item.offset = item.offset.saturating_sub(len);
        }
    }

    /// Shorten the text to `len` bytes; content anchored past it moves to the end.
    fn truncate_text(&mut self, len: usize) {
        self.text.truncate(len);
        for item in &mut self.markup.content {
            item.offset = item.offset.min(len);
        }
    }
}

/// A paragraph: layout attributes and an ordered sequence of runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Style identifier as known to the target format.
    pub style: Option<String>,

    pub alignment: Option<Alignment>,

    pub first_line_indent: Option<Twips>,

    pub runs: Vec<Run>,

    pub markup: ParagraphMarkup,
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph from runs.
    pub fn with_runs(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Effective text: the concatenation of all run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Whether the trimmed effective text is empty (including no runs at all).
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Remove the first `len` bytes of effective text, across run boundaries.
    ///
    /// `len` must fall on a character boundary of the effective text.
    pub fn remove_prefix(&mut self, mut len: usize) {
        for run in &mut self.runs {
            if len == 0 {
                break;
            }
            let take = len.min(run.text.len());
            run.remove_text_prefix(take);
            len -= take;
        }
    }

    /// Remove leading whitespace from the effective text.
    pub fn trim_start(&mut self) {
        for run in &mut self.runs {
            let removed = run.text.len() - run.text.trim_start().len();
            run.remove_text_prefix(removed);
            if !run.text.is_empty() {
                break;
            }
        }
    }

    /// Remove trailing whitespace from the effective text.
    pub fn trim_end(&mut self) {
        for run in self.runs.iter_mut().rev() {
            let keep = run.text.trim_end().len();
            run.truncate_text(keep);
            if !run.text.is_empty() {
                break;
            }
        }
    }

    /// Drop runs left with neither text nor other content.
    ///
    /// Markup that preceded a dropped run moves to the next surviving run, or
    /// to the paragraph's trailing markup.
    pub fn prune_empty_runs(&mut self) {
        let mut carried: Vec<Fragment> = Vec::new();
        let mut kept = Vec::with_capacity(self.runs.len());

        for mut run in std::mem::take(&mut self.runs) {
            if run.is_disposable() {
                carried.append(&mut run.markup.leading);
                continue;
            }
            if !carried.is_empty() {
                carried.append(&mut run.markup.leading);
                run.markup.leading = std::mem::take(&mut carried);
            }
            kept.push(run);
        }

        if !carried.is_empty() {
            carried.append(&mut self.markup.trailing);
            self.markup.trailing = carried;
        }
        self.runs = kept;
    }
}
