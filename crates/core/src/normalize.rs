//! House-style normalization of paragraph structure.
//!
//! Each non-blank paragraph is classified on its own (see [`crate::classify`])
//! and rewritten in place:
//!
//! - list items lose their typed marker and get a list style,
//! - headers get a heading style and a forced heading font,
//! - body text gets the body style and font, a first-line indent and
//!   justified alignment.
//!
//! Blank paragraphs are never touched.

use crate::classify::{classify, Classification};
use crate::error::Result;
use crate::style::{StyleMap, StyleRole};
use crate::types::{Alignment, Document, FontSize, Paragraph, RunFormat, Twips};
use serde::{Deserialize, Serialize};

/// Target appearance of a normalized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseStyle {
    /// Font family applied to every heading and body run.
    pub font_family: String,

    pub body_size: FontSize,

    pub heading_size: FontSize,

    /// First-line indent of body paragraphs.
    pub first_line_indent: Twips,
}

impl Default for HouseStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            body_size: FontSize::from_points(11),
            heading_size: FontSize::from_points(14),
            first_line_indent: Twips::from_inches(0.5),
        }
    }
}

impl HouseStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different font family.
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    /// Run format of the document's default style.
    pub fn default_font(&self) -> RunFormat {
        RunFormat::new()
            .with_family(self.font_family.clone())
            .with_size(self.body_size)
    }
}

/// Counts of what a normalization pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub blank: usize,
    pub bullet_items: usize,
    pub numbered_items: usize,
    pub major_headings: usize,
    pub minor_headings: usize,
    pub body: usize,
    /// Body paragraphs whose leading whitespace was stripped.
    pub reindented: usize,
}

impl NormalizeReport {
    /// Total number of paragraphs seen.
    pub fn total(&self) -> usize {
        self.blank
            + self.bullet_items
            + self.numbered_items
            + self.major_headings
            + self.minor_headings
            + self.body
    }

    fn record(&mut self, classification: &Classification) {
        match classification.role() {
            StyleRole::BulletList => self.bullet_items += 1,
            StyleRole::NumberList => self.numbered_items += 1,
            StyleRole::HeadingMajor => self.major_headings += 1,
            StyleRole::HeadingMinor => self.minor_headings += 1,
            StyleRole::Body => self.body += 1,
        }
        if let Classification::Body { reindent: true } = classification {
            self.reindented += 1;
        }
    }
}

/// Paragraph normalizer bound to a house style and a document's styles.
#[derive(Debug, Clone)]
pub struct ParagraphNormalizer {
    house: HouseStyle,
    styles: StyleMap,
}

impl ParagraphNormalizer {
    /// Create a normalizer. `styles` must be resolved against the document
    /// that will be normalized.
    pub fn new(house: HouseStyle, styles: StyleMap) -> Self {
        Self { house, styles }
    }

    /// Normalize every paragraph of `document` in place.
    ///
    /// Every paragraph is classified first, and each style a paragraph needs
    /// must exist before anything changes: on [`crate::Error::StyleMissing`]
    /// the document is left as it was. Then the default style font is set and
    /// paragraphs are rewritten in document order.
    pub fn normalize(&self, document: &mut Document) -> Result<NormalizeReport> {
        let plan = document
            .paragraphs
            .iter()
            .map(|paragraph| self.plan(paragraph))
            .collect::<Result<Vec<_>>>()?;

        document.default_font = self.house.default_font();

        let mut report = NormalizeReport::default();
        for (idx, (paragraph, step)) in document.paragraphs.iter_mut().zip(plan).enumerate() {
            match step {
                Some((classification, style)) => {
                    log::debug!("Paragraph {}: {:?}", idx + 1, classification);
                    self.apply(paragraph, &classification, style);
                    report.record(&classification);
                }
                None => {
                    log::debug!("Paragraph {}: blank, skipped", idx + 1);
                    report.blank += 1;
                }
            }
        }

        log::info!(
            "Normalized {} paragraphs ({} headings, {} list items, {} body, {} blank)",
            report.total(),
            report.major_headings + report.minor_headings,
            report.bullet_items + report.numbered_items,
            report.body,
            report.blank
        );
        Ok(report)
    }

    /// Classify and rewrite a single paragraph. Returns `None` for blank
    /// paragraphs, which are left untouched.
    pub fn normalize_paragraph(&self, paragraph: &mut Paragraph) -> Result<Option<Classification>> {
        let Some((classification, style)) = self.plan(paragraph)? else {
            return Ok(None);
        };
        self.apply(paragraph, &classification, style);
        Ok(Some(classification))
    }

    /// Classification of a paragraph and the style it will be given.
    fn plan(&self, paragraph: &Paragraph) -> Result<Option<(Classification, &str)>> {
        let Some(classification) = classify(paragraph, &self.styles) else {
            return Ok(None);
        };
        let style = self.styles.require(classification.role())?;
        Ok(Some((classification, style)))
    }

    fn apply(&self, paragraph: &mut Paragraph, classification: &Classification, style: &str) {
        paragraph.style = Some(style.to_string());

        match *classification {
            Classification::List { marker_len, .. } => {
                if marker_len > 0 {
                    let raw = paragraph.text();
                    let leading = raw.len() - raw.trim_start().len();
                    paragraph.remove_prefix(leading + marker_len);
                    paragraph.trim_start();
                    paragraph.trim_end();
                    paragraph.prune_empty_runs();
                }
            }
            Classification::Header(_) => {
                for run in &mut paragraph.runs {
                    run.format.family = Some(self.house.font_family.clone());
                    run.format.size = Some(self.house.heading_size);
                    run.format.bold = Some(true);
                }
            }
            Classification::Body { reindent } => {
                for run in &mut paragraph.runs {
                    run.format.family = Some(self.house.font_family.clone());
                    run.format.size = Some(self.house.body_size);
                }
                if reindent {
                    paragraph.trim_start();
                    paragraph.prune_empty_runs();
                }
                paragraph.first_line_indent = Some(self.house.first_line_indent);
                paragraph.alignment = Some(Alignment::Justify);
            }
        }
    }
}
