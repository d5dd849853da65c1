//! Core document model, paragraph classification, and house-style
//! normalization for word-processing documents.

pub mod classify;
pub mod error;
pub mod normalize;
pub mod style;
pub mod types;

pub use classify::{classify, Classification, HeadingLevel, ListKind};
pub use error::{Error, Result};
pub use normalize::{HouseStyle, NormalizeReport, ParagraphNormalizer};
pub use style::{StyleMap, StyleRole};
pub use types::{
    Alignment, Document, FontSize, Fragment, InlineFragment, Paragraph, ParagraphMarkup, Run,
    RunFormat, RunMarkup, Twips,
};
