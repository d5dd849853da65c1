//! DOCX (Office Open XML) loader and serializer for the document normalizer.
//!
//! A .docx file is a ZIP archive of XML parts. The body paragraphs of the main
//! document part are mapped into the core [`docfmt_core::Document`] model;
//! everything else in the package is carried through unchanged.

mod parser;
mod writer;
mod xml;

pub mod package;
pub mod styles;

#[cfg(test)]
mod test_support;

pub use package::DocxPackage;
pub use styles::StyleSheet;
