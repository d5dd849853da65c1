//! DOCX package loading and saving.

use crate::parser::{parse_paragraph, split_document, Segment};
use crate::styles::{apply_style_font, StyleSheet};
use crate::writer::render_paragraph;
use crate::xml::{local_name, Names};
use docfmt_core::{Document, Error, Paragraph, Result, StyleRole};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";
const DEFAULT_STYLES_PART: &str = "word/styles.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const STYLES_REL: &str = "/styles";

/// One file inside the ZIP container.
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// An opened DOCX package.
///
/// Holds every part of the container in memory so the document can be written
/// back with only the main document and styles parts changed.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<Entry>,
    document_part: String,
    styles_part: Option<String>,
    segments: Vec<Segment>,
    originals: Vec<Paragraph>,
    styles: StyleSheet,
}

impl DocxPackage {
    /// Open a DOCX file and map its body paragraphs into a [`Document`].
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Document)> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| {
            Error::LoadFailure(format!("Failed to open {}: {}", path.display(), e))
        })?;
        log::debug!("Opening {}", path.display());
        Self::from_reader(BufReader::new(file))
    }

    /// Read a DOCX package from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<(Self, Document)> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::LoadFailure(format!("Not a DOCX (ZIP) container: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for idx in 0..archive.len() {
            let mut file = archive
                .by_index(idx)
                .map_err(|e| Error::LoadFailure(format!("Failed to read ZIP entry {}: {}", idx, e)))?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).map_err(|e| {
                Error::LoadFailure(format!("Failed to read '{}': {}", file.name(), e))
            })?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        let mut package = Self {
            entries,
            document_part: DEFAULT_DOCUMENT_PART.to_string(),
            styles_part: None,
            segments: Vec::new(),
            originals: Vec::new(),
            styles: StyleSheet::default(),
        };
        package.document_part = package.locate_part("", PACKAGE_RELS, OFFICE_DOCUMENT_REL, DEFAULT_DOCUMENT_PART)?;

        let document_xml = package.part_text(&package.document_part)?.ok_or_else(|| {
            Error::LoadFailure(format!("Missing main document part '{}'", package.document_part))
        })?;
        package.segments = split_document(&document_xml)
            .map_err(|e| Error::LoadFailure(format!("Invalid document XML: {}", e)))?;
        for segment in &package.segments {
            if let Segment::Paragraph { xml, .. } = segment {
                let paragraph = parse_paragraph(xml)
                    .map_err(|e| Error::LoadFailure(format!("Invalid paragraph XML: {}", e)))?;
                package.originals.push(paragraph);
            }
        }

        let (dir, file) = split_part_name(&package.document_part);
        let rels = format!("{}_rels/{}.rels", dir, file);
        let styles_part = package.locate_part(dir, &rels, STYLES_REL, DEFAULT_STYLES_PART)?;
        if let Some(xml) = package.part_text(&styles_part)? {
            package.styles = StyleSheet::parse(&xml)
                .map_err(|e| Error::LoadFailure(format!("Invalid styles XML: {}", e)))?;
            package.styles_part = Some(styles_part);
        } else {
            log::warn!("Document has no styles part");
        }

        log::info!(
            "Loaded {} body paragraphs from '{}'",
            package.originals.len(),
            package.document_part
        );

        let document = Document {
            paragraphs: package.originals.clone(),
            default_font: package.styles.body_font(),
        };
        Ok((package, document))
    }

    /// The document's paragraph styles.
    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Serialize the package with `document` as its content.
    ///
    /// Unchanged paragraphs are written back exactly as read.
    pub fn to_bytes(&self, document: &Document) -> Result<Vec<u8>> {
        if document.paragraphs.len() != self.originals.len() {
            return Err(Error::SaveFailure(format!(
                "Document has {} paragraphs but the package was loaded with {}",
                document.paragraphs.len(),
                self.originals.len()
            )));
        }

        let document_xml = self.render_document(document)?;
        let styles_xml = self.render_styles(document)?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options).map_err(save_error)?;
                continue;
            }

            let data = if entry.name == self.document_part {
                document_xml.as_bytes()
            } else if Some(&entry.name) == self.styles_part.as_ref() {
                styles_xml.as_deref().map_or(entry.data.as_slice(), str::as_bytes)
            } else {
                entry.data.as_slice()
            };
            zip.start_file(entry.name.as_str(), options).map_err(save_error)?;
            zip.write_all(data).map_err(save_error)?;
        }

        let cursor = zip.finish().map_err(save_error)?;
        Ok(cursor.into_inner())
    }

    /// Serialize the package and write it to `path`.
    ///
    /// The package is assembled in memory first; nothing is written unless
    /// serialization succeeds.
    pub fn save(&self, document: &Document, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes(document)?;
        std::fs::write(path, bytes).map_err(|e| {
            Error::SaveFailure(format!("Failed to write {}: {}", path.display(), e))
        })?;
        log::info!("Saved {}", path.display());
        Ok(())
    }

    fn render_document(&self, document: &Document) -> Result<String> {
        let mut xml = String::new();
        let mut paragraphs = document.paragraphs.iter().zip(&self.originals);

        for segment in &self.segments {
            match segment {
                Segment::Markup(markup) => xml.push_str(markup),
                Segment::Paragraph { xml: original, prefix } => {
                    let Some((paragraph, loaded)) = paragraphs.next() else {
                        break;
                    };
                    if paragraph == loaded {
                        xml.push_str(original);
                    } else {
                        let rendered = render_paragraph(paragraph, &Names::new(prefix.as_str()))
                            .map_err(|e| Error::SaveFailure(format!("Failed to render paragraph: {}", e)))?;
                        xml.push_str(&rendered);
                    }
                }
            }
        }

        Ok(xml)
    }

    /// The rewritten styles part, or `None` when the default font is unchanged.
    fn render_styles(&self, document: &Document) -> Result<Option<String>> {
        let Some(part) = &self.styles_part else {
            return Ok(None);
        };
        if document.default_font == self.styles.body_font() || document.default_font.is_empty() {
            return Ok(None);
        }
        let Some(style_id) = self.styles.lookup(StyleRole::Body.style_name()) else {
            return Ok(None);
        };

        let original = self
            .part_text(part)?
            .ok_or_else(|| Error::SaveFailure(format!("Missing styles part '{}'", part)))?;
        apply_style_font(&original, style_id, &document.default_font)
            .map(Some)
            .map_err(|e| Error::SaveFailure(format!("Failed to update styles: {}", e)))
    }

    fn part_text(&self, name: &str) -> Result<Option<String>> {
        let Some(entry) = self.entries.iter().find(|e| e.name == name) else {
            return Ok(None);
        };
        String::from_utf8(entry.data.clone())
            .map(Some)
            .map_err(|e| Error::LoadFailure(format!("Part '{}' is not UTF-8: {}", name, e)))
    }

    /// Resolve the part a relationship of type `rel_type` points at, falling
    /// back to `default` when the relationships part or entry is absent.
    fn locate_part(&self, base_dir: &str, rels_path: &str, rel_type: &str, default: &str) -> Result<String> {
        let Some(rels) = self.part_text(rels_path)? else {
            return Ok(default.to_string());
        };
        let target = relationship_target(&rels, rel_type)
            .map_err(|e| Error::LoadFailure(format!("Error parsing relationships: {}", e)))?;
        Ok(target
            .map(|t| resolve_target(base_dir, &t))
            .unwrap_or_else(|| default.to_string()))
    }
}

fn save_error(e: impl std::fmt::Display) -> Error {
    Error::SaveFailure(e.to_string())
}

/// Target of the first relationship whose type ends with `rel_type`.
fn relationship_target(xml: &str, rel_type: &str) -> quick_xml::Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e)
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut kind = String::new();
                let mut target = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Type" => kind = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                        _ => {}
                    }
                }

                if kind.ends_with(rel_type) && !target.is_empty() {
                    return Ok(Some(target));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Split a part name into its directory (with trailing slash) and file name.
fn split_part_name(name: &str) -> (&str, &str) {
    match name.rfind('/') {
        Some(pos) => name.split_at(pos + 1),
        None => ("", name),
    }
}

/// Resolve a relationship target relative to the source part's directory.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_docx, sample_docx, sample_parts, DOCUMENT};
    use docfmt_core::{Alignment, FontSize, HouseStyle, NormalizeReport, ParagraphNormalizer, Twips};

    fn normalize(package: &DocxPackage, document: &mut Document) -> Result<NormalizeReport> {
        ParagraphNormalizer::new(HouseStyle::default(), package.styles().style_map())
            .normalize(document)
    }

    fn normalized_sample() -> (DocxPackage, Document) {
        let (package, mut document) = DocxPackage::from_reader(Cursor::new(sample_docx())).unwrap();
        normalize(&package, &mut document).unwrap();
        (package, document)
    }

    /// The sample package with one part's text replaced.
    fn sample_with(part: &str, from: &str, to: &str) -> Vec<u8> {
        let parts: Vec<(&str, String)> = sample_parts()
            .into_iter()
            .map(|(name, xml)| {
                if name == part {
                    (name, xml.replace(from, to))
                } else {
                    (name, xml.to_string())
                }
            })
            .collect();
        let borrowed: Vec<(&str, &str)> = parts.iter().map(|(n, x)| (*n, x.as_str())).collect();
        build_docx(&borrowed)
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn test_load_body_paragraphs() {
        let (_, document) = DocxPackage::from_reader(Cursor::new(sample_docx())).unwrap();

        assert_eq!(
            document.texts(),
            vec!["", "Introduction", "- first point", "Bold start then plain text that runs on long enough to stay a body paragraph."]
        );
        assert_eq!(document.default_font.family.as_deref(), Some("Times New Roman"));
    }

    #[test]
    fn test_resolve_styles() {
        let (package, _) = DocxPackage::from_reader(Cursor::new(sample_docx())).unwrap();
        let styles = package.styles().style_map();

        assert_eq!(styles.id(StyleRole::HeadingMajor), Some("Heading1"));
        assert_eq!(styles.id(StyleRole::BulletList), Some("ListBullet"));
    }

    #[test]
    fn test_unused_style_may_be_missing() {
        let bytes = sample_with("word/styles.xml", "List Number", "Numbered Things");
        let (package, mut document) = DocxPackage::from_reader(Cursor::new(bytes)).unwrap();

        let report = normalize(&package, &mut document).unwrap();

        assert_eq!(report.numbered_items, 0);
        assert_eq!(document.paragraphs[1].style.as_deref(), Some("Heading1"));
    }

    #[test]
    fn test_used_style_missing() {
        let bytes = sample_with("word/styles.xml", "List Bullet", "Dotted Things");
        let (package, mut document) = DocxPackage::from_reader(Cursor::new(bytes)).unwrap();
        let before = document.clone();

        let result = normalize(&package, &mut document);

        assert!(matches!(
            result,
            Err(Error::StyleMissing {
                role: StyleRole::BulletList,
                ..
            })
        ));
        assert_eq!(document, before);
    }

    #[test]
    fn test_page_break_stays_after_text() {
        let bytes = sample_with(
            "word/document.xml",
            r#"<w:t>then plain text that runs on long enough to stay a body paragraph.</w:t></w:r>"#,
            r#"<w:t>then plain text that runs on long enough to stay a body paragraph.</w:t><w:br w:type="page"/></w:r>"#,
        );
        let (package, mut document) = DocxPackage::from_reader(Cursor::new(bytes)).unwrap();
        normalize(&package, &mut document).unwrap();

        let xml = read_part(&package.to_bytes(&document).unwrap(), "word/document.xml");

        let text = xml.find("stay a body paragraph.</w:t>").unwrap();
        let page_break = xml.find(r#"<w:br w:type="page"/>"#).unwrap();
        assert!(text < page_break);
    }

    #[test]
    fn test_round_trip_after_normalize() {
        let (package, document) = normalized_sample();

        let bytes = package.to_bytes(&document).unwrap();
        let (_, reloaded) = DocxPackage::from_reader(Cursor::new(bytes.clone())).unwrap();

        let heading = &reloaded.paragraphs[1];
        assert_eq!(heading.style.as_deref(), Some("Heading1"));
        assert_eq!(heading.runs[0].format.size, Some(FontSize::from_points(14)));
        assert_eq!(heading.runs[0].format.bold, Some(true));

        let item = &reloaded.paragraphs[2];
        assert_eq!(item.style.as_deref(), Some("ListBullet"));
        assert_eq!(item.text(), "first point");

        let body = &reloaded.paragraphs[3];
        assert_eq!(body.style.as_deref(), Some("Normal"));
        assert_eq!(body.alignment, Some(Alignment::Justify));
        assert_eq!(body.first_line_indent, Some(Twips::new(720)));
        assert_eq!(body.runs[0].format.bold, Some(true));
        assert_eq!(body.runs[1].format.bold, None);
        assert!(body.runs.iter().all(|r| r.format.family.as_deref() == Some("Arial")));
        assert!(body.runs[1].markup.properties.iter().any(|f| f.name == "color"));

        assert_eq!(reloaded.default_font.family.as_deref(), Some("Arial"));
        assert_eq!(reloaded.default_font.size, Some(FontSize::from_points(11)));
    }

    #[test]
    fn test_untouched_markup_is_preserved() {
        let (package, document) = normalized_sample();

        let bytes = package.to_bytes(&document).unwrap();
        let xml = read_part(&bytes, "word/document.xml");

        // Blank paragraph written back as read
        assert!(xml.contains(r#"<w:p w:rsidR="00A1B2C3"><w:pPr><w:jc w:val="center"/></w:pPr></w:p>"#));
        // Table paragraphs are not body paragraphs
        assert!(xml.contains("<w:t>- inside a table</w:t>"));
        assert!(xml.ends_with("<w:sectPr><w:pgSz w:w=\"12240\" w:h=\"15840\"/></w:sectPr></w:body></w:document>"));

        assert_eq!(read_part(&bytes, "customXml/item1.xml"), "<data/>");
    }

    #[test]
    fn test_unchanged_document_is_byte_identical() {
        let (package, document) = DocxPackage::from_reader(Cursor::new(sample_docx())).unwrap();

        let bytes = package.to_bytes(&document).unwrap();

        assert_eq!(read_part(&bytes, "word/document.xml"), DOCUMENT);
    }

    #[test]
    fn test_normalized_output_is_stable() {
        let (package, document) = normalized_sample();
        let bytes = package.to_bytes(&document).unwrap();

        let (package, mut again) = DocxPackage::from_reader(Cursor::new(bytes)).unwrap();
        let before = again.clone();
        normalize(&package, &mut again).unwrap();

        assert_eq!(again, before);
    }

    #[test]
    fn test_paragraph_count_mismatch() {
        let (package, mut document) = DocxPackage::from_reader(Cursor::new(sample_docx())).unwrap();
        document.paragraphs.pop();

        assert!(matches!(package.to_bytes(&document), Err(Error::SaveFailure(_))));
    }

    #[test]
    fn test_not_a_zip() {
        let result = DocxPackage::from_reader(Cursor::new(b"plain text, not a package".to_vec()));
        assert!(matches!(result, Err(Error::LoadFailure(_))));
    }

    #[test]
    fn test_missing_document_part() {
        let bytes = build_docx(&[("[Content_Types].xml", "<Types/>")]);
        let result = DocxPackage::from_reader(Cursor::new(bytes));
        assert!(matches!(result, Err(Error::LoadFailure(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.docx");

        match DocxPackage::open(&path) {
            Err(Error::InputNotFound(p)) => assert_eq!(p, path),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("messy.docx");
        let output = dir.path().join("polished.docx");
        std::fs::write(&input, sample_docx()).unwrap();

        let (package, mut document) = DocxPackage::open(&input).unwrap();
        normalize(&package, &mut document).unwrap();
        package.save(&document, &output).unwrap();

        let (_, reloaded) = DocxPackage::open(&output).unwrap();
        assert_eq!(reloaded.paragraphs[2].text(), "first point");
    }

    #[test]
    fn test_save_to_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("no-such-dir").join("out.docx");
        let (package, document) = DocxPackage::from_reader(Cursor::new(sample_docx())).unwrap();

        assert!(matches!(
            package.save(&document, &output),
            Err(Error::SaveFailure(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
        assert_eq!(resolve_target("word/", "styles.xml"), "word/styles.xml");
        assert_eq!(resolve_target("word/", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("word/", "/word/styles.xml"), "word/styles.xml");
    }

    #[test]
    fn test_split_part_name() {
        assert_eq!(split_part_name("word/document.xml"), ("word/", "document.xml"));
        assert_eq!(split_part_name("document.xml"), ("", "document.xml"));
    }
}
