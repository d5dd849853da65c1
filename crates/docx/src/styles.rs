//! The document's style registry (`word/styles.xml`).

use crate::parser::{parse_run_properties, RunProperties};
use crate::writer::write_run_properties;
use crate::xml::{attribute, capture_element, into_string, local_name, prefix, write_raw, Names};
use docfmt_core::{RunFormat, StyleMap, StyleRole};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Children of `w:style` that must follow `w:rPr`.
const AFTER_RUN_PROPERTIES: &[&[u8]] = &[b"tblPr", b"trPr", b"tcPr", b"tblStylePr"];

/// A paragraph style defined by the document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StyleEntry {
    id: String,
    name: String,
    /// Run format declared directly on the style.
    font: RunFormat,
}

/// Paragraph styles defined by a document, looked up by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    styles: Vec<StyleEntry>,
}

impl StyleSheet {
    /// Parse the paragraph styles out of a styles part.
    pub fn parse(xml: &str) -> quick_xml::Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut styles = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) if local_name(e.name().as_ref()) == b"style" => {
                    let entry = parse_style(&mut reader, &e)?;
                    if attribute(&e, b"type").as_deref() == Some("paragraph") {
                        styles.extend(entry);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        log::debug!("Found {} paragraph styles", styles.len());
        Ok(Self { styles })
    }

    /// Style identifier for a display name, compared case-insensitively.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|s| s.id.as_str())
    }

    /// Resolve the style roles the normalizer assigns against this sheet.
    pub fn style_map(&self) -> StyleMap {
        StyleMap::resolve(|name| self.lookup(name).map(str::to_string))
    }

    /// Run format of the body ("Normal") style, empty when it has none.
    pub fn body_font(&self) -> RunFormat {
        self.entry(StyleRole::Body.style_name())
            .map(|s| s.font.clone())
            .unwrap_or_default()
    }

    fn entry(&self, name: &str) -> Option<&StyleEntry> {
        self.styles.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// Read a `w:style` element whose start tag has just been read.
fn parse_style(reader: &mut Reader<&[u8]>, start: &BytesStart) -> quick_xml::Result<Option<StyleEntry>> {
    let mut name = None;
    let mut font = RunFormat::default();

    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => break,
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("style".to_string()));
            }
            _ => continue,
        };

        match local_name(e.name().as_ref()) {
            b"name" => {
                name = attribute(&e, b"val");
                if !empty {
                    reader.read_to_end(e.name())?;
                }
            }
            b"rPr" if !empty => font = parse_run_properties(reader)?.format,
            _ => {
                if !empty {
                    reader.read_to_end(e.name())?;
                }
            }
        }
    }

    Ok(attribute(start, b"styleId")
        .zip(name)
        .map(|(id, name)| StyleEntry { id, name, font }))
}

/// Rewrite the run properties of one paragraph style so it uses `font`.
///
/// Only the family and size are applied; the rest of the style, and every
/// other style, is written back as read.
pub(crate) fn apply_style_font(xml: &str, style_id: &str, font: &RunFormat) -> quick_xml::Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());

    loop {
        let event = reader.read_event()?;
        match event {
            Event::Start(ref e)
                if local_name(e.name().as_ref()) == b"style"
                    && attribute(e, b"styleId").as_deref() == Some(style_id) =>
            {
                writer.write_event(&event)?;
                rewrite_style_body(&mut reader, &mut writer, e, font)?;
            }
            Event::Eof => break,
            _ => writer.write_event(&event)?,
        }
    }

    Ok(into_string(writer))
}

fn rewrite_style_body(
    reader: &mut Reader<&[u8]>,
    writer: &mut Writer<Vec<u8>>,
    start: &BytesStart,
    font: &RunFormat,
) -> quick_xml::Result<()> {
    let names = Names::new(prefix(start.name().as_ref()));
    let mut children: Vec<(Vec<u8>, String)> = Vec::new();
    let mut has_run_properties = false;

    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => break,
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("style".to_string()));
            }
            _ => continue,
        };

        let local = local_name(e.name().as_ref()).to_vec();
        if local == b"rPr" {
            let props = if empty {
                RunProperties::default()
            } else {
                parse_run_properties(reader)?
            };
            children.push((local, render_run_properties(props, font, &names)?));
            has_run_properties = true;
        } else {
            children.push((local, capture_element(reader, &e, empty)?));
        }
    }

    if !has_run_properties {
        let at = children
            .iter()
            .position(|(local, _)| AFTER_RUN_PROPERTIES.contains(&local.as_slice()))
            .unwrap_or(children.len());
        let rendered = render_run_properties(RunProperties::default(), font, &names)?;
        children.insert(at, (b"rPr".to_vec(), rendered));
    }

    for (_, xml) in &children {
        write_raw(writer, xml);
    }
    writer.write_event(Event::End(start.to_end()))?;
    Ok(())
}

fn render_run_properties(
    mut props: RunProperties,
    font: &RunFormat,
    names: &Names,
) -> quick_xml::Result<String> {
    if font.family.is_some() {
        props.format.family = font.family.clone();
    }
    if font.size.is_some() {
        props.format.size = font.size;
    }

    let mut writer = Writer::new(Vec::new());
    write_run_properties(&mut writer, &props.format, &props.properties, &props.fonts, names)?;
    Ok(into_string(writer))
}
