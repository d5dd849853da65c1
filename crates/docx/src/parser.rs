//! WordprocessingML reader: splits the main document part into body
//! paragraphs and surrounding markup, and maps paragraphs into the core model.

use crate::xml::{
    attribute, attributes, capture_element, capture_fragment, local_name, prefix, skip_element,
};
use docfmt_core::types::{Attribute, Fragment};
use docfmt_core::{Alignment, FontSize, Paragraph, Run, RunFormat, Twips};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// A slice of the main document part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Markup outside body-level paragraphs, kept verbatim.
    Markup(String),

    /// A body-level paragraph as read, with the namespace prefix it uses.
    Paragraph { xml: String, prefix: String },
}

/// Split the main document part into body-level paragraphs and everything else.
///
/// Only paragraphs that are direct children of the body are split out;
/// paragraphs inside tables, text boxes or content controls stay in markup.
pub(crate) fn split_document(xml: &str) -> quick_xml::Result<Vec<Segment>> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut markup = Writer::new(Vec::new());
    let mut stack: Vec<Vec<u8>> = Vec::new();

    loop {
        let event = reader.read_event()?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e)
                if local_name(e.name().as_ref()) == b"p"
                    && stack.last().map(Vec::as_slice) == Some(b"body".as_slice()) =>
            {
                let empty = matches!(event, Event::Empty(_));
                flush_markup(&mut markup, &mut segments);
                segments.push(Segment::Paragraph {
                    xml: capture_element(&mut reader, e, empty)?,
                    prefix: prefix(e.name().as_ref()),
                });
            }
            Event::Start(ref e) => {
                stack.push(local_name(e.name().as_ref()).to_vec());
                markup.write_event(&event)?;
            }
            Event::End(_) => {
                stack.pop();
                markup.write_event(&event)?;
            }
            Event::Eof => break,
            _ => markup.write_event(&event)?,
        }
    }

    flush_markup(&mut markup, &mut segments);
    Ok(segments)
}

fn flush_markup(markup: &mut Writer<Vec<u8>>, segments: &mut Vec<Segment>) {
    let bytes = std::mem::take(markup.get_mut());
    if !bytes.is_empty() {
        segments.push(Segment::Markup(String::from_utf8_lossy(&bytes).into_owned()));
    }
}

/// Parse one `w:p` element into the core model.
pub(crate) fn parse_paragraph(xml: &str) -> quick_xml::Result<Paragraph> {
    let mut reader = Reader::from_str(xml);
    let mut paragraph = Paragraph::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                paragraph.markup.attributes = attributes(&e);
                break;
            }
            Event::Empty(e) => {
                paragraph.markup.attributes = attributes(&e);
                return Ok(paragraph);
            }
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("paragraph".to_string()));
            }
            _ => {}
        }
    }

    // Non-run content waiting for the run it precedes
    let mut pending: Vec<Fragment> = Vec::new();

    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => break,
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("paragraph".to_string()));
            }
            _ => continue,
        };

        match local_name(e.name().as_ref()) {
            b"pPr" => {
                if !empty {
                    parse_paragraph_properties(&mut reader, &mut paragraph)?;
                }
            }
            b"r" => {
                let mut run = Run::default();
                run.markup.attributes = attributes(&e);
                if !empty {
                    parse_run_content(&mut reader, &mut run)?;
                }
                run.markup.leading = std::mem::take(&mut pending);
                paragraph.runs.push(run);
            }
            _ => pending.push(capture_fragment(&mut reader, &e, empty)?),
        }
    }

    paragraph.markup.trailing = pending;
    Ok(paragraph)
}

fn parse_paragraph_properties(
    reader: &mut Reader<&[u8]>,
    paragraph: &mut Paragraph,
) -> quick_xml::Result<()> {
    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("pPr".to_string()));
            }
            _ => continue,
        };

        match local_name(e.name().as_ref()) {
            b"pStyle" => {
                paragraph.style = attribute(&e, b"val");
                skip_element(reader, &e, empty)?;
            }
            b"jc" => {
                paragraph.alignment = attribute(&e, b"val").map(|v| parse_alignment(&v));
                skip_element(reader, &e, empty)?;
            }
            b"ind" => {
                let (first_line, rest) = parse_indent(&e);
                paragraph.first_line_indent = first_line;
                paragraph.markup.indent = rest;
                skip_element(reader, &e, empty)?;
            }
            _ => paragraph
                .markup
                .properties
                .push(capture_fragment(reader, &e, empty)?),
        }
    }
}

pub(crate) fn parse_alignment(value: &str) -> Alignment {
    match value {
        "left" => Alignment::Left,
        "center" => Alignment::Center,
        "right" => Alignment::Right,
        "both" => Alignment::Justify,
        other => {
            log::warn!("Unrecognised paragraph alignment '{}', keeping as is", other);
            Alignment::Other(other.to_string())
        }
    }
}

/// Split `w:ind` into the first-line indent (negative for a hanging indent)
/// and the remaining attributes.
fn parse_indent(e: &BytesStart) -> (Option<Twips>, Vec<Attribute>) {
    let mut first_line = None;
    let mut rest = Vec::new();

    for (key, value) in attributes(e) {
        match local_name(key.as_bytes()) {
            b"firstLine" => {
                first_line = first_line.or(value.parse::<i32>().ok().map(Twips::new));
            }
            b"hanging" => {
                if let Ok(twips) = value.parse::<i32>() {
                    first_line = Some(Twips::new(-twips));
                }
            }
            _ => rest.push((key, value)),
        }
    }

    (first_line, rest)
}

fn parse_run_content(reader: &mut Reader<&[u8]>, run: &mut Run) -> quick_xml::Result<()> {
    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("run".to_string()));
            }
            _ => continue,
        };

        match local_name(e.name().as_ref()) {
            b"rPr" => {
                if !empty {
                    let props = parse_run_properties(reader)?;
                    run.format = props.format;
                    run.markup.properties = props.properties;
                    run.markup.fonts = props.fonts;
                }
            }
            b"t" => {
                if !empty {
                    read_text(reader, &mut run.text)?;
                }
            }
            b"tab" => {
                run.text.push('\t');
                skip_element(reader, &e, empty)?;
            }
            b"cr" => {
                run.text.push('\n');
                skip_element(reader, &e, empty)?;
            }
            // Page and column breaks are layout, not text
            b"br" if attribute(&e, b"type").map_or(true, |t| t == "textWrapping") => {
                run.text.push('\n');
                skip_element(reader, &e, empty)?;
            }
            _ => run.push_content(capture_fragment(reader, &e, empty)?),
        }
    }
}

fn read_text(reader: &mut Reader<&[u8]>, text: &mut String) -> quick_xml::Result<()> {
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t)),
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("text".to_string()));
            }
            _ => {}
        }
    }
}

/// Run properties split into the interpreted format and passthrough markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RunProperties {
    pub(crate) format: RunFormat,
    pub(crate) properties: Vec<Fragment>,
    pub(crate) fonts: Vec<Attribute>,
}

/// Parse the children of a `w:rPr` element whose start tag has just been read.
pub(crate) fn parse_run_properties(reader: &mut Reader<&[u8]>) -> quick_xml::Result<RunProperties> {
    let mut props = RunProperties::default();

    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => return Ok(props),
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof("rPr".to_string()));
            }
            _ => continue,
        };

        match local_name(e.name().as_ref()) {
            b"rFonts" => {
                for (key, value) in attributes(&e) {
                    match local_name(key.as_bytes()) {
                        b"ascii" => props.format.family = Some(value),
                        b"hAnsi" => {
                            if props.format.family.is_none() {
                                props.format.family = Some(value);
                            }
                        }
                        _ => props.fonts.push((key, value)),
                    }
                }
                skip_element(reader, &e, empty)?;
            }
            b"b" => {
                props.format.bold = Some(parse_on_off(attribute(&e, b"val").as_deref()));
                skip_element(reader, &e, empty)?;
            }
            b"sz" => match attribute(&e, b"val").and_then(|v| v.parse::<u32>().ok()) {
                Some(half_points) => {
                    props.format.size = Some(FontSize::from_half_points(half_points));
                    skip_element(reader, &e, empty)?;
                }
                None => props.properties.push(capture_fragment(reader, &e, empty)?),
            },
            _ => props.properties.push(capture_fragment(reader, &e, empty)?),
        }
    }
}

/// OOXML on/off value: absent means on.
fn parse_on_off(value: Option<&str>) -> bool {
    !matches!(value, Some("0" | "false" | "off" | "none"))
}
