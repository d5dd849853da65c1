//! WordprocessingML writer for paragraphs and run properties.
//!
//! Properties are emitted in the order the WordprocessingML schema requires;
//! Word rejects documents whose `w:pPr`/`w:rPr` children are out of order.

use crate::xml::{into_string, write_raw, Names};
use docfmt_core::types::{Attribute, Fragment, InlineFragment};
use docfmt_core::{Alignment, Paragraph, Run, RunFormat};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Schema order of `w:pPr` children.
const PARAGRAPH_PROPERTY_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl",
    "numPr", "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens",
    "kinsoku", "wordWrap", "overflowPunct", "topLinePunct", "autoSpaceDE",
    "autoSpaceDN", "bidi", "adjustRightInd", "snapToGrid", "spacing", "ind",
    "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc", "textDirection",
    "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle", "rPr",
    "sectPr", "pPrChange",
];

/// Schema order of `w:rPr` children.
const RUN_PROPERTY_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike",
    "dstrike", "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid",
    "vanish", "webHidden", "color", "spacing", "w", "kern", "position", "sz", "szCs",
    "highlight", "u", "effect", "bdr", "shd", "fitText", "vertAlign", "rtl", "cs",
    "em", "lang", "eastAsianLayout", "specVanish", "oMath", "rPrChange",
];

/// Indentation attributes superseded by an explicit first-line indent.
const FIRST_LINE_CHAR_UNITS: &[&str] = &["firstLineChars", "hangingChars"];

/// Font attributes that override an explicit family name.
const THEME_FONT_ATTRIBUTES: &[&str] = &["asciiTheme", "hAnsiTheme"];

fn rank(order: &[&str], name: &str) -> usize {
    order.iter().position(|n| *n == name).unwrap_or(order.len())
}

fn attribute_local(key: &str) -> &str {
    key.rsplit(':').next().unwrap_or(key)
}

/// A property element waiting to be written in schema order.
enum Piece<'a> {
    Raw(&'a str),
    Element(BytesStart<'static>),
}

fn write_properties(
    writer: &mut Writer<Vec<u8>>,
    container: &str,
    mut pieces: Vec<(usize, Piece)>,
) -> quick_xml::Result<()> {
    if pieces.is_empty() {
        return Ok(());
    }
    pieces.sort_by_key(|(rank, _)| *rank);

    writer.write_event(Event::Start(BytesStart::new(container)))?;
    for (_, piece) in pieces {
        match piece {
            Piece::Raw(xml) => write_raw(writer, xml),
            Piece::Element(e) => writer.write_event(Event::Empty(e))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(container)))?;
    Ok(())
}

fn fragment_pieces<'a>(order: &[&str], fragments: &'a [Fragment]) -> Vec<(usize, Piece<'a>)> {
    fragments
        .iter()
        .map(|f| (rank(order, &f.name), Piece::Raw(f.xml.as_str())))
        .collect()
}

fn element(name: String, attributes: &[(String, String)]) -> BytesStart<'static> {
    let mut e = BytesStart::new(name);
    for (key, value) in attributes {
        e.push_attribute((key.as_str(), value.as_str()));
    }
    e
}

fn alignment_value(alignment: &Alignment) -> &str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
        Alignment::Other(value) => value.as_str(),
    }
}

/// Render a paragraph from the core model.
pub(crate) fn render_paragraph(paragraph: &Paragraph, names: &Names) -> quick_xml::Result<String> {
    let mut writer = Writer::new(Vec::new());
    let tag = names.q("p");

    writer.write_event(Event::Start(element(
        tag.clone(),
        &paragraph.markup.attributes,
    )))?;
    write_paragraph_properties(&mut writer, paragraph, names)?;
    for run in &paragraph.runs {
        for fragment in &run.markup.leading {
            write_raw(&mut writer, &fragment.xml);
        }
        write_run(&mut writer, run, names)?;
    }
    for fragment in &paragraph.markup.trailing {
        write_raw(&mut writer, &fragment.xml);
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;

    Ok(into_string(writer))
}

fn write_paragraph_properties(
    writer: &mut Writer<Vec<u8>>,
    paragraph: &Paragraph,
    names: &Names,
) -> quick_xml::Result<()> {
    let order = PARAGRAPH_PROPERTY_ORDER;
    let mut pieces = fragment_pieces(order, &paragraph.markup.properties);
    let val = names.q("val");

    if let Some(style) = &paragraph.style {
        pieces.push((
            rank(order, "pStyle"),
            Piece::Element(element(names.q("pStyle"), &[(val.clone(), style.clone())])),
        ));
    }

    let mut indent: Vec<Attribute> = paragraph
        .markup
        .indent
        .iter()
        .filter(|(key, _)| {
            paragraph.first_line_indent.is_none()
                || !FIRST_LINE_CHAR_UNITS.contains(&attribute_local(key))
        })
        .cloned()
        .collect();
    if let Some(first_line) = paragraph.first_line_indent {
        let twips = first_line.value();
        if twips < 0 {
            indent.push((names.q("hanging"), (-twips).to_string()));
        } else {
            indent.push((names.q("firstLine"), twips.to_string()));
        }
    }
    if !indent.is_empty() {
        pieces.push((rank(order, "ind"), Piece::Element(element(names.q("ind"), &indent))));
    }

    if let Some(alignment) = &paragraph.alignment {
        pieces.push((
            rank(order, "jc"),
            Piece::Element(element(
                names.q("jc"),
                &[(val, alignment_value(alignment).to_string())],
            )),
        ));
    }

    write_properties(writer, &names.q("pPr"), pieces)
}

fn write_run(writer: &mut Writer<Vec<u8>>, run: &Run, names: &Names) -> quick_xml::Result<()> {
    let tag = names.q("r");
    writer.write_event(Event::Start(element(
        tag.clone(),
        &run.markup.attributes,
    )))?;

    write_run_properties(
        writer,
        &run.format,
        &run.markup.properties,
        &run.markup.fonts,
        names,
    )?;
    write_run_content(writer, &run.text, &run.markup.content, names)?;

    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Write a `w:rPr` element; nothing is written when there are no properties.
pub(crate) fn write_run_properties(
    writer: &mut Writer<Vec<u8>>,
    format: &RunFormat,
    properties: &[Fragment],
    fonts: &[Attribute],
    names: &Names,
) -> quick_xml::Result<()> {
    let order = RUN_PROPERTY_ORDER;
    let mut pieces = fragment_pieces(order, properties);
    let val = names.q("val");

    let mut font_attributes: Vec<Attribute> = fonts
        .iter()
        .filter(|(key, _)| {
            format.family.is_none() || !THEME_FONT_ATTRIBUTES.contains(&attribute_local(key))
        })
        .cloned()
        .collect();
    if let Some(family) = &format.family {
        font_attributes.push((names.q("ascii"), family.clone()));
        font_attributes.push((names.q("hAnsi"), family.clone()));
    }
    if !font_attributes.is_empty() {
        pieces.push((
            rank(order, "rFonts"),
            Piece::Element(element(names.q("rFonts"), &font_attributes)),
        ));
    }

    match format.bold {
        Some(true) => pieces.push((rank(order, "b"), Piece::Element(element(names.q("b"), &[])))),
        Some(false) => pieces.push((
            rank(order, "b"),
            Piece::Element(element(names.q("b"), &[(val.clone(), "0".to_string())])),
        )),
        None => {}
    }

    if let Some(size) = format.size {
        pieces.push((
            rank(order, "sz"),
            Piece::Element(element(
                names.q("sz"),
                &[(val, size.half_points().to_string())],
            )),
        ));
    }

    write_properties(writer, &names.q("rPr"), pieces)
}

/// Write run text as `w:t` pieces, with tabs and line breaks as elements and
/// non-text content at its anchor.
fn write_run_content(
    writer: &mut Writer<Vec<u8>>,
    text: &str,
    content: &[InlineFragment],
    names: &Names,
) -> quick_xml::Result<()> {
    let mut pending = content.iter().peekable();
    let mut buffer = String::new();
    for (idx, c) in text.char_indices() {
        while let Some(item) = pending.next_if(|item| item.offset <= idx) {
            flush_text(writer, &mut buffer, names)?;
            write_raw(writer, &item.fragment.xml);
        }
        match c {
            '\t' | '\n' => {
                flush_text(writer, &mut buffer, names)?;
                let local = if c == '\t' { "tab" } else { "br" };
                writer.write_event(Event::Empty(BytesStart::new(names.q(local))))?;
            }
            _ => buffer.push(c),
        }
    }
    flush_text(writer, &mut buffer, names)?;
    for item in pending {
        write_raw(writer, &item.fragment.xml);
    }
    Ok(())
}

fn flush_text(writer: &mut Writer<Vec<u8>>, buffer: &mut String, names: &Names) -> quick_xml::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let tag = names.q("t");
    let mut start = BytesStart::new(tag.clone());
    start.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(buffer.as_str())))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    buffer.clear();
    Ok(())
}
