//! Small helpers over quick-xml shared by the DOCX reader and writer.

use docfmt_core::types::{Attribute, Fragment};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// The namespace prefix of a qualified name, or "" when there is none.
pub(crate) fn prefix(name: &[u8]) -> String {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => String::from_utf8_lossy(&name[..pos]).into_owned(),
        None => String::new(),
    }
}

/// Qualifies local names with the prefix the source part uses.
#[derive(Debug, Clone)]
pub(crate) struct Names {
    prefix: String,
}

impl Names {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub(crate) fn q(&self, local: &str) -> String {
        if self.prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", self.prefix, local)
        }
    }
}

/// Value of the attribute with the given local name.
pub(crate) fn attribute(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// All attributes of an element as (qualified name, unescaped value) pairs.
pub(crate) fn attributes(e: &BytesStart) -> Vec<Attribute> {
    e.attributes()
        .flatten()
        .filter_map(|a| {
            let value = a.unescape_value().ok()?.into_owned();
            Some((String::from_utf8_lossy(a.key.as_ref()).into_owned(), value))
        })
        .collect()
}

/// Serialize an element and its whole subtree.
///
/// `start` has just been read from `reader`; when `empty` is false the reader
/// is advanced past the matching end tag.
pub(crate) fn capture_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    empty: bool,
) -> quick_xml::Result<String> {
    let mut writer = Writer::new(Vec::new());
    if empty {
        writer.write_event(Event::Empty(start.borrow()))?;
        return Ok(into_string(writer));
    }

    writer.write_event(Event::Start(start.borrow()))?;
    let mut depth = 1usize;
    while depth > 0 {
        let event = reader.read_event()?;
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(quick_xml::Error::UnexpectedEof(format!(
                    "inside <{}>",
                    String::from_utf8_lossy(start.name().as_ref())
                )))
            }
            _ => {}
        }
        writer.write_event(event)?;
    }
    Ok(into_string(writer))
}

/// Capture an element as a passthrough fragment.
pub(crate) fn capture_fragment(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    empty: bool,
) -> quick_xml::Result<Fragment> {
    let name = String::from_utf8_lossy(local_name(start.name().as_ref())).into_owned();
    Ok(Fragment::new(name, capture_element(reader, start, empty)?))
}

/// Skip the rest of an element whose start tag has just been read.
pub(crate) fn skip_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    empty: bool,
) -> quick_xml::Result<()> {
    if !empty {
        reader.read_to_end(start.name())?;
    }
    Ok(())
}

/// Append already-serialized markup verbatim.
pub(crate) fn write_raw(writer: &mut Writer<Vec<u8>>, xml: &str) {
    writer.get_mut().extend_from_slice(xml.as_bytes());
}

pub(crate) fn into_string(writer: Writer<Vec<u8>>) -> String {
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}
