//! Single XML tags rendered with quick-xml.
//!
//! The persisted schema document is assembled inside SQL string literals one
//! tag per line, so it cannot be streamed through one `Writer`. Each tag is
//! written on its own and returned as text.

use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

/// How a tag is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<Name ...>`
    Start,
    /// `<Name .../>`
    Empty,
}

/// Render `<name a="v" ...>` or `<name a="v" .../>` with escaped attribute
/// values
pub fn tag(name: &str, attributes: &[(&str, &str)], kind: TagKind) -> anyhow::Result<String> {
    let mut element = BytesStart::new(name);
    for (key, value) in attributes {
        element.push_attribute((*key, *value));
    }
    let event = match kind {
        TagKind::Start => Event::Start(element),
        TagKind::Empty => Event::Empty(element),
    };
    render(event)
}

/// Render `</name>`
pub fn end_tag(name: &str) -> anyhow::Result<String> {
    render(Event::End(BytesEnd::new(name)))
}

fn render(event: Event<'_>) -> anyhow::Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(event)?;
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

/// XML boolean spelling
pub fn xml_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
