//! Notification document decoding.
//!
//! The platform posts a flat XML document: a single root element (usually
//! `<xml>`) whose children are leaf fields, e.g.
//!
//! ```text
//! <xml>
//!   <AppId><![CDATA[wx2421b1c4370ec43b]]></AppId>
//!   <ErrorType>1001</ErrorType>
//! </xml>
//! ```

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::error::DecodeError;
use super::fields::FieldMap;

/// Decode a raw notification document into its fields.
///
/// Field values are the concatenation of the element's text and CDATA
/// content, untrimmed. Unknown fields are kept. A repeated field name
/// overwrites the earlier value (see [`FieldMap::insert`]). A leading UTF-8
/// byte order mark is skipped.
pub fn decode(raw: &[u8]) -> Result<FieldMap, DecodeError> {
    let mut reader = Reader::from_reader(raw);
    reader.trim_text(false);

    let mut fields = FieldMap::new();
    let mut depth = 0usize;
    let mut root_closed = false;
    let mut current: Option<(String, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => match depth {
                0 if root_closed => return Err(DecodeError::MultipleRoots),
                0 => depth = 1,
                1 => {
                    current = Some((element_name(start.name().as_ref())?, String::new()));
                    depth = 2;
                }
                _ => {
                    let field = current.take().map(|(name, _)| name).unwrap_or_default();
                    return Err(DecodeError::NestedElement { field });
                }
            },
            Event::Empty(empty) => match depth {
                0 if root_closed => return Err(DecodeError::MultipleRoots),
                0 => root_closed = true,
                1 => {
                    fields.insert(element_name(empty.name().as_ref())?, String::new());
                }
                _ => {
                    let field = current.take().map(|(name, _)| name).unwrap_or_default();
                    return Err(DecodeError::NestedElement { field });
                }
            },
            Event::End(_) => match depth {
                2 => {
                    if let Some((name, value)) = current.take() {
                        fields.insert(name, value);
                    }
                    depth = 1;
                }
                _ => {
                    depth = 0;
                    root_closed = true;
                }
            },
            Event::Text(text) => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&text.unescape()?);
                } else if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(DecodeError::UnexpectedText);
                }
            }
            Event::CData(cdata) => {
                let Some((_, value)) = current.as_mut() else {
                    return Err(DecodeError::UnexpectedText);
                };
                match cdata.into_inner() {
                    Cow::Borrowed(bytes) => {
                        value.push_str(std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?)
                    }
                    Cow::Owned(bytes) => value.push_str(
                        &String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?,
                    ),
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if depth > 0 {
        return Err(DecodeError::Truncated { open: depth });
    }
    if !root_closed {
        return Err(DecodeError::MissingRoot);
    }

    Ok(fields)
}

fn element_name(raw: &[u8]) -> Result<String, DecodeError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| DecodeError::InvalidUtf8)
}
