//! Record extraction from XML responses
//!
//! Responses can be very large and are regular enough that elements are
//! located by pattern rather than by building a document tree. A pattern
//! matches the first complete, non-nested occurrence of an element.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Result, WosError};
use crate::wos::models::Record;

/// Find the first `element`, optionally carrying the attribute `name="value"`
///
/// With `content_only` the inner text (trimmed) is returned, otherwise the
/// whole span from the opening to the closing tag.
///
/// # Example
///
/// ```
/// use wos_client_rs::wos::extract::xml::extract_wos_xml_element;
///
/// let xml = r#"<map name="QueryResult"><val name="QueryID">7</val></map>"#;
/// let map = extract_wos_xml_element(xml, "map", Some(("name", "QueryResult")), true).unwrap();
/// assert_eq!(
///     extract_wos_xml_element(map, "val", Some(("name", "QueryID")), true),
///     Some("7")
/// );
/// assert_eq!(
///     extract_wos_xml_element(xml, "val", None, false),
///     None // the opening tag has an attribute
/// );
/// ```
pub fn extract_wos_xml_element<'a>(
    data: &'a str,
    element: &str,
    attr: Option<(&str, &str)>,
    content_only: bool,
) -> Option<&'a str> {
    let attr_pattern = attr
        .map(|(name, value)| format!(r#" {}="{}""#, regex::escape(name), regex::escape(value)))
        .unwrap_or_default();
    let element = regex::escape(element);
    let pattern = format!(r"(?s)<{element}{attr_pattern}>\s*(.*?)\s*</{element}>");

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(err) => {
            warn!(%pattern, error = %err, "Could not build element pattern");
            return None;
        }
    };

    let captures = re.captures(data)?;
    let group = if content_only { 1 } else { 0 };
    captures.get(group).map(|m| m.as_str())
}

/// Count the `<REC>` elements of a `<records>` block
pub fn count_rec_elements(block: &str) -> Result<usize> {
    let mut reader = Reader::from_str(block);
    let mut count = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"REC" => {
                count += 1;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(WosError::XmlError(format!(
                    "at position {}: {err}",
                    reader.buffer_position()
                )));
            }
        }
    }

    Ok(count)
}

/// Append the `<records>` block of one page
///
/// The whole block is kept as a single entry so that pages can be
/// concatenated into one document later. Returns the number of publications
/// in the appended block (0 when nothing was appended).
pub fn extract_xml(data: &str, records: &mut Vec<Record>) -> usize {
    let Some(block) = extract_wos_xml_element(data, "records", None, false) else {
        warn!(
            payload = %data.chars().take(500).collect::<String>(),
            "WoS: Unexpected return format"
        );
        return 0;
    };

    let publications = count_rec_elements(block).unwrap_or_else(|err| {
        debug!(error = %err, "Falling back to substring count of REC elements");
        block.matches("<REC ").count() + block.matches("<REC>").count()
    });

    if publications == 0 {
        warn!("WoS: No records found!");
        return 0;
    }

    records.push(Record::Xml(block.to_string()));
    debug!(publications, "Extracted XML records block");
    publications
}
