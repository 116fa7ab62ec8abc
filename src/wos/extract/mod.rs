//! Page-level record extraction
//!
//! One extractor per [`OutputFormat`]. Each appends the records of a single
//! response page to the caller's accumulator and never fails: a page that
//! does not have the expected shape is logged and contributes nothing.

pub mod json;
pub mod ris;
pub mod xml;

use tracing::warn;

use crate::config::OutputFormat;
use crate::wos::models::Record;
use crate::wos::responses::Page;

pub use json::extract_json;
pub use ris::{extract_ris, parse_record};
pub use xml::{count_rec_elements, extract_wos_xml_element, extract_xml};

/// Append the records of `page` to `records`, as shaped by `format`
///
/// Returns the number of publications the page contributed.
pub fn extract_page(format: OutputFormat, page: Page, records: &mut Vec<Record>) -> usize {
    match (format, page) {
        (OutputFormat::Xml, Page::Xml(data)) => extract_xml(&data, records),
        (OutputFormat::Ris, page @ Page::Json(_)) => {
            page.into_json_payload()
                .map_or(0, |payload| extract_ris(payload, records))
        }
        (OutputFormat::Json, page @ Page::Json(_)) => {
            page.into_json_payload()
                .map_or(0, |payload| extract_json(payload, records))
        }
        (format, _) => {
            warn!(%format, "Response body does not match the requested format");
            0
        }
    }
}
