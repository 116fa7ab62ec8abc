//! RIS export
//!
//! Produces the tagged text format written by Web of Science itself: a
//! two-line file header, then one block per record made of `TAG value`
//! lines. Multi-valued fields put each value on its own line, indented
//! by three spaces under the tag. Every block ends with `ER` and a blank line.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, WosError};
use crate::wos::models::{FieldValue, RisRecord};

/// File header identifying the data source
pub const RIS_HEADER: &str = "FN Clarivate Analytics Web of Science\nVR 1.0\n";

/// End-of-record marker
pub const END_OF_RECORD: &str = "ER";

/// Separator between the values of a multi-valued field
const LIST_SEPARATOR: &str = "\n   ";

/// Serialize records as RIS text
///
/// # Example
///
/// ```
/// use wos_client_rs::{RisRecord, to_ris_text};
///
/// let record = RisRecord {
///     title: "A title".to_string(),
///     authors: vec!["Smith, J".to_string(), "Doe, J".to_string()],
///     ..Default::default()
/// };
///
/// let text = to_ris_text(&[record]);
/// assert!(text.starts_with("FN Clarivate Analytics Web of Science\nVR 1.0\n"));
/// assert!(text.contains("AU Smith, J\n   Doe, J\n"));
/// assert!(text.ends_with("ER\n\n"));
/// ```
pub fn to_ris_text(records: &[RisRecord]) -> String {
    let mut out = String::from(RIS_HEADER);

    for record in records {
        for (tag, value) in record.fields() {
            let value = match value {
                FieldValue::Scalar(s) => s.to_string(),
                FieldValue::List(items) => items
                    .iter()
                    .map(String::as_str)
                    .filter(|item| !is_placeholder(item))
                    .collect::<Vec<_>>()
                    .join(LIST_SEPARATOR),
            };
            out.push_str(tag);
            out.push(' ');
            out.push_str(&value);
            out.push('\n');
        }
        out.push_str(END_OF_RECORD);
        out.push_str("\n\n");
    }

    out
}

// WoS fills gaps in name lists with a bare ", "
fn is_placeholder(item: &str) -> bool {
    item.trim().is_empty() || item == ", "
}

/// Write RIS text to `path`
///
/// A path without an extension gets `.txt`. An existing file is only
/// replaced when `overwrite` is set. Returns the path written.
pub fn write_ris_file<P: AsRef<Path>>(text: &str, path: P, overwrite: bool) -> Result<PathBuf> {
    write_text_file(text, path, "txt", overwrite)
}

/// Write `text` to `path`, adding `default_extension` when the path has none
pub fn write_text_file<P: AsRef<Path>>(
    text: &str,
    path: P,
    default_extension: &str,
    overwrite: bool,
) -> Result<PathBuf> {
    let mut path = path.as_ref().to_path_buf();
    if path.extension().is_none() {
        path.set_extension(default_extension);
    }

    if path.exists() && !overwrite {
        return Err(WosError::OutputExists {
            path: path.display().to_string(),
        });
    }

    fs::write(&path, text)?;
    info!(path = %path.display(), bytes = text.len(), "Wrote output file");
    Ok(path)
}
