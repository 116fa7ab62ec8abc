use serde_json::Value;
use tracing::{debug, warn};

use crate::wos::models::Record;

/// Longest payload excerpt written to the log for an unexpected page
const EXCERPT_LEN: usize = 500;

/// Take the `Records.records.REC` list out of a page payload
///
/// The API occasionally returns pages without records (an empty `records`
/// string, or no `Records` at all). Those are logged and yield `None`; they
/// never abort a search.
pub(crate) fn take_rec_list(mut payload: Value) -> Option<Vec<Value>> {
    let Some(records) = payload.get_mut("Records") else {
        warn!(payload = %excerpt(&payload), "WoS: Unexpected return format");
        return None;
    };

    let Some(inner) = records.get_mut("records") else {
        warn!("WoS: No records found for request");
        return None;
    };

    match inner.get_mut("REC").map(Value::take) {
        Some(Value::Array(list)) => Some(list),
        // A page holding a single publication may carry it unwrapped
        Some(single @ Value::Object(_)) => Some(vec![single]),
        Some(other) => {
            warn!(value = %excerpt(&other), "WoS: REC is neither a list nor a record");
            None
        }
        None => {
            warn!("WoS: No records found!");
            None
        }
    }
}

/// Append the raw record objects of one page
///
/// Returns the number of records appended.
pub fn extract_json(payload: Value, records: &mut Vec<Record>) -> usize {
    let Some(list) = take_rec_list(payload) else {
        return 0;
    };

    let appended = list.len();
    records.extend(list.into_iter().map(Record::Json));
    debug!(appended, total = records.len(), "Extracted JSON records");
    appended
}

fn excerpt(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > EXCERPT_LEN {
        let mut end = EXCERPT_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        text.push_str("...");
    }
    text
}
