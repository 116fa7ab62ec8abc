use serde_json::Value;

use crate::error::{Result, WosError};
use crate::wos::extract::xml::extract_wos_xml_element;
use crate::wos::models::QueryResultInfo;

/// One decoded API response
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Json(Value),
    Xml(String),
}

impl Page {
    /// Read the query id and total record count
    ///
    /// These are needed to paginate, so their absence is an error rather
    /// than an empty page.
    pub fn result_info(&self) -> Result<QueryResultInfo> {
        match self {
            Page::Json(data) => json_result_info(data),
            Page::Xml(data) => xml_result_info(data),
        }
    }

    /// Record payload of a JSON page
    ///
    /// The first response of a search nests everything under `Data`, later
    /// pages do not. Both shapes come out the same here.
    pub fn into_json_payload(self) -> Option<Value> {
        match self {
            Page::Json(mut data) => {
                let inner = data.as_object_mut().and_then(|map| map.remove("Data"));
                Some(inner.unwrap_or(data))
            }
            Page::Xml(_) => None,
        }
    }
}

fn json_result_info(data: &Value) -> Result<QueryResultInfo> {
    let query_result = data
        .get("QueryResult")
        .ok_or_else(|| WosError::malformed("response has no QueryResult"))?;

    let query_id = match query_result.get("QueryID") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        other => {
            return Err(WosError::malformed(format!(
                "QueryResult has no usable QueryID: {other:?}"
            )));
        }
    };

    let records_found = match query_result.get("RecordsFound") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| WosError::malformed("QueryResult has no usable RecordsFound"))?;

    Ok(QueryResultInfo {
        query_id,
        records_found,
    })
}

fn xml_result_info(data: &str) -> Result<QueryResultInfo> {
    let query_result = extract_wos_xml_element(data, "map", Some(("name", "QueryResult")), true)
        .ok_or_else(|| WosError::malformed("response has no QueryResult map"))?;

    let numeric = |name: &str| -> Result<u64> {
        let raw = extract_wos_xml_element(query_result, "val", Some(("name", name)), true)
            .ok_or_else(|| WosError::malformed(format!("QueryResult has no {name}")))?;
        raw.trim()
            .parse()
            .map_err(|_| WosError::malformed(format!("{name} is not a number: {raw:?}")))
    };

    Ok(QueryResultInfo {
        query_id: numeric("QueryID")?.to_string(),
        records_found: numeric("RecordsFound")? as usize,
    })
}
