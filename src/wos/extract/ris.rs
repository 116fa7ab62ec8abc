//! Normalisation of Web of Science JSON records into RIS records
//!
//! WoS JSON mirrors its XML schema: any element that may repeat is emitted
//! as an object when it occurs once and as a list otherwise. Every lookup
//! here accepts both shapes, and any missing subtree yields an empty value
//! so that a record is never dropped for lack of optional metadata.

use serde_json::Value;
use tracing::debug;

use crate::wos::extract::json::take_rec_list;
use crate::wos::models::{Record, RisRecord};

/// Append the RIS form of every record on one page
///
/// Returns the number of records appended.
pub fn extract_ris(payload: Value, records: &mut Vec<Record>) -> usize {
    let Some(list) = take_rec_list(payload) else {
        return 0;
    };

    let appended = list.len();
    records.extend(list.iter().map(|rec| Record::Ris(parse_record(rec))));
    debug!(appended, total = records.len(), "Extracted RIS records");
    appended
}

/// Map one raw WoS record onto the RIS field set
pub fn parse_record(rec: &Value) -> RisRecord {
    let static_data = &rec["static_data"];
    let summary = &static_data["summary"];
    let pub_info = &summary["pub_info"];
    let full_metadata = &static_data["fullrecord_metadata"];

    let (authors, author_full_names) = extract_authors(summary);
    let (title, source) = extract_titles(summary);
    let pubtype = text(&pub_info["pubtype"]);

    RisRecord {
        publication_type: pubtype.clone(),
        authors,
        author_full_names,
        title,
        abstract_text: extract_abstract(full_metadata),
        source,
        language: extract_language(full_metadata),
        document_type: document_type(&pubtype, &summary["doctypes"]["doctype"]),
        keywords: texts(&full_metadata["keywords"]["keyword"]),
        keywords_plus: texts(&static_data["item"]["keywords_plus"]["keyword"]),
        pub_year: text(&pub_info["pubyear"]),
        sort_date: text(&pub_info["sortdate"]),
        uid: text(&rec["UID"]),
        doi: extract_doi(&rec["dynamic_data"]["cluster_related"]["identifiers"]["identifier"]),
    }
}

/// Authors in WoS standard form and in full, restricted to the "author" role
fn extract_authors(summary: &Value) -> (Vec<String>, Vec<String>) {
    let mut authors = Vec::new();
    let mut full_names = Vec::new();

    for person in as_list(&summary["names"]["name"]) {
        let is_author = person["role"]
            .as_str()
            .is_some_and(|role| role.eq_ignore_ascii_case("author"));
        if is_author {
            authors.push(text(&person["wos_standard"]));
            full_names.push(text(&person["full_name"]));
        }
    }

    (authors, full_names)
}

/// Item title and source title
fn extract_titles(summary: &Value) -> (String, String) {
    let titles = as_list(&summary["titles"]["title"]);
    let find = |kind: &str| {
        titles
            .iter()
            .find(|t| t["type"].as_str() == Some(kind))
            .map(|t| text(&t["content"]))
            .unwrap_or_default()
    };
    (find("item"), find("source"))
}

fn extract_abstract(full_metadata: &Value) -> String {
    let Some(first) = as_list(&full_metadata["abstracts"]["abstract"])
        .into_iter()
        .next()
    else {
        return String::new();
    };
    texts(&first["abstract_text"]["p"]).join(" ")
}

fn extract_language(full_metadata: &Value) -> String {
    as_list(&full_metadata["normalized_languages"]["language"])
        .into_iter()
        .map(|lang| match lang {
            Value::Object(_) => text(&lang["content"]),
            other => text(other),
        })
        .find(|lang| !lang.is_empty())
        .unwrap_or_default()
}

fn document_type(pubtype: &str, doctype: &Value) -> String {
    let doctypes = texts(doctype).join("; ");
    format!("{pubtype} {doctypes}").trim().to_string()
}

/// DOI, preferring the publisher `doi` over the cross-referenced `xref_doi`
fn extract_doi(identifiers: &Value) -> String {
    let identifiers = as_list(identifiers);
    let by_type = |kind: &str| {
        identifiers
            .iter()
            .find(|id| id["type"].as_str() == Some(kind))
            .map(|id| text(&id["value"]))
    };

    by_type("doi")
        .or_else(|| by_type("xref_doi"))
        .unwrap_or_default()
}

/// View a value that may be a single item or a list of items as a list
fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn texts(value: &Value) -> Vec<String> {
    as_list(value)
        .into_iter()
        .map(text)
        .filter(|s| !s.is_empty())
        .collect()
}
