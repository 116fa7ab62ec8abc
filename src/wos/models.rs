use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

use crate::error::{Result, WosError};

/// Parameters of one search request
///
/// Built by [`WosClient::prepare_query`](crate::WosClient::prepare_query) and
/// advanced in place while paginating: only `firstRecord` changes between pages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct SearchRequest {
    params: BTreeMap<String, String>,
}

impl SearchRequest {
    pub const FIRST_RECORD: &'static str = "firstRecord";
    pub const COUNT: &'static str = "count";
    pub const USER_QUERY: &'static str = "usrQuery";
    pub const PUBLISH_TIME_SPAN: &'static str = "publishTimeSpan";

    /// Largest page the API serves
    pub const MAX_COUNT: usize = 100;

    pub fn new(params: BTreeMap<String, String>) -> Self {
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.params.insert(key.into(), value.into());
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Parameters as owned pairs, for error reports
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// 1-based offset of the first record on the requested page
    pub fn first_record(&self) -> Result<usize> {
        let first_record = self.numeric(Self::FIRST_RECORD)?;
        if first_record == 0 {
            return Err(WosError::InvalidQuery(
                "`firstRecord` is 1-based and must be at least 1".to_string(),
            ));
        }
        Ok(first_record)
    }

    /// Page size, at most [`SearchRequest::MAX_COUNT`]
    pub fn count(&self) -> Result<usize> {
        let count = self.numeric(Self::COUNT)?;
        if count > Self::MAX_COUNT {
            return Err(WosError::InvalidQuery(format!(
                "`count` must be between 0 and {}, got {count}",
                Self::MAX_COUNT
            )));
        }
        Ok(count)
    }

    pub fn set_first_record(&mut self, first_record: usize) {
        self.set(Self::FIRST_RECORD, first_record.to_string());
    }

    pub fn set_count(&mut self, count: usize) {
        self.set(Self::COUNT, count.to_string());
    }

    fn numeric(&self, key: &str) -> Result<usize> {
        let raw = self
            .get(key)
            .ok_or_else(|| WosError::InvalidQuery(format!("Missing `{key}` parameter")))?;
        raw.trim().parse().map_err(|_| {
            WosError::InvalidQuery(format!(
                "`{key}` must be a non-negative integer, got {raw:?}"
            ))
        })
    }
}

/// Publication date range restricting a search
///
/// # Example
///
/// ```
/// use wos_client_rs::TimeSpan;
///
/// let span = TimeSpan::new("2018-06-01", "2018-12-31").unwrap();
/// assert_eq!(span.to_string(), "2018-06-01+2018-12-31");
/// assert!(TimeSpan::new("2018-12-31", "2018-06-01").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: Date,
    pub end: Date,
}

impl TimeSpan {
    /// Build a range from two `YYYY-MM-DD` dates
    pub fn new(start: &str, end: &str) -> Result<Self> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        if start > end {
            return Err(WosError::InvalidQuery(format!(
                "Time span starts after it ends: {start} > {end}"
            )));
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Date's Display is ISO 8601 (YYYY-MM-DD)
        write!(f, "{}+{}", self.start, self.end)
    }
}

fn parse_date(value: &str) -> Result<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|err| WosError::InvalidQuery(format!("Invalid date {value:?}: {err}")))
}

/// Search metadata returned with the first page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResultInfo {
    /// Server-side identifier used to fetch later pages
    pub query_id: String,
    /// Total number of records matching the search
    pub records_found: usize,
}

/// One RIS field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Scalar(&'a str),
    List(&'a [String]),
}

/// A publication normalised to the Web of Science RIS field set
///
/// Serializes as a mapping from RIS tags to values, in tag order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RisRecord {
    /// Publication type
    #[serde(rename = "TY")]
    pub publication_type: String,
    /// Authors, WoS standard form ("Smith, J")
    #[serde(rename = "AU")]
    pub authors: Vec<String>,
    /// Author full names
    #[serde(rename = "AF")]
    pub author_full_names: Vec<String>,
    #[serde(rename = "TI")]
    pub title: String,
    #[serde(rename = "AB")]
    pub abstract_text: String,
    /// Source (journal or proceedings title)
    #[serde(rename = "SO")]
    pub source: String,
    #[serde(rename = "LA")]
    pub language: String,
    /// "{pubtype} {doctype}"
    #[serde(rename = "DT")]
    pub document_type: String,
    /// Author keywords
    #[serde(rename = "DE")]
    pub keywords: Vec<String>,
    /// Keywords Plus (generated by Web of Science)
    #[serde(rename = "ID")]
    pub keywords_plus: Vec<String>,
    #[serde(rename = "PY")]
    pub pub_year: String,
    #[serde(rename = "PD")]
    pub sort_date: String,
    /// Web of Science accession number
    #[serde(rename = "UT")]
    pub uid: String,
    #[serde(rename = "DI")]
    pub doi: String,
}

impl RisRecord {
    /// Tags and values in emission order
    pub fn fields(&self) -> [(&'static str, FieldValue<'_>); 14] {
        use FieldValue::{List, Scalar};
        [
            ("TY", Scalar(&self.publication_type)),
            ("AU", List(&self.authors)),
            ("AF", List(&self.author_full_names)),
            ("TI", Scalar(&self.title)),
            ("AB", Scalar(&self.abstract_text)),
            ("SO", Scalar(&self.source)),
            ("LA", Scalar(&self.language)),
            ("DT", Scalar(&self.document_type)),
            ("DE", List(&self.keywords)),
            ("ID", List(&self.keywords_plus)),
            ("PY", Scalar(&self.pub_year)),
            ("PD", Scalar(&self.sort_date)),
            ("UT", Scalar(&self.uid)),
            ("DI", Scalar(&self.doi)),
        ]
    }
}

/// One extracted result, shaped by the client's [`OutputFormat`](crate::OutputFormat)
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Normalised RIS record (one publication)
    Ris(RisRecord),
    /// Raw JSON record object (one publication)
    Json(serde_json::Value),
    /// A whole `<records>` block (all publications of one page)
    Xml(String),
}

impl Record {
    pub fn as_ris(&self) -> Option<&RisRecord> {
        match self {
            Record::Ris(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Record::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&str> {
        match self {
            Record::Xml(block) => Some(block),
            _ => None,
        }
    }
}
