//! Web of Science client for running searches and collecting their records
//!
//! This module talks to the Web of Science Expanded/Lite RESTful APIs,
//! pages through search results and normalises them into records.

pub mod client;
pub mod export;
pub mod extract;
pub mod models;
pub mod responses;

// Re-export public types
pub use client::WosClient;
pub use export::{to_ris_text, write_ris_file, write_text_file};
pub use models::{QueryResultInfo, Record, RisRecord, SearchRequest, TimeSpan};
pub use responses::Page;
