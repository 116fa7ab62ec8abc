//! # Web of Science Client
//!
//! A Rust client library for the Clarivate Web of Science RESTful API.
//! This crate runs searches, pages through the full result set and returns
//! the records as RIS records, raw JSON objects or raw XML blocks.
//!
//! ## Features
//!
//! - **Paginated search**: every page of a search is fetched through the query
//!   id the API assigns to it
//! - **Three output formats**: RIS, JSON and XML
//! - **RIS export**: render records as Web of Science style tagged text
//! - **Timeout handling**: gateway timeouts are retried with exponential backoff
//! - **Rate limiting**: requests are paced to the allowance of the API key
//!
//! ## Quick Start
//!
//! ```no_run
//! use wos_client_rs::{ClientConfig, TimeSpan, WosClient, to_ris_text, write_ris_file};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WosClient::with_config(ClientConfig::from_yaml_file("config.yml")?)?;
//!
//!     let query = "TS=(uncertain* AND (catchment OR watershed OR water))";
//!     let span = TimeSpan::new("2018-06-01", "2018-12-31")?;
//!
//!     println!("{} records", client.records_found(query, Some(&span), &[]).await?);
//!
//!     let records = client.query(query, Some(&span), &[]).await?;
//!     let ris: Vec<_> = records.iter().filter_map(|r| r.as_ris().cloned()).collect();
//!     write_ris_file(&to_ris_text(&ris), "ris_output", false)?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod retry;
pub mod wos;

// Re-export main types for convenience
pub use config::{ApiKey, ClientConfig, OutputFormat, SearchDefaults};
pub use error::{Result, WosError};
pub use rate_limit::RateLimiter;
pub use retry::RetryConfig;
pub use wos::{
    QueryResultInfo, Record, RisRecord, SearchRequest, TimeSpan, WosClient, to_ris_text,
    write_ris_file, write_text_file,
};
