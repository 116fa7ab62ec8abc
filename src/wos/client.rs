use indicatif::ProgressBar;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, instrument, warn};

use crate::config::{ApiKey, ClientConfig, OutputFormat};
use crate::error::{Result, WosError};
use crate::rate_limit::RateLimiter;
use crate::retry::with_retry;
use crate::wos::extract::extract_page;
use crate::wos::models::{QueryResultInfo, Record, SearchRequest, TimeSpan};
use crate::wos::responses::Page;

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-ApiKey";

/// Client for the Web of Science RESTful API
///
/// A search is sent once; the server answers with the first page of results,
/// the total number of matches and a query id. Every later page is requested
/// from the `query/{id}` sub-resource of that same search, so the whole result
/// set comes from one consistent server-side session.
#[derive(Clone)]
pub struct WosClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
    rate_limiter: RateLimiter,
    config: ClientConfig,
    progress: ProgressBar,
}

impl WosClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// * `WosError::ConfigurationError` - If the configuration has no API key
    /// * `WosError::RequestError` - If the HTTP client cannot be built
    ///
    /// # Example
    ///
    /// ```
    /// use wos_client_rs::{ClientConfig, WosClient};
    ///
    /// let config = ClientConfig::new().with_api_key("your_api_key_here");
    /// let client = WosClient::with_config(config).unwrap();
    ///
    /// assert!(WosClient::with_config(ClientConfig::new()).is_err());
    /// ```
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.effective_user_agent());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(builder.build()?, config)
    }

    /// Create a new client around a custom reqwest client
    pub fn with_client(client: Client, config: ClientConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            WosError::ConfigurationError("No valid API key could be found".to_string())
        })?;

        Ok(Self {
            client,
            base_url: config.effective_base_url().to_string(),
            api_key,
            rate_limiter: config.create_rate_limiter(),
            config,
            progress: ProgressBar::hidden(),
        })
    }

    /// Report page retrieval progress on `progress`
    ///
    /// The bar's length is set to the number of requests a search needs, and
    /// it advances once per retrieved page.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.config.format
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the parameters of a search
    ///
    /// `overrides` replace the configured defaults (database, edition, page
    /// size, ...) key by key; every default that is not overridden is kept.
    /// The query string always sets `usrQuery`, and a time span sets
    /// `publishTimeSpan` as `start+end`.
    ///
    /// # Example
    ///
    /// ```
    /// use wos_client_rs::{ClientConfig, TimeSpan, WosClient};
    ///
    /// let client = WosClient::with_config(ClientConfig::new().with_api_key("key")).unwrap();
    /// let span = TimeSpan::new("2018-06-01", "2018-12-31").unwrap();
    ///
    /// let search = client.prepare_query("TS=(catchment)", Some(&span), &[("count", "50")]);
    /// assert_eq!(search.get("count"), Some("50"));
    /// assert_eq!(search.get("databaseId"), Some("WOS"));
    /// assert_eq!(search.get("usrQuery"), Some("TS=(catchment)"));
    /// assert_eq!(search.get("publishTimeSpan"), Some("2018-06-01+2018-12-31"));
    /// ```
    pub fn prepare_query(
        &self,
        query: &str,
        time_span: Option<&TimeSpan>,
        overrides: &[(&str, &str)],
    ) -> SearchRequest {
        let mut search = SearchRequest::new(self.config.search_defaults.to_params());

        for (key, value) in overrides {
            search.set(*key, *value);
        }

        search.set(SearchRequest::USER_QUERY, query);

        if let Some(span) = time_span {
            search.set(SearchRequest::PUBLISH_TIME_SPAN, span.to_string());
        }

        search
    }

    /// Number of records matching a search, without retrieving any of them
    ///
    /// Sends the search with a page size of zero.
    #[instrument(skip(self, time_span, overrides), fields(query = %query))]
    pub async fn records_found(
        &self,
        query: &str,
        time_span: Option<&TimeSpan>,
        overrides: &[(&str, &str)],
    ) -> Result<usize> {
        let mut search = self.prepare_query(query, time_span, overrides);
        search.set_count(0);

        let page = self.get_response(&self.base_url, &search).await?;
        let QueryResultInfo { records_found, .. } = page.result_info()?;

        info!(records_found, "WoS: Found {} records", records_found);
        Ok(records_found)
    }

    /// Run a search and retrieve every matching record
    ///
    /// Records come back in server order, page after page. A page with an
    /// unexpected shape is logged and skipped; any HTTP failure other than a
    /// gateway timeout aborts the whole search.
    ///
    /// # Errors
    ///
    /// * `WosError::QueryError` - If the API rejects a request, or keeps timing
    ///   out after all retries
    /// * `WosError::MalformedResponse` - If the first response lacks the query id
    ///   or record count
    /// * `WosError::InvalidQuery` - If `firstRecord` or `count` is not a number
    ///
    /// # Example
    ///
    /// ```no_run
    /// use wos_client_rs::{ClientConfig, TimeSpan, WosClient, to_ris_text};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = ClientConfig::from_yaml_file("config.yml")?;
    ///     let client = WosClient::with_config(config)?;
    ///
    ///     let span = TimeSpan::new("2018-06-01", "2018-12-31")?;
    ///     let records = client
    ///         .query("TS=(uncertain* AND (catchment OR watershed OR water))", Some(&span), &[])
    ///         .await?;
    ///
    ///     let ris: Vec<_> = records.iter().filter_map(|r| r.as_ris().cloned()).collect();
    ///     println!("{}", to_ris_text(&ris));
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip(self, time_span, overrides), fields(query = %query, format = %self.config.format))]
    pub async fn query(
        &self,
        query: &str,
        time_span: Option<&TimeSpan>,
        overrides: &[(&str, &str)],
    ) -> Result<Vec<Record>> {
        let mut search = self.prepare_query(query, time_span, overrides);
        let page_size = search.count()?;
        let mut first_record = search.first_record()?;

        let page = self.get_response(&self.base_url, &search).await?;
        let QueryResultInfo {
            query_id,
            records_found,
        } = page.result_info()?;
        info!(
            records_found,
            page_size,
            "WoS: Found {} records, retrieving in batches of {}",
            records_found,
            page_size
        );

        let mut records = Vec::new();
        extract_page(self.config.format, page, &mut records);

        let pages_left = remaining_pages(first_record, page_size, records_found);
        if pages_left == 0 {
            return Ok(records);
        }

        let encoded_id = urlencoding::encode(&query_id);
        let query_url = format!("{}/query/{encoded_id}", self.base_url);

        self.progress.set_length(pages_left as u64 + 1);
        self.progress.set_position(1);

        while let Some(next) = first_record
            .checked_add(page_size)
            .filter(|next| *next <= records_found)
        {
            first_record = next;
            search.set_first_record(first_record);

            let page = self.get_response(&query_url, &search).await?;
            let extracted = extract_page(self.config.format, page, &mut records);
            debug!(first_record, extracted, "Retrieved page");

            self.progress.inc(1);
        }
        self.progress.finish();

        info!(retrieved = records.len(), "WoS: Retrieval complete");
        Ok(records)
    }

    /// Send a request and decode its body according to the output format
    async fn get_response(&self, url: &str, search: &SearchRequest) -> Result<Page> {
        let response = self.send_query(url, search).await?;
        match self.config.format {
            OutputFormat::Xml => Ok(Page::Xml(response.text().await?)),
            OutputFormat::Ris | OutputFormat::Json => Ok(Page::Json(response.json().await?)),
        }
    }

    /// Send one GET request, re-sending it unchanged on gateway timeouts
    async fn send_query(&self, url: &str, search: &SearchRequest) -> Result<Response> {
        with_retry(
            || async move {
                self.rate_limiter.acquire().await?;
                debug!(url, params = ?search.params(), "Sending WoS API request");

                let response = self
                    .client
                    .get(url)
                    .header(API_KEY_HEADER, self.api_key.as_str())
                    .header(ACCEPT, self.config.format.mime_type())
                    .query(search)
                    .send()
                    .await?;

                if response.status() == StatusCode::OK {
                    return Ok(response);
                }

                Err(query_error(response, search).await)
            },
            &self.config.retry_config,
            "WoS API request",
        )
        .await
    }
}

/// Pages still to fetch after the one starting at `first_record`
fn remaining_pages(first_record: usize, page_size: usize, records_found: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    records_found.saturating_sub(first_record) / page_size
}

async fn query_error(response: Response, search: &SearchRequest) -> WosError {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response.text().await.unwrap_or_default();

    if status != crate::error::GATEWAY_TIMEOUT {
        warn!(status, "WoS API request failed");
    }

    WosError::QueryError {
        status,
        headers,
        body,
        params: search.to_pairs(),
    }
}
