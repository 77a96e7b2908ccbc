use crate::error::{ReportError, Result};
use crate::schema::{Order, ReportRange};
use crate::utils::{day_after, day_start};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::{debug, warn};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Query for one page of the order source's list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Inclusive lower bound on creation time.
    pub after: NaiveDateTime,
    /// Exclusive upper bound on creation time (backend convention).
    pub before: NaiveDateTime,
    pub page: u32,
    pub per_page: u32,
}

/// Progress snapshot delivered after every page and once on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchProgress {
    pub loaded: usize,
    pub page: u32,
    pub is_complete: bool,
}

/// A paginated producer of raw orders. The engine only needs page-at-a-time
/// access, so tests substitute an in-memory implementation.
#[async_trait]
pub trait OrderSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Order>>;
}

#[async_trait]
impl<'a, S: OrderSource + Sync> OrderSource for &'a S {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Order>> {
        (**self).fetch_page(query).await
    }
}

/// Order source backed by the platform's REST list endpoint.
#[derive(Clone)]
pub struct HttpOrderSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OrderSource for HttpOrderSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Order>> {
        let url = format!("{}/orders", self.base_url);
        let res = self
            .client
            .get(&url)
            .query(&[
                ("after", query.after.format("%Y-%m-%dT%H:%M:%S").to_string()),
                ("before", query.before.format("%Y-%m-%dT%H:%M:%S").to_string()),
                ("page", query.page.to_string()),
                ("per_page", query.per_page.to_string()),
                ("order", "asc".to_string()),
                ("orderby", "date".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        // Parse to a generic value first so a non-list payload becomes a
        // MalformedPage instead of an opaque decode error.
        let body: Value = res.json().await?;
        if !body.is_array() {
            return Err(ReportError::MalformedPage {
                page: query.page,
                details: "expected a JSON array of orders".to_string(),
            });
        }
        serde_json::from_value(body).map_err(|e| ReportError::MalformedPage {
            page: query.page,
            details: e.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub page_size: u32,
    /// Safety cap on pages fetched per run; hitting it is a fused stop, not
    /// an error.
    pub max_pages: u32,
    /// Pause between page requests as a rate-limit backoff. Not
    /// correctness-critical.
    pub page_delay: Duration,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 50,
            page_delay: Duration::from_millis(150),
        }
    }
}

/// Sequential paged retrieval of every order created within a date range.
pub struct OrderIngestor<S> {
    source: S,
    config: IngestionConfig,
}

impl<S: OrderSource> OrderIngestor<S> {
    pub fn new(source: S, config: IngestionConfig) -> Self {
        Self { source, config }
    }

    /// Fetches all orders in `range`.
    ///
    /// The server-side `before` filter is exclusive and timezone-approximate,
    /// so the query upper bound is widened by one calendar day and the
    /// accumulated set is re-filtered client-side to the exact window. Pages
    /// are fetched strictly sequentially: page N+1 is requested only after
    /// page N came back full. Any page failure aborts the whole run with no
    /// partial result; a triggered `cancel` token discards the run with
    /// [`ReportError::Cancelled`].
    pub async fn fetch_range<F>(
        &self,
        range: ReportRange,
        mut progress: F,
        cancel: &CancellationToken,
    ) -> Result<Vec<Order>>
    where
        F: FnMut(FetchProgress),
    {
        let mut query = PageQuery {
            after: day_start(range.start),
            before: day_start(day_after(range.end)),
            page: 1,
            per_page: self.config.page_size,
        };

        let mut accumulated: Vec<Order> = Vec::new();

        loop {
            if cancel.is_cancelled() {
                debug!("Fetch for {:?} superseded; discarding", range);
                return Err(ReportError::Cancelled);
            }

            let page = self.source.fetch_page(&query).await?;
            let page_len = page.len();
            accumulated.extend(page);

            progress(FetchProgress {
                loaded: accumulated.len(),
                page: query.page,
                is_complete: false,
            });
            debug!(
                "Page {}: {} orders ({} accumulated)",
                query.page,
                page_len,
                accumulated.len()
            );

            if (page_len as u32) < self.config.page_size {
                break;
            }
            if query.page >= self.config.max_pages {
                warn!(
                    "Page safety cap {} reached for {:?}; stopping",
                    self.config.max_pages, range
                );
                break;
            }

            query.page += 1;
            sleep(self.config.page_delay).await;
        }

        // The server-side window was only a superset guard; the order's own
        // timestamp decides membership.
        let before_filter = accumulated.len();
        accumulated.retain(|order| range.contains(order.date_created));
        debug!(
            "Exact re-filter kept {} of {} fetched orders",
            accumulated.len(),
            before_filter
        );

        progress(FetchProgress {
            loaded: accumulated.len(),
            page: query.page,
            is_complete: true,
        });

        Ok(accumulated)
    }
}
