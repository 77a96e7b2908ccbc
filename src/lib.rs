//! # Accounting Report Builder
//!
//! A library for reconciling raw retail-order transactions into
//! accountant-ready financial reports with arithmetic integrity.
//!
//! ## Core Concepts
//!
//! - **Ingestion**: sequential paged retrieval of orders in a date window,
//!   over-fetched with a one-day safety buffer and then exactly re-filtered
//!   client-side
//! - **Classification**: per-order decomposition of legacy-encoded monetary
//!   facts (tip vs. processing fee vs. discount vs. tax exemption)
//! - **Aggregation**: a single commutative fold into report totals that
//!   always satisfy `gross = net + discounts`,
//!   `taxable + exempt = net`, and `deposit = collected - fees - refunds`
//! - **Export**: a fully quoted CSV document for a third-party accountant
//!
//! ## Example
//!
//! ```rust,ignore
//! use accounting_report_builder::*;
//! use chrono::NaiveDate;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<()> {
//! let source = HttpOrderSource::new("https://shop.example.com/wp-json/wc/v3");
//! let range = ReportRange::new(
//!     NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
//! )?;
//!
//! let report = generate_accounting_report(
//!     &source,
//!     range,
//!     |p| eprintln!("loaded {} (page {})", p.loaded, p.page),
//!     &CancellationToken::new(),
//! )
//! .await?;
//!
//! std::fs::write(report.filename(), report.to_csv()?)?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod classifier;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod schema;
pub mod utils;

pub use aggregator::{aggregate, detail_rows, DetailRow, ReportTotals};
pub use classifier::{classify, ChargeAnomaly, ChargeBreakdown, ExemptionPolicy, TipSource};
pub use error::{ReportError, Result};
pub use export::{render_csv, report_filename, MAX_DETAIL_ROWS};
pub use ingestion::{
    FetchProgress, HttpOrderSource, IngestionConfig, OrderIngestor, OrderSource, PageQuery,
};
pub use schema::{Billing, FeeLine, MetaDatum, Order, OrderStatus, ReportRange};

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

/// One finished report run: totals plus the bounded detail table. Recomputed
/// from scratch on every invocation; nothing is cached between runs.
#[derive(Debug, Clone)]
pub struct AccountingReport {
    pub range: ReportRange,
    pub totals: ReportTotals,
    pub rows: Vec<DetailRow>,
    pub anomaly_count: usize,
    truncated: bool,
}

impl AccountingReport {
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        render_csv(&self.totals, &self.rows, &self.range, self.truncated)
    }

    pub fn filename(&self) -> String {
        report_filename(&self.range)
    }
}

pub struct ReportEngine {
    ingestion: IngestionConfig,
    policy: ExemptionPolicy,
    max_detail_rows: usize,
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self {
            ingestion: IngestionConfig::default(),
            policy: ExemptionPolicy::default(),
            max_detail_rows: MAX_DETAIL_ROWS,
        }
    }
}

impl ReportEngine {
    pub fn new(ingestion: IngestionConfig, policy: ExemptionPolicy) -> Self {
        Self {
            ingestion,
            policy,
            ..Self::default()
        }
    }

    /// Ingests, classifies, and aggregates one report run.
    ///
    /// Any ingestion failure aborts the run; no degraded or partial report is
    /// ever produced. Classification anomalies do not abort: the report is
    /// still generated (possibly understated) and each anomaly is logged.
    pub async fn generate<S, F>(
        &self,
        source: &S,
        range: ReportRange,
        progress: F,
        cancel: &CancellationToken,
    ) -> Result<AccountingReport>
    where
        S: OrderSource + Sync,
        F: FnMut(FetchProgress),
    {
        info!(
            "Generating accounting report for {} to {}",
            range.start, range.end
        );

        let ingestor = OrderIngestor::new(source, self.ingestion.clone());
        let orders = ingestor.fetch_range(range, progress, cancel).await?;
        debug!("Classifying {} orders", orders.len());

        // No cross-order state in classify(); sequential here, parallel-safe
        // if ingestion volume ever demands it.
        let breakdowns: Vec<ChargeBreakdown> = orders.iter().map(classify).collect();

        let mut anomaly_count = 0;
        for breakdown in &breakdowns {
            for anomaly in &breakdown.anomalies {
                warn!(
                    "Classification anomaly on order {}: {:?}",
                    breakdown.order_id, anomaly
                );
                anomaly_count += 1;
            }
        }

        let pairs = || orders.iter().zip(breakdowns.iter());
        let totals = aggregate(pairs(), self.policy);
        let rows = detail_rows(pairs(), self.policy, self.max_detail_rows);
        let truncated = totals.order_count as usize > rows.len();

        info!(
            "Report complete: {} realized orders, net sales {:.2}, net deposit {:.2}",
            totals.order_count, totals.net_sales, totals.net_deposit
        );

        Ok(AccountingReport {
            range,
            totals,
            rows,
            anomaly_count,
            truncated,
        })
    }
}

/// Convenience wrapper over [`ReportEngine::generate`] with default
/// configuration and the legacy exemption policy.
pub async fn generate_accounting_report<S, F>(
    source: &S,
    range: ReportRange,
    progress: F,
    cancel: &CancellationToken,
) -> Result<AccountingReport>
where
    S: OrderSource + Sync,
    F: FnMut(FetchProgress),
{
    ReportEngine::default()
        .generate(source, range, progress, cancel)
        .await
}
