//! Generates last month's accounting report from a live order source and
//! writes the CSV next to the binary.
//!
//! Usage: cargo run --example monthly_report -- <base-url>

use accounting_report_builder::*;
use chrono::{Datelike, Local, NaiveDate};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://shop.example.com/wp-json/wc/v3".to_string());

    let today = Local::now().date_naive();
    let first_of_this_month = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap();
    let end = first_of_this_month.pred_opt().unwrap();
    let start = NaiveDate::from_ymd_opt(end.year(), end.month(), 1).unwrap();
    let range = ReportRange::new(start, end)?;

    let source = HttpOrderSource::new(base_url);
    let report = generate_accounting_report(
        &source,
        range,
        |p| {
            if p.is_complete {
                eprintln!("done: {} orders in range", p.loaded);
            } else {
                eprintln!("page {}: {} orders loaded", p.page, p.loaded);
            }
        },
        &CancellationToken::new(),
    )
    .await?;

    let t = &report.totals;
    println!("Net sales:      {:>10.2}", t.net_sales);
    println!("Tax collected:  {:>10.2}", t.sales_tax_collected);
    println!("Tips:           {:>10.2}", t.tips);
    println!("Fees:           {:>10.2}", t.processing_fees);
    println!("Refunds:        {:>10.2}", t.refunds);
    println!("Net deposit:    {:>10.2}", t.net_deposit);
    if report.anomaly_count > 0 {
        eprintln!("warning: {} classification anomalies", report.anomaly_count);
    }

    let filename = report.filename();
    std::fs::write(&filename, report.to_csv()?)?;
    println!("wrote {}", filename);
    Ok(())
}
