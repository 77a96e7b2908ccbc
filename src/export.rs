use crate::aggregator::{DetailRow, ReportTotals};
use crate::error::Result;
use crate::schema::ReportRange;
use crate::utils::round_cents;
use csv::{QuoteStyle, WriterBuilder};

/// Upper bound on detail rows in one export. When hit, a marker row says so
/// rather than truncating silently.
pub const MAX_DETAIL_ROWS: usize = 1000;

/// Filename encoding the exact report window for traceability.
pub fn report_filename(range: &ReportRange) -> String {
    format!(
        "accounting-report-{}-to-{}.csv",
        range.start.format("%Y-%m-%d"),
        range.end.format("%Y-%m-%d")
    )
}

fn fmt_money(value: f64) -> String {
    format!("{:.2}", round_cents(value))
}

/// Subtracted amounts are shown parenthesized in summary rows, the way an
/// accountant reads a deduction.
fn fmt_deduction(value: f64) -> String {
    format!("({:.2})", round_cents(value))
}

/// Renders totals plus the detail table into CSV bytes.
///
/// Pure function of its inputs; no network or storage. Every cell is quoted
/// so a customer name containing a comma cannot shift columns.
pub fn render_csv(
    totals: &ReportTotals,
    rows: &[DetailRow],
    range: &ReportRange,
    truncated: bool,
) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record([
        "Accounting Report",
        &format!(
            "{} to {}",
            range.start.format("%Y-%m-%d"),
            range.end.format("%Y-%m-%d")
        ),
    ])?;
    writer.write_record(["", ""])?;

    writer.write_record(["Sales Summary", ""])?;
    writer.write_record(["Gross Sales", &fmt_money(totals.gross_sales)])?;
    writer.write_record(["Discounts", &fmt_deduction(totals.discounts)])?;
    writer.write_record(["Net Sales", &fmt_money(totals.net_sales)])?;
    writer.write_record(["Orders", &totals.order_count.to_string()])?;
    writer.write_record(["", ""])?;

    writer.write_record(["Sales Tax Remittance", ""])?;
    writer.write_record(["Taxable Sales", &fmt_money(totals.taxable_sales)])?;
    writer.write_record(["Tax-Exempt Sales", &fmt_money(totals.tax_exempt_sales)])?;
    writer.write_record([
        "Tax-Exempt Orders",
        &totals.tax_exempt_order_count.to_string(),
    ])?;
    writer.write_record([
        "Sales Tax Collected",
        &fmt_money(totals.sales_tax_collected),
    ])?;
    writer.write_record(["", ""])?;

    writer.write_record(["Tips for Payroll", ""])?;
    writer.write_record(["Tips Collected", &fmt_money(totals.tips)])?;
    writer.write_record(["", ""])?;

    writer.write_record(["Payment Processing", ""])?;
    writer.write_record(["Processing Fees", &fmt_deduction(totals.processing_fees)])?;
    writer.write_record(["Refunds", &fmt_deduction(totals.refunds)])?;
    writer.write_record(["", ""])?;

    writer.write_record(["Cash Flow", ""])?;
    writer.write_record(["Total Collected", &fmt_money(totals.total_collected)])?;
    writer.write_record(["Processing Fees", &fmt_deduction(totals.processing_fees)])?;
    writer.write_record(["Refunds", &fmt_deduction(totals.refunds)])?;
    writer.write_record(["Net Deposit", &fmt_money(totals.net_deposit)])?;
    writer.write_record(["", ""])?;

    writer.write_record(["Order Details", ""])?;
    writer.write_record([
        "Order ID",
        "Date",
        "Customer",
        "Subtotal",
        "Discount",
        "Tax",
        "Tip",
        "Processing Fee",
        "Total",
    ])?;

    for row in rows {
        writer.write_record([
            row.order_id.to_string(),
            row.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.customer.clone(),
            fmt_money(row.subtotal),
            fmt_money(row.discount),
            row.tax.map(fmt_money).unwrap_or_else(|| "Exempt".to_string()),
            fmt_money(row.tip),
            fmt_money(row.processing_fee),
            fmt_money(row.total),
        ])?;
    }

    if truncated {
        writer.write_record([
            format!("(detail table truncated at {} rows)", MAX_DETAIL_ROWS),
            String::new(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(bytes)
}
