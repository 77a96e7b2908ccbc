use crate::classifier::{ChargeBreakdown, ExemptionPolicy};
use crate::schema::{Order, OrderStatus};
use chrono::NaiveDateTime;

/// Report-level totals for one run. Produced fresh on every invocation;
/// nothing is cached across date-range changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTotals {
    pub gross_sales: f64,
    pub discounts: f64,
    pub net_sales: f64,
    pub taxable_sales: f64,
    pub tax_exempt_sales: f64,
    pub sales_tax_collected: f64,
    pub tips: f64,
    pub processing_fees: f64,
    pub total_collected: f64,
    pub refunds: f64,
    pub net_deposit: f64,
    pub order_count: u32,
    pub tax_exempt_order_count: u32,
}

/// One realized-sale line in the exported detail table.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub order_id: u64,
    pub date: NaiveDateTime,
    pub customer: String,
    pub subtotal: f64,
    pub discount: f64,
    /// None renders as "Exempt".
    pub tax: Option<f64>,
    pub tip: f64,
    pub processing_fee: f64,
    pub total: f64,
}

/// Folds classified orders into one [`ReportTotals`].
///
/// Summation only, so the fold is commutative and associative: input order
/// never affects the result, and an empty input yields all-zero totals.
pub fn aggregate<'a, I>(pairs: I, policy: ExemptionPolicy) -> ReportTotals
where
    I: IntoIterator<Item = (&'a Order, &'a ChargeBreakdown)>,
{
    let mut totals = ReportTotals::default();

    for (order, breakdown) in pairs {
        match order.status {
            OrderStatus::Completed | OrderStatus::Processing => {
                let order_total = breakdown.subtotal + breakdown.tax + breakdown.tip;

                totals.gross_sales += breakdown.subtotal + breakdown.discount;
                totals.discounts += breakdown.discount;
                totals.net_sales += breakdown.subtotal;
                totals.sales_tax_collected += breakdown.tax;
                totals.tips += breakdown.tip;
                totals.processing_fees += breakdown.processing_fee;
                totals.total_collected += order_total;

                if breakdown.is_exempt(policy) {
                    totals.tax_exempt_sales += breakdown.subtotal;
                    totals.tax_exempt_order_count += 1;
                } else {
                    totals.taxable_sales += breakdown.subtotal;
                }

                totals.order_count += 1;
            }
            // Refunded orders contribute their total to refunds and nothing
            // else; all other statuses are ignored entirely.
            OrderStatus::Refunded => {
                totals.refunds += breakdown.subtotal + breakdown.tax + breakdown.tip;
            }
            _ => {}
        }
    }

    totals.net_deposit = totals.total_collected - totals.processing_fees - totals.refunds;
    totals
}

/// Projects realized sales into detail rows, capped at `max_rows`.
pub fn detail_rows<'a, I>(
    pairs: I,
    policy: ExemptionPolicy,
    max_rows: usize,
) -> Vec<DetailRow>
where
    I: IntoIterator<Item = (&'a Order, &'a ChargeBreakdown)>,
{
    pairs
        .into_iter()
        .filter(|(order, _)| order.status.is_realized_sale())
        .take(max_rows)
        .map(|(order, breakdown)| DetailRow {
            order_id: order.id,
            date: order.date_created,
            customer: order.customer_name(),
            subtotal: breakdown.subtotal,
            discount: breakdown.discount,
            tax: if breakdown.is_exempt(policy) {
                None
            } else {
                Some(breakdown.tax)
            },
            tip: breakdown.tip,
            processing_fee: breakdown.processing_fee,
            total: breakdown.subtotal + breakdown.tax + breakdown.tip,
        })
        .collect()
}
