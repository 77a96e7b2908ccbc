use crate::schema::{
    Order, PROCESSING_FEE_ATTRIBUTE_KEY, TAX_EXEMPT_ATTRIBUTE_KEY, TIP_ATTRIBUTE_KEYS,
};
use crate::utils::parse_money;

/// Where a tip amount was found. The legacy encodings live only here; the
/// aggregator consumes the single resolved amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TipSource {
    /// A fee line whose name mentions "tip".
    FeeLine(f64),
    /// A tagged attribute under one of the accepted tip keys.
    Attribute(f64),
    None,
}

impl TipSource {
    pub fn amount(self) -> f64 {
        match self {
            TipSource::FeeLine(v) | TipSource::Attribute(v) => v,
            TipSource::None => 0.0,
        }
    }
}

/// Which orders count as tax-exempt when bucketing net sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExemptionPolicy {
    /// Legacy behavior: the exemption flag OR a zero tax total. Zero-rated
    /// line items are counted as exempt even without the flag.
    #[default]
    FlagOrZeroTax,
    /// Only the explicit exemption flag counts.
    ExplicitFlagOnly,
}

/// Data problems found while decomposing an order. The report is still
/// generated; these keep the zero-defaulting visible instead of silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeAnomaly {
    /// total - tax - tip came out below zero.
    NegativeSubtotal,
    /// A monetary field did not parse; it contributed 0.00.
    UnparseableAmount(&'static str),
}

/// Per-order decomposition of the charged amount.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeBreakdown {
    pub order_id: u64,
    pub subtotal: f64,
    pub discount: f64,
    pub tax: f64,
    pub tip: f64,
    pub tip_source: TipSource,
    pub processing_fee: f64,
    /// The raw exemption attribute, untouched by policy.
    pub exempt_flag: bool,
    /// Zero tax total, kept separate from the flag: zero-rated items are not
    /// necessarily formally exempt, and the bucketing policy decides.
    pub zero_tax: bool,
    pub anomalies: Vec<ChargeAnomaly>,
}

impl ChargeBreakdown {
    pub fn is_exempt(&self, policy: ExemptionPolicy) -> bool {
        match policy {
            ExemptionPolicy::FlagOrZeroTax => self.exempt_flag || self.zero_tax,
            ExemptionPolicy::ExplicitFlagOnly => self.exempt_flag,
        }
    }
}

/// Decomposes one raw order into a [`ChargeBreakdown`].
///
/// Pure function: classification of one order never reads another order's
/// state, so callers are free to run it concurrently.
///
/// Missing or unparseable numerics default to 0.00 rather than failing the
/// whole report. Deliberate tradeoff: the report is always produced, but may
/// be understated; every defaulted field is recorded as an anomaly.
pub fn classify(order: &Order) -> ChargeBreakdown {
    let mut anomalies = Vec::new();

    let total = parse_amount(&order.total, "total", &mut anomalies);
    let tax = parse_amount(&order.total_tax, "total_tax", &mut anomalies);
    let discount = parse_amount(&order.discount_total, "discount_total", &mut anomalies);

    let tip_source = resolve_tip(order);
    let tip = tip_source.amount();

    let processing_fee = order
        .meta(PROCESSING_FEE_ATTRIBUTE_KEY)
        .and_then(|m| m.as_amount())
        .unwrap_or(0.0);

    let exempt_flag = order
        .meta(TAX_EXEMPT_ATTRIBUTE_KEY)
        .and_then(|m| m.as_str())
        .map(|v| v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false);

    // Fixed subtraction order; negative results propagate un-clamped and are
    // flagged instead of corrected.
    let subtotal = total - tax - tip;
    if subtotal < 0.0 {
        anomalies.push(ChargeAnomaly::NegativeSubtotal);
    }

    ChargeBreakdown {
        order_id: order.id,
        subtotal,
        discount,
        tax,
        tip,
        tip_source,
        processing_fee,
        exempt_flag,
        zero_tax: tax == 0.0,
        anomalies,
    }
}

fn parse_amount(raw: &str, field: &'static str, anomalies: &mut Vec<ChargeAnomaly>) -> f64 {
    match parse_money(raw) {
        Some(v) => v,
        None => {
            if !raw.trim().is_empty() {
                anomalies.push(ChargeAnomaly::UnparseableAmount(field));
            }
            0.0
        }
    }
}

fn resolve_tip(order: &Order) -> TipSource {
    // 1. Fee line named like a tip. "stripe" is excluded so processor-labeled
    //    surcharges ("Stripe gratuity processing") don't count as tips.
    for line in &order.fee_lines {
        let name = line.name.to_lowercase();
        if name.contains("tip") && !name.contains("stripe") {
            return TipSource::FeeLine(parse_money(&line.total).unwrap_or(0.0));
        }
    }

    // 2. Tagged attribute under either accepted key spelling.
    for key in TIP_ATTRIBUTE_KEYS {
        if let Some(amount) = order.meta(key).and_then(|m| m.as_amount()) {
            return TipSource::Attribute(amount);
        }
    }

    TipSource::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Billing, FeeLine, MetaDatum, OrderStatus};
    use chrono::NaiveDate;

    fn order(total: &str, tax: &str) -> Order {
        Order {
            id: 1,
            date_created: NaiveDate::from_ymd_opt(2023, 6, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            status: OrderStatus::Completed,
            total: total.to_string(),
            total_tax: tax.to_string(),
            discount_total: "0.00".to_string(),
            fee_lines: vec![],
            meta_data: vec![],
            billing: Billing::default(),
        }
    }

    fn meta(key: &str, value: serde_json::Value) -> MetaDatum {
        MetaDatum {
            key: key.to_string(),
            value,
        }
    }

    #[test]
    fn test_tip_from_fee_line() {
        let mut o = order("100.00", "8.00");
        o.fee_lines.push(FeeLine {
            name: "Tip".to_string(),
            total: "10.00".to_string(),
        });

        let b = classify(&o);
        assert_eq!(b.tip, 10.0);
        assert_eq!(b.tip_source, TipSource::FeeLine(10.0));
        assert_eq!(b.subtotal, 82.0);
        assert!(b.anomalies.is_empty());
    }

    #[test]
    fn test_stripe_fee_line_is_not_a_tip() {
        let mut o = order("100.00", "0.00");
        o.fee_lines.push(FeeLine {
            name: "Stripe tip surcharge".to_string(),
            total: "3.00".to_string(),
        });

        let b = classify(&o);
        assert_eq!(b.tip, 0.0);
        assert_eq!(b.tip_source, TipSource::None);
    }

    #[test]
    fn test_fee_line_wins_over_attribute() {
        let mut o = order("100.00", "0.00");
        o.fee_lines.push(FeeLine {
            name: "Driver tip".to_string(),
            total: "5.00".to_string(),
        });
        o.meta_data.push(meta("_tip_amount", serde_json::json!("7.00")));

        let b = classify(&o);
        assert_eq!(b.tip_source, TipSource::FeeLine(5.0));
    }

    #[test]
    fn test_tip_from_either_attribute_spelling() {
        for key in ["_tip_amount", "tip_amount"] {
            let mut o = order("50.00", "0.00");
            o.meta_data.push(meta(key, serde_json::json!("4.00")));
            let b = classify(&o);
            assert_eq!(b.tip_source, TipSource::Attribute(4.0), "key {}", key);
        }
    }

    #[test]
    fn test_processing_fee_and_exemption_flag() {
        let mut o = order("50.00", "0.00");
        o.meta_data.push(meta("_processing_fee", serde_json::json!("1.50")));
        o.meta_data.push(meta("_tax_exempt", serde_json::json!("yes")));

        let b = classify(&o);
        assert_eq!(b.processing_fee, 1.5);
        assert!(b.exempt_flag);
        assert!(b.zero_tax);
        assert!(b.is_exempt(ExemptionPolicy::ExplicitFlagOnly));
    }

    #[test]
    fn test_zero_tax_without_flag_depends_on_policy() {
        let o = order("50.00", "0.00");
        let b = classify(&o);
        assert!(!b.exempt_flag);
        assert!(b.zero_tax);
        assert!(b.is_exempt(ExemptionPolicy::FlagOrZeroTax));
        assert!(!b.is_exempt(ExemptionPolicy::ExplicitFlagOnly));
    }

    #[test]
    fn test_negative_subtotal_is_flagged_not_clamped() {
        let mut o = order("5.00", "1.00");
        o.fee_lines.push(FeeLine {
            name: "tip".to_string(),
            total: "10.00".to_string(),
        });

        let b = classify(&o);
        assert_eq!(b.subtotal, -6.0);
        assert!(b.anomalies.contains(&ChargeAnomaly::NegativeSubtotal));
    }

    #[test]
    fn test_unparseable_total_defaults_to_zero_with_anomaly() {
        let o = order("not-a-number", "0.00");
        let b = classify(&o);
        assert_eq!(b.subtotal, 0.0);
        assert!(b
            .anomalies
            .contains(&ChargeAnomaly::UnparseableAmount("total")));
    }

    #[test]
    fn test_empty_discount_is_plain_zero() {
        let mut o = order("10.00", "0.00");
        o.discount_total = String::new();
        let b = classify(&o);
        assert_eq!(b.discount, 0.0);
        assert!(b.anomalies.is_empty());
    }
}
