use crate::error::{ReportError, Result};
use crate::utils::{day_end, day_start, parse_money};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Attribute key for a tip recorded at checkout. Legacy storefronts wrote the
/// same amount under either spelling, so both are accepted.
pub const TIP_ATTRIBUTE_KEYS: [&str; 2] = ["_tip_amount", "tip_amount"];

/// Attribute key for the payment-processor fee attached to an order.
pub const PROCESSING_FEE_ATTRIBUTE_KEY: &str = "_processing_fee";

/// Attribute key for the tax-exemption flag; the value is the literal "yes".
pub const TAX_EXEMPT_ATTRIBUTE_KEY: &str = "_tax_exempt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// Realized sales are the only orders counted toward sales totals.
    pub fn is_realized_sale(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Processing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeLine {
    pub name: String,
    pub total: String,
}

/// Free-form tagged attribute. Values arrive as arbitrary JSON (strings for
/// hand-entered data, numbers from newer integrations), so amounts are read
/// through [`MetaDatum::as_amount`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaDatum {
    pub key: String,
    pub value: serde_json::Value,
}

impl MetaDatum {
    pub fn as_amount(&self) -> Option<f64> {
        match &self.value {
            serde_json::Value::String(s) => parse_money(s),
            serde_json::Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Billing {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// One raw order as returned by the external order source. Monetary fields
/// are decimal strings on the wire; this engine never mutates an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub date_created: NaiveDateTime,
    pub status: OrderStatus,
    pub total: String,
    pub total_tax: String,
    #[serde(default)]
    pub discount_total: String,
    #[serde(default)]
    pub fee_lines: Vec<FeeLine>,
    #[serde(default)]
    pub meta_data: Vec<MetaDatum>,
    #[serde(default)]
    pub billing: Billing,
}

impl Order {
    pub fn customer_name(&self) -> String {
        let name = format!("{} {}", self.billing.first_name, self.billing.last_name);
        name.trim().to_string()
    }

    pub fn meta(&self, key: &str) -> Option<&MetaDatum> {
        self.meta_data.iter().find(|m| m.key == key)
    }
}

/// Inclusive date range for one report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ReportError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Exact inclusion test against the order's own timestamp. This is the
    /// authoritative filter; the server-side query is only a superset guard.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= day_start(self.start) && instant <= day_end(self.end)
    }
}
