//! Order-status page query string.
//!
//! The confirmation page gets everything it shows from the URL, including
//! one `items[i][name|price|quantity]` triple per line, and recomputes
//! subtotal and total from those rather than trusting a single total field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::checkout::PaymentMethod;
use crate::ids::{BusinessOrderId, OrderId, TransactionId};
use crate::CommerceError;

/// Outcome flag carried by the status URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Success,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Success => "success",
            OrderStatus::Failed => "failed",
        }
    }

    /// Gateways are not consistent about the word they send back.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" | "successful" | "completed" | "paid" => Some(OrderStatus::Success),
            "failed" | "failure" | "cancelled" | "canceled" | "error" => Some(OrderStatus::Failed),
            _ => None,
        }
    }
}

/// One line on the confirmation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusItem {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

/// Everything the order-status page is told.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusParams {
    pub status: OrderStatus,
    pub order_id: Option<OrderId>,
    pub business_order_id: Option<BusinessOrderId>,
    pub transaction_id: Option<TransactionId>,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_charge: f64,
    pub discount: f64,
    pub total: f64,
    pub message: Option<String>,
    pub items: Vec<StatusItem>,
}

/// Amounts recomputed from the encoded items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSummary {
    pub subtotal: f64,
    pub delivery_charge: f64,
    pub discount: f64,
    pub total: f64,
}

impl OrderStatusParams {
    /// A failure page carrying only the server's message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: OrderStatus::Failed,
            order_id: None,
            business_order_id: None,
            transaction_id: None,
            name: String::new(),
            phone: String::new(),
            address: String::new(),
            payment_method: None,
            delivery_charge: 0.0,
            discount: 0.0,
            total: 0.0,
            message: Some(message.into()),
            items: Vec::new(),
        }
    }

    /// Encode as a query string, without the leading `?`.
    pub fn encode(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("status", self.status.as_str());
        if let Some(id) = &self.order_id {
            query.append_pair("orderId", id.as_str());
        }
        if let Some(id) = &self.business_order_id {
            query.append_pair("businessOrderId", id.as_str());
        }
        if let Some(id) = &self.transaction_id {
            query.append_pair("transactionId", id.as_str());
        }
        query.append_pair("name", &self.name);
        query.append_pair("phone", &self.phone);
        query.append_pair("address", &self.address);
        if let Some(method) = self.payment_method {
            query.append_pair("paymentMethod", method.as_str());
        }
        query.append_pair("deliveryCharge", &format_amount(self.delivery_charge));
        query.append_pair("discount", &format_amount(self.discount));
        query.append_pair("total", &format_amount(self.total));
        if let Some(message) = &self.message {
            query.append_pair("message", message);
        }
        for (i, item) in self.items.iter().enumerate() {
            query.append_pair(&format!("items[{i}][name]"), &item.name);
            query.append_pair(&format!("items[{i}][price]"), &format_amount(item.price));
            query.append_pair(&format!("items[{i}][quantity]"), &item.quantity.to_string());
        }
        query.finish()
    }

    /// `path?query`.
    pub fn to_url(&self, path: &str) -> String {
        format!("{}?{}", path, self.encode())
    }

    /// Decode a query string, with or without the leading `?`.
    pub fn decode(query: &str) -> Result<Self, CommerceError> {
        decode_query(query).map(|decoded| decoded.params)
    }

    /// Sum of `price * quantity` over the encoded items.
    pub fn subtotal(&self) -> f64 {
        self.items
            .iter()
            .map(|i| i.price * f64::from(i.quantity))
            .sum()
    }

    /// Recompute the totals the page displays.
    pub fn summary(&self) -> StatusSummary {
        let subtotal = self.subtotal();
        StatusSummary {
            subtotal,
            delivery_charge: self.delivery_charge,
            discount: self.discount,
            total: (subtotal + self.delivery_charge - self.discount).max(0.0),
        }
    }
}

/// Decoded params plus the raw top-level fields, so callers can tell an
/// absent amount from a zero one.
pub(crate) struct DecodedQuery {
    pub params: OrderStatusParams,
    fields: BTreeMap<String, String>,
}

impl DecodedQuery {
    /// A top-level amount, `None` when the URL leaves it out.
    pub fn amount(&self, key: &str) -> Result<Option<f64>, CommerceError> {
        match self.fields.get(key).filter(|v| !v.trim().is_empty()) {
            None => Ok(None),
            some => parse_amount(some, key).map(Some),
        }
    }
}

pub(crate) fn decode_query(query: &str) -> Result<DecodedQuery, CommerceError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    let mut items: BTreeMap<usize, PartialItem> = BTreeMap::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match parse_item_key(&key) {
            Some((index, field)) => items.entry(index).or_default().set(field, &value)?,
            None => {
                fields.insert(key.into_owned(), value.into_owned());
            }
        }
    }

    let status_raw = fields
        .get("status")
        .ok_or_else(|| invalid("missing status"))?;
    let status = OrderStatus::parse(status_raw)
        .ok_or_else(|| invalid(format!("unknown status {status_raw}")))?;

    let text = |key: &str| fields.get(key).cloned().unwrap_or_default();
    let present = |key: &str| fields.get(key).filter(|v| !v.is_empty()).cloned();

    let payment_method = present("paymentMethod")
        .map(|m| m.parse::<PaymentMethod>())
        .transpose()
        .map_err(|e| invalid(e.to_string()))?;

    let items = items
        .into_iter()
        .map(|(index, partial)| partial.finish(index))
        .collect::<Result<Vec<_>, _>>()?;

    let params = OrderStatusParams {
        status,
        order_id: present("orderId").map(OrderId::new),
        business_order_id: present("businessOrderId").map(BusinessOrderId::new),
        transaction_id: present("transactionId").map(TransactionId::new),
        name: text("name"),
        phone: text("phone"),
        address: text("address"),
        payment_method,
        delivery_charge: parse_amount(fields.get("deliveryCharge"), "deliveryCharge")?,
        discount: parse_amount(fields.get("discount"), "discount")?,
        total: parse_amount(fields.get("total"), "total")?,
        message: present("message"),
        items,
    };
    Ok(DecodedQuery { params, fields })
}

#[derive(Default)]
struct PartialItem {
    name: Option<String>,
    price: Option<f64>,
    quantity: Option<u32>,
}

impl PartialItem {
    fn set(&mut self, field: &str, value: &str) -> Result<(), CommerceError> {
        match field {
            "name" => self.name = Some(value.to_string()),
            "price" => {
                self.price = Some(
                    value
                        .parse()
                        .map_err(|_| invalid(format!("bad item price {value}")))?,
                )
            }
            "quantity" => {
                self.quantity = Some(
                    value
                        .parse()
                        .map_err(|_| invalid(format!("bad item quantity {value}")))?,
                )
            }
            other => tracing::debug!(field = other, "ignoring unknown item field"),
        }
        Ok(())
    }

    fn finish(self, index: usize) -> Result<StatusItem, CommerceError> {
        match (self.name, self.price, self.quantity) {
            (Some(name), Some(price), Some(quantity)) => Ok(StatusItem {
                name,
                price,
                quantity,
            }),
            _ => Err(invalid(format!("item {index} is incomplete"))),
        }
    }
}

/// `items[3][price]` -> `(3, "price")`.
fn parse_item_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("items[")?;
    let (index, rest) = rest.split_once("][")?;
    let field = rest.strip_suffix(']')?;
    Some((index.parse().ok()?, field))
}

fn parse_amount(value: Option<&String>, key: &str) -> Result<f64, CommerceError> {
    match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(0.0),
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| invalid(format!("bad {key} {v}"))),
    }
}

/// Whole amounts print without a fractional part.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

fn invalid(reason: impl Into<String>) -> CommerceError {
    CommerceError::InvalidStatusQuery(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> OrderStatusParams {
        OrderStatusParams {
            status: OrderStatus::Success,
            order_id: Some(OrderId::new("o-1")),
            business_order_id: Some(BusinessOrderId::new("SF-1001")),
            transaction_id: None,
            name: "Rahim Uddin".into(),
            phone: "01712345678".into(),
            address: "House 12 & Road 5".into(),
            payment_method: Some(PaymentMethod::CashOnDelivery),
            delivery_charge: 80.0,
            discount: 0.0,
            total: 1080.0,
            message: None,
            items: vec![StatusItem {
                name: "Cotton Tee (L)".into(),
                price: 500.0,
                quantity: 2,
            }],
        }
    }

    #[test]
    fn test_encode_shape() {
        let query = params().encode();
        assert!(query.starts_with("status=success&orderId=o-1&businessOrderId=SF-1001"));
        assert!(query.contains("address=House+12+%26+Road+5"));
        assert!(query.contains("items%5B0%5D%5Bname%5D=Cotton+Tee+%28L%29"));
        assert!(query.contains("deliveryCharge=80&discount=0&total=1080"));
    }

    #[test]
    fn test_decode_recomputes_totals() {
        let decoded = OrderStatusParams::decode(&params().encode()).unwrap();
        assert_eq!(decoded, params());

        let summary = decoded.summary();
        assert_eq!(summary.subtotal, 1000.0);
        assert_eq!(summary.total, 1080.0);
    }

    #[test]
    fn test_decode_accepts_leading_question_mark_and_raw_brackets() {
        let decoded = OrderStatusParams::decode(
            "?status=failed&message=Stock+out&items[0][name]=Tee&items[0][price]=250.5&items[0][quantity]=2",
        )
        .unwrap();
        assert_eq!(decoded.status, OrderStatus::Failed);
        assert_eq!(decoded.message.as_deref(), Some("Stock out"));
        assert_eq!(decoded.subtotal(), 501.0);
    }

    #[test]
    fn test_decode_rejects_incomplete_item() {
        let err = OrderStatusParams::decode("status=success&items[0][name]=Tee").unwrap_err();
        assert!(matches!(err, CommerceError::InvalidStatusQuery(_)));
        assert!(OrderStatusParams::decode("orderId=1").is_err());
    }

    #[test]
    fn test_decode_ignores_unknown_item_fields() {
        let decoded = OrderStatusParams::decode(
            "status=success&items[0][name]=Tee&items[0][sku]=TEE-L&items[0][price]=500&items[0][quantity]=2",
        )
        .unwrap();
        assert_eq!(
            decoded.items,
            vec![StatusItem {
                name: "Tee".into(),
                price: 500.0,
                quantity: 2,
            }]
        );
    }

    #[test]
    fn test_decoded_query_tells_absent_from_zero() {
        let decoded = decode_query("status=success&discount=0&amount=900").unwrap();
        assert_eq!(decoded.amount("discount").unwrap(), Some(0.0));
        assert_eq!(decoded.amount("amount").unwrap(), Some(900.0));
        assert_eq!(decoded.amount("deliveryCharge").unwrap(), None);
        assert!(decode_query("status=success&amount=lots").unwrap().amount("amount").is_err());
    }

    #[test]
    fn test_failure_page() {
        let url = OrderStatusParams::failure("স্টক শেষ").to_url("/order-status");
        assert!(url.starts_with("/order-status?status=failed"));
        let decoded = OrderStatusParams::decode(url.split_once('?').unwrap().1).unwrap();
        assert_eq!(decoded.message.as_deref(), Some("স্টক শেষ"));
    }

    proptest! {
        #[test]
        fn prop_subtotal_survives_round_trip(
            lines in proptest::collection::vec((1u32..100_000, 1u32..20), 0..8)
        ) {
            let mut original = params();
            original.items = lines
                .iter()
                .enumerate()
                .map(|(i, (cents, qty))| StatusItem {
                    name: format!("item {i}"),
                    price: f64::from(*cents) / 100.0,
                    quantity: *qty,
                })
                .collect();

            let decoded = OrderStatusParams::decode(&original.encode()).unwrap();
            prop_assert!((decoded.subtotal() - original.subtotal()).abs() < 1e-6);
        }
    }
}
