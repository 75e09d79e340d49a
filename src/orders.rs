//! Orders and their lifecycle, as seen from the client.

use crate::{
    id::{OrderId, UserId},
    products::Product,
    utils,
};
use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// The delivery pipeline, in order. Cancelled and returned orders sit
/// outside of it.
const PIPELINE: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::OutForDelivery,
    OrderStatus::Delivered,
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
    Unknown(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::OutForDelivery => "out for delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
            OrderStatus::Unknown(other) => other,
        }
    }

    /// Can the shopper still cancel an order in this state?
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Confirmed
                | OrderStatus::Processing
        )
    }

    /// How far through the delivery pipeline the order is, as a percentage.
    pub fn progress(&self) -> f64 {
        match PIPELINE.iter().position(|s| s == self) {
            Some(ix) => (ix + 1) as f64 / PIPELINE.len() as f64 * 100.0,
            None => 0.0,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> OrderStatus {
        match s.to_lowercase().as_str() {
            "pending" => OrderStatus::Pending,
            "confirmed" => OrderStatus::Confirmed,
            "processing" => OrderStatus::Processing,
            "shipped" => OrderStatus::Shipped,
            "out for delivery" => OrderStatus::OutForDelivery,
            "delivered" => OrderStatus::Delivered,
            "cancelled" => OrderStatus::Cancelled,
            "returned" => OrderStatus::Returned,
            _ => OrderStatus::Unknown(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> String { status.as_str().to_string() }
}

impl std::str::FromStr for OrderStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<OrderStatus, Self::Err> {
        Ok(OrderStatus::from(s.to_string()))
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Paid,
    Failed,
    Refunded,
    RefundPending,
    Unknown(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::RefundPending => "refund_pending",
            PaymentStatus::Unknown(other) => other,
        }
    }

    /// Has money actually changed hands?
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Paid)
    }
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> PaymentStatus {
        match s.to_lowercase().as_str() {
            "pending" => PaymentStatus::Pending,
            "completed" => PaymentStatus::Completed,
            "paid" => PaymentStatus::Paid,
            "failed" => PaymentStatus::Failed,
            "refunded" => PaymentStatus::Refunded,
            "refund_pending" => PaymentStatus::RefundPending,
            _ => PaymentStatus::Unknown(s),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> String { status.as_str().to_string() }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the shopper pays.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Online payment through the Razorpay gateway.
    Razorpay,
    /// Cash on delivery.
    Cod,
    #[serde(other)]
    Other,
}

impl Default for PaymentMethod {
    fn default() -> PaymentMethod { PaymentMethod::Razorpay }
}

/// Where an order gets delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

pub(crate) const COUNTRY: &str = "India";

fn default_country() -> String { COUNTRY.to_string() }

/// One line of an order. Unlike the cart, the product may have been deleted
/// since the order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(default, deserialize_with = "lenient_product")]
    pub product: Option<Product>,
    #[serde(default)]
    pub quantity: u32,
    /// The unit price at the time of ordering.
    #[serde(default)]
    pub price: f64,
}

impl OrderLine {
    pub fn subtotal(&self) -> f64 { self.price * f64::from(self.quantity) }
}

fn lenient_product<'de, D>(deserializer: D) -> Result<Option<Product>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    /// The payment gateway's order reference, if there is one.
    #[serde(default, deserialize_with = "utils::lenient_optional_string")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_user")]
    pub user: Option<UserId>,
    #[serde(default)]
    pub products: Vec<OrderLine>,
    #[serde(default)]
    pub total_amount: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "utils::lenient_optional_string")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default, deserialize_with = "utils::lenient_optional_string")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "utils::lenient_optional_string")]
    pub special_instructions: Option<String>,
    #[serde(default, deserialize_with = "utils::lenient_optional_string")]
    pub tracking_number: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "cancelledAt", default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "cancellationReason",
        default,
        deserialize_with = "utils::lenient_optional_string"
    )]
    pub cancellation_reason: Option<String>,
}

/// The backend sometimes populates the user and sometimes just sends their
/// ID.
fn lenient_user<'de, D>(deserializer: D) -> Result<Option<UserId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    use serde_json::Value;

    let id = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) => Some(id),
        Some(Value::Object(fields)) => match fields.get("_id") {
            Some(Value::String(id)) => Some(id.clone()),
            _ => None,
        },
        _ => None,
    };

    Ok(id.map(UserId::from))
}

impl Order {
    pub fn is_cancellable(&self) -> bool { self.status.is_cancellable() }

    /// Apply the change the backend makes when an order is cancelled, so the
    /// local copy doesn't need to be re-fetched.
    ///
    /// Orders that were already paid for online move to
    /// [`PaymentStatus::RefundPending`].
    pub fn mark_cancelled(&mut self, at: DateTime<Utc>) {
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(at);

        let paid_online = self.payment_method != Some(PaymentMethod::Cod)
            && self.payment_status == Some(PaymentStatus::Completed);
        if paid_online {
            self.payment_status = Some(PaymentStatus::RefundPending);
        }
    }
}
