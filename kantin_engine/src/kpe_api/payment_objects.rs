use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{CartLineDetail, Order, OrderId, PaymentAction, PaymentMethod, PaymentRecord, PaymentStatus},
    kpe_api::errors::OrderFlowError,
};

pub const DEFAULT_CASH_PREFIX: &str = "CL";
pub const DEFAULT_GATEWAY_PREFIX: &str = "KP";
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Provider action names that carry the payment links.
pub const QR_CODE_ACTION: &str = "generate-qr-code";
pub const DEEPLINK_ACTION: &str = "deeplink-redirect";

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Prefix of the pseudo transaction id given to cash payments.
    pub cash_prefix: String,
    /// Prefix of the order reference sent to the payment provider.
    pub gateway_prefix: String,
    /// Upper bound on any single call to the payment provider.
    pub provider_timeout: Duration,
    pub enabled_methods: Vec<PaymentMethod>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            cash_prefix: DEFAULT_CASH_PREFIX.to_string(),
            gateway_prefix: DEFAULT_GATEWAY_PREFIX.to_string(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            enabled_methods: vec![PaymentMethod::Cash, PaymentMethod::Gopay, PaymentMethod::Qris],
        }
    }
}

impl PaymentConfig {
    pub fn is_enabled(&self, method: PaymentMethod) -> bool {
        self.enabled_methods.contains(&method)
    }
}

/// The payment state of an order, with the stored payment action decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetail {
    pub order_id: OrderId,
    pub provider_order_id: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub action: PaymentAction,
}

impl TryFrom<&PaymentRecord> for PaymentDetail {
    type Error = OrderFlowError;

    fn try_from(record: &PaymentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: record.order_id,
            provider_order_id: record.provider_order_id.clone(),
            method: record.payment_method,
            status: record.status,
            action: decode_payment_action(record)?,
        })
    }
}

pub fn decode_payment_action(record: &PaymentRecord) -> Result<PaymentAction, OrderFlowError> {
    serde_json::from_str(&record.payment_data).map_err(|e| {
        OrderFlowError::PaymentDataError(format!("Payment data for {} is unreadable. {e}", record.provider_order_id))
    })
}

pub fn encode_payment_action(action: &PaymentAction) -> Result<String, OrderFlowError> {
    serde_json::to_string(action).map_err(|e| OrderFlowError::PaymentDataError(e.to_string()))
}

/// The result of a completed checkout: the new order, its lines and how to pay for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub lines: Vec<CartLineDetail>,
    pub payment: PaymentDetail,
}

/// What the reconciler did with a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The record moved from `previous` to the status in `record`.
    Updated { previous: PaymentStatus, record: PaymentRecord },
    /// The record already had the reported status.
    Unchanged(PaymentRecord),
    /// The report is older than what we already know (e.g. `pending` after `success`). It was ignored.
    Stale(PaymentRecord),
    /// The provider reported a status we do not map. It was logged and ignored.
    Unrecognised(PaymentRecord),
}

impl NotificationOutcome {
    pub fn record(&self) -> &PaymentRecord {
        match self {
            Self::Updated { record, .. } | Self::Unchanged(record) | Self::Stale(record) | Self::Unrecognised(record) => {
                record
            },
        }
    }
}

/// Maps a provider transaction status (and fraud status) onto our payment status.
///
/// | transaction status | fraud status | payment status |
/// |--------------------|--------------|----------------|
/// | capture            | challenge    | challenge      |
/// | capture            | accept       | success        |
/// | settlement         | (any)        | success        |
/// | deny               | (any)        | deny           |
/// | cancel, expire     | (any)        | failure        |
/// | pending            | (any)        | pending        |
///
/// Anything else returns `None`.
pub fn map_provider_status(transaction_status: &str, fraud_status: Option<&str>) -> Option<PaymentStatus> {
    match (transaction_status, fraud_status) {
        ("capture", Some("challenge")) => Some(PaymentStatus::Challenge),
        ("capture", Some("accept")) => Some(PaymentStatus::Success),
        ("capture", _) => None,
        ("settlement", _) => Some(PaymentStatus::Success),
        ("deny", _) => Some(PaymentStatus::Deny),
        ("cancel" | "expire", _) => Some(PaymentStatus::Failure),
        ("pending", _) => Some(PaymentStatus::Pending),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTransition {
    Unchanged,
    Apply,
    Stale,
    Conflict,
}

/// Decides what to do when a record in `current` status receives a report of `reported`.
///
/// | current \ reported | pending   | challenge | terminal (same) | terminal (other) |
/// |--------------------|-----------|-----------|-----------------|------------------|
/// | pending            | Unchanged | Apply     | Apply           | Apply            |
/// | challenge          | Stale     | Unchanged | Apply           | Apply            |
/// | terminal           | Stale     | Stale     | Unchanged       | Conflict         |
pub fn classify_transition(current: PaymentStatus, reported: PaymentStatus) -> PaymentTransition {
    use PaymentStatus::*;
    match (current, reported) {
        (c, r) if c == r => PaymentTransition::Unchanged,
        (Pending, _) => PaymentTransition::Apply,
        (Challenge, Pending) => PaymentTransition::Stale,
        (Challenge, _) => PaymentTransition::Apply,
        (_, Pending | Challenge) => PaymentTransition::Stale,
        (_, _) => PaymentTransition::Conflict,
    }
}
