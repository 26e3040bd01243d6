use kantin_common::Rupiah;
use serde::{Deserialize, Serialize};

use crate::db_types::{CartLine, PaymentMethod, PaymentRecord};

#[derive(Debug, Clone)]
pub enum InsertPaymentResult {
    Inserted(PaymentRecord),
    /// A record for the order already exists. The existing record is returned untouched.
    AlreadyExists(PaymentRecord),
}

impl InsertPaymentResult {
    pub fn into_record(self) -> PaymentRecord {
        match self {
            Self::Inserted(r) | Self::AlreadyExists(r) => r,
        }
    }
}

/// The outcome of taking one unit off a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRemoval {
    Decremented(CartLine),
    /// The last unit was removed, so the line itself was deleted.
    Deleted(i64),
    /// The line is no longer in the cart (e.g. it was checked out concurrently). Nothing was changed.
    NotInCart,
}

//--------------------------------------   Provider messages   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeItem {
    pub id: String,
    pub price: Rupiah,
    pub quantity: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderChargeRequest {
    pub payment_method: PaymentMethod,
    /// Our reference for the charge. The provider echoes it back in notifications.
    pub provider_order_id: String,
    pub gross_amount: Rupiah,
    pub items: Vec<ChargeItem>,
    pub customer: CustomerContact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAction {
    pub name: String,
    pub url: String,
}

impl ProviderAction {
    pub fn new<S: Into<String>>(name: S, url: S) -> Self {
        Self { name: name.into(), url: url.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderChargeResponse {
    pub transaction_id: String,
    pub order_id: String,
    pub actions: Vec<ProviderAction>,
}

impl ProviderChargeResponse {
    pub fn action_url(&self, name: &str) -> Option<&str> {
        self.actions.iter().find(|a| a.name == name).map(|a| a.url.as_str())
    }
}

/// The provider's view of a transaction, as returned by a status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub order_id: String,
    pub transaction_status: String,
    pub fraud_status: Option<String>,
}

impl ProviderStatus {
    pub fn new<S: Into<String>>(order_id: S, transaction_status: S) -> Self {
        Self { order_id: order_id.into(), transaction_status: transaction_status.into(), fraud_status: None }
    }

    pub fn with_fraud_status<S: Into<String>>(mut self, fraud_status: S) -> Self {
        self.fraud_status = Some(fraud_status.into());
        self
    }
}
