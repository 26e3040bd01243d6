use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------     Charge request    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Midtrans payment type, e.g. `gopay` or `qris`
    pub payment_type: String,
    pub transaction_details: TransactionDetails,
    pub item_details: Vec<ItemDetails>,
    pub customer_details: CustomerDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDetails {
    pub id: String,
    pub price: i64,
    pub quantity: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub email: String,
}

//--------------------------------------    Charge response    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeResponse {
    pub status_code: String,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub payment_type: String,
    #[serde(default)]
    pub transaction_status: String,
    #[serde(default)]
    pub actions: Vec<PaymentAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAction {
    pub name: String,
    #[serde(default)]
    pub method: String,
    pub url: String,
}

//--------------------------------------  Transaction status   ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    pub status_code: String,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub payment_type: String,
    #[serde(default)]
    pub transaction_status: String,
    pub fraud_status: Option<String>,
}

/// Returns true if a Midtrans body-level `status_code` denotes success.
pub fn is_success_code(status_code: &str) -> bool {
    status_code.starts_with('2')
}

//--------------------------------------  Notification fields  ---------------------------------------------------------
/// The subset of an HTTP notification that Midtrans covers with its `signature_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSignatureFields {
    pub order_id: String,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
}

impl NotificationSignatureFields {
    /// Pulls the signed fields out of a raw notification body. Returns `None` if any of them are missing.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let field = |name: &str| payload.get(name).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            order_id: field("order_id")?,
            status_code: field("status_code")?,
            gross_amount: field("gross_amount")?,
            signature_key: field("signature_key")?,
        })
    }
}
