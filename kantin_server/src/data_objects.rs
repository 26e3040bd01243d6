use std::str::FromStr;

use kantin_engine::db_types::{
    BuyerInfo,
    CartLine,
    CartLineStatus,
    ConversionError,
    MenuItemId,
    OrderId,
    PaymentStatus,
    VendorId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub vendor_id: VendorId,
    pub menu_item_id: MenuItemId,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

/// The result of `DELETE /api/cart/{line_id}`. `line` is absent when the last unit was removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalResponse {
    pub line_id: i64,
    pub deleted: bool,
    pub line: Option<CartLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub buyer: BuyerInfo,
    /// 1 = cash, 2 = gopay, 3 = qris
    pub payment_method: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRequest {
    pub payment_method: i32,
}

/// Query string for `GET /api/vendors/{vendor_id}/orders`, e.g. `?status=paid,done`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorOrdersQuery {
    pub status: Option<String>,
}

impl VendorOrdersQuery {
    pub fn statuses(&self) -> Result<Vec<CartLineStatus>, ConversionError> {
        self.status
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(CartLineStatus::from_str)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentResponse {
    pub order_id: OrderId,
    pub vendor_id: VendorId,
    pub lines_updated: u64,
}

/// The acknowledgement sent back to Midtrans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAck {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
}
