use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use kantin_common::Rupiah;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------        GuestId        ---------------------------------------------------------
/// An opaque, stable identifier for a diner. Identity resolution happens outside the engine; all that is required is
/// that the id is not blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct GuestId(String);

impl GuestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl FromStr for GuestId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("Guest id cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl Display for GuestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------     Integer ids       ---------------------------------------------------------
macro_rules! integer_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

integer_id!(OrderId, "#");
integer_id!(VendorId, "vendor-");
integer_id!(MenuItemId, "item-");

//--------------------------------------    CartLineStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CartLineStatus {
    /// The item is in the guest's active cart.
    InCart,
    /// The item has been checked out and is awaiting payment.
    Unpaid,
    /// Payment for the order has succeeded.
    Paid,
    /// The vendor has handed the item over.
    Done,
    /// The vendor cancelled the item, or the payment failed.
    Cancelled,
}

impl CartLineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InCart => "in_cart",
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for CartLineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartLineStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_cart" => Ok(Self::InCart),
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid cart line status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    /// The provider flagged the payment for fraud review.
    Challenge,
    Success,
    Deny,
    Failure,
    Cancelled,
}

impl PaymentStatus {
    /// Terminal statuses never move back to `pending` or `challenge`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Deny | Self::Failure | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Challenge => "challenge",
            Self::Success => "success",
            Self::Deny => "deny",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
        }
    }

    /// The status that unpaid cart lines take on when a payment reaches this status, if any.
    pub fn line_status(&self) -> Option<CartLineStatus> {
        match self {
            Self::Success => Some(CartLineStatus::Paid),
            Self::Deny | Self::Failure | Self::Cancelled => Some(CartLineStatus::Cancelled),
            Self::Pending | Self::Challenge => None,
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "challenge" => Ok(Self::Challenge),
            "success" => Ok(Self::Success),
            "deny" => Ok(Self::Deny),
            "failure" => Ok(Self::Failure),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid at the counter. No provider is involved.
    Cash = 1,
    Gopay = 2,
    Qris = 3,
}

impl PaymentMethod {
    pub fn id(&self) -> i32 {
        *self as i32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Gopay => "gopay",
            Self::Qris => "qris",
        }
    }

    pub fn is_gateway(&self) -> bool {
        !matches!(self, Self::Cash)
    }
}

impl TryFrom<i32> for PaymentMethod {
    type Error = ConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Cash),
            2 => Ok(Self::Gopay),
            3 => Ok(Self::Qris),
            v => Err(ConversionError(format!("Unknown payment method id: {v}"))),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "gopay" => Ok(Self::Gopay),
            "qris" => Ok(Self::Qris),
            s => Err(ConversionError(format!("Unknown payment method: {s}"))),
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//--------------------------------------        Catalog        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub vendor_id: VendorId,
    pub name: String,
    pub price: Rupiah,
}

//--------------------------------------       CartLine        ---------------------------------------------------------
/// The most units of one menu item a single cart line may hold.
pub const MAX_LINE_QUANTITY: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub guest_id: GuestId,
    pub vendor_id: VendorId,
    pub menu_item_id: MenuItemId,
    pub quantity: i64,
    /// The menu price at the time the item was first added. It never changes afterwards.
    pub unit_price: Rupiah,
    pub total_price: Rupiah,
    pub status: CartLineStatus,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with the display names of its vendor and menu item.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartLineDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub line: CartLine,
    pub vendor_name: String,
    pub menu_item_name: String,
}

//--------------------------------------         Order         ---------------------------------------------------------
/// Buyer details supplied at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub buyer_name: String,
    pub seat: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub email: String,
}

impl BuyerInfo {
    pub fn new<S: Into<String>>(buyer_name: S, seat: S) -> Self {
        Self { buyer_name: buyer_name.into(), seat: seat.into(), ..Default::default() }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = email.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub guest_id: GuestId,
    pub buyer_name: String,
    pub seat: String,
    pub notes: String,
    pub email: String,
    pub total_price: Rupiah,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     PaymentAction     ---------------------------------------------------------
/// What the diner needs to complete a payment: a deep link (`key`) and a QR code url (`qr`). Cash payments have
/// neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAction {
    pub key: String,
    pub qr: String,
}

impl PaymentAction {
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.qr.is_empty()
    }
}

//--------------------------------------     PaymentRecord     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentRecord {
    pub order_id: OrderId,
    pub provider_transaction_id: String,
    pub provider_order_id: String,
    pub payment_method: PaymentMethod,
    pub gross_amount: Rupiah,
    /// The serialized [`PaymentAction`]
    pub payment_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub order_id: OrderId,
    pub provider_transaction_id: String,
    pub provider_order_id: String,
    pub payment_method: PaymentMethod,
    pub gross_amount: Rupiah,
    pub status: PaymentStatus,
    pub payment_data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
