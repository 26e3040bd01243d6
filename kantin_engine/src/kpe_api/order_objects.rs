use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{
    CartLineDetail,
    CartLineStatus,
    GuestId,
    Order,
    OrderId,
    PaymentAction,
    PaymentMethod,
    PaymentStatus,
    VendorId,
};

/// Selects cart lines. Every field that is `None` is not filtered on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartLineQueryFilter {
    pub guest_id: Option<GuestId>,
    pub order_id: Option<OrderId>,
    pub vendor_id: Option<VendorId>,
    pub status: Option<Vec<CartLineStatus>>,
}

impl CartLineQueryFilter {
    pub fn with_guest_id(mut self, guest_id: GuestId) -> Self {
        self.guest_id = Some(guest_id);
        self
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_vendor_id(mut self, vendor_id: VendorId) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    pub fn with_status(mut self, status: CartLineStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_statuses(self, statuses: &[CartLineStatus]) -> Self {
        statuses.iter().fold(self, |filter, s| filter.with_status(*s))
    }

    pub fn is_empty(&self) -> bool {
        self.guest_id.is_none() && self.order_id.is_none() && self.vendor_id.is_none() && self.status.is_none()
    }
}

impl Display for CartLineQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(guest_id) = &self.guest_id {
            write!(f, "guest_id: {guest_id}. ")?;
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(vendor_id) = &self.vendor_id {
            write!(f, "vendor_id: {vendor_id}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

/// The payment side of an order, as shown to the diner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub provider_order_id: String,
    /// Only present while the payment is still pending.
    pub action: Option<PaymentAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub payment: Option<PaymentSummary>,
    pub lines: Vec<CartLineDetail>,
}
