use serde::{Deserialize, Serialize};

use crate::db_types::{Order, PaymentRecord, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payment: PaymentRecord,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payment: PaymentRecord) -> Self {
        Self { order, payment }
    }
}

/// Emitted when a payment is denied, fails or is cancelled. The order's lines have been cancelled by this point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub payment: PaymentRecord,
    pub status: PaymentStatus,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order, payment: PaymentRecord) -> Self {
        let status = payment.status;
        Self { order, payment, status }
    }
}
