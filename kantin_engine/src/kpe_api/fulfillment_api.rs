use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartLineStatus, OrderId, VendorId},
    kpe_api::errors::OrderFlowError,
    traits::{CartManagement, OrderManagement},
};

/// `FulfillmentApi` lets a vendor hand over or cancel their part of an order. A vendor's actions never touch the
/// lines of other vendors in the same order.
pub struct FulfillmentApi<B> {
    db: B,
}

impl<B> Debug for FulfillmentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfillmentApi")
    }
}

impl<B> FulfillmentApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> FulfillmentApi<B>
where B: OrderManagement + CartManagement
{
    /// Marks the vendor's `paid` lines in the order as `done`. Lines in any other status are left alone.
    ///
    /// Returns the number of lines changed.
    pub async fn complete(&self, order_id: OrderId, vendor_id: VendorId) -> Result<u64, OrderFlowError> {
        self.ensure_order_exists(order_id).await?;
        let n = self
            .db
            .update_vendor_line_statuses(order_id, vendor_id, &[CartLineStatus::Paid], CartLineStatus::Done)
            .await
            .map_err(|e| OrderFlowError::storage("Completing order", order_id, e))?;
        if n == 0 {
            debug!("🍽️ {vendor_id} has no paid lines in order {order_id}. Nothing to complete.");
        } else {
            info!("🍽️ {vendor_id} completed {n} lines of order {order_id}");
        }
        Ok(n)
    }

    /// Cancels all of the vendor's lines in the order, whatever their status.
    ///
    /// Returns the number of lines changed.
    pub async fn cancel(&self, order_id: OrderId, vendor_id: VendorId) -> Result<u64, OrderFlowError> {
        self.ensure_order_exists(order_id).await?;
        let n = self
            .db
            .update_vendor_line_statuses(order_id, vendor_id, &[], CartLineStatus::Cancelled)
            .await
            .map_err(|e| OrderFlowError::storage("Cancelling order", order_id, e))?;
        info!("🍽️ {vendor_id} cancelled {n} lines of order {order_id}");
        Ok(n)
    }

    async fn ensure_order_exists(&self, order_id: OrderId) -> Result<(), OrderFlowError> {
        match self.db.fetch_order(order_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(OrderFlowError::NotFound(format!("Order {order_id}"))),
            Err(e) => Err(OrderFlowError::storage("Order lookup", order_id, e)),
        }
    }
}
