use std::{collections::BTreeMap, fmt::Debug};

use log::*;

use crate::{
    db_types::{CartLineDetail, CartLineStatus, GuestId, Order, OrderId, PaymentStatus, VendorId},
    kpe_api::{
        cart_api::ensure_guest,
        errors::OrderFlowError,
        order_objects::{CartLineQueryFilter, OrderDetail, PaymentSummary},
        payment_objects::decode_payment_action,
    },
    traits::{CartManagement, CatalogManagement, OrderManagement, PaymentRecordManagement},
};

/// How many orders [`OrderQueryApi::orders_for_guest`] returns.
pub const RECENT_ORDER_LIMIT: u32 = 10;

/// The line statuses that make an order show up in a guest's order history.
pub const HISTORY_LINE_STATUSES: [CartLineStatus; 3] =
    [CartLineStatus::Unpaid, CartLineStatus::Paid, CartLineStatus::Done];

/// What a vendor is shown when they do not ask for particular line statuses: paid lines waiting to be handed over.
pub const VENDOR_QUEUE_STATUSES: [CartLineStatus; 1] = [CartLineStatus::Paid];

/// Read-only views over orders, their lines and their payments.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi")
    }
}

impl<B> OrderQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement + CartManagement + PaymentRecordManagement
{
    /// The order with all its lines and its payment, if one has been started.
    pub async fn order_detail(&self, order_id: OrderId) -> Result<OrderDetail, OrderFlowError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await
            .map_err(|e| OrderFlowError::storage("Order lookup", order_id, e))?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Order {order_id}")))?;
        self.detail_for(order, &[]).await
    }

    /// The guest's most recent orders that still have unpaid, paid or done lines, newest first. Only those lines are
    /// included. The payment links are included while the payment is pending.
    pub async fn orders_for_guest(&self, guest: &GuestId) -> Result<Vec<OrderDetail>, OrderFlowError> {
        ensure_guest(guest)?;
        let orders = self
            .db
            .fetch_recent_orders_for_guest(guest, &HISTORY_LINE_STATUSES, RECENT_ORDER_LIMIT)
            .await
            .map_err(|e| OrderFlowError::storage("Order history", guest, e))?;
        trace!("📦️ {guest} has {} recent orders", orders.len());
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            result.push(self.detail_for(order, &HISTORY_LINE_STATUSES).await?);
        }
        Ok(result)
    }

    async fn detail_for(&self, order: Order, statuses: &[CartLineStatus]) -> Result<OrderDetail, OrderFlowError> {
        let order_id = order.id;
        let filter = CartLineQueryFilter::default().with_order_id(order_id).with_statuses(statuses);
        let lines = self
            .db
            .fetch_cart_line_details(filter)
            .await
            .map_err(|e| OrderFlowError::storage("Order lines", order_id, e))?;
        let payment = self.payment_summary(order_id).await?;
        Ok(OrderDetail { order, payment, lines })
    }

    async fn payment_summary(&self, order_id: OrderId) -> Result<Option<PaymentSummary>, OrderFlowError> {
        let record = self
            .db
            .fetch_payment_record_for_order(order_id)
            .await
            .map_err(|e| OrderFlowError::storage("Payment record lookup", order_id, e))?;
        let Some(r) = record else {
            return Ok(None);
        };
        let action = match r.status {
            PaymentStatus::Pending => Some(decode_payment_action(&r)?),
            _ => None,
        };
        Ok(Some(PaymentSummary {
            method: r.payment_method,
            status: r.status,
            provider_order_id: r.provider_order_id,
            action,
        }))
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement + CartManagement + PaymentRecordManagement + CatalogManagement
{
    /// The orders with lines from `vendor_id` in one of `statuses`, newest first. Each order carries only that vendor's
    /// lines. An empty `statuses` means [`VENDOR_QUEUE_STATUSES`].
    ///
    /// Orders without a payment record are left out.
    ///
    /// ## Failure modes
    /// * `NotFound` if the vendor does not exist.
    pub async fn orders_for_vendor(
        &self,
        vendor_id: VendorId,
        statuses: &[CartLineStatus],
    ) -> Result<Vec<OrderDetail>, OrderFlowError> {
        self.db
            .fetch_vendor(vendor_id)
            .await
            .map_err(|e| OrderFlowError::storage("Vendor lookup", vendor_id, e))?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Vendor {vendor_id}")))?;
        let statuses = if statuses.is_empty() { &VENDOR_QUEUE_STATUSES[..] } else { statuses };
        let filter = CartLineQueryFilter::default().with_vendor_id(vendor_id).with_statuses(statuses);
        let lines = self
            .db
            .fetch_cart_line_details(filter)
            .await
            .map_err(|e| OrderFlowError::storage("Vendor order lines", vendor_id, e))?;
        let mut lines_by_order: BTreeMap<OrderId, Vec<CartLineDetail>> = BTreeMap::new();
        for line in lines {
            // Lines still in a cart have no order
            if let Some(order_id) = line.line.order_id {
                lines_by_order.entry(order_id).or_default().push(line);
            }
        }
        let mut result = Vec::with_capacity(lines_by_order.len());
        for (order_id, lines) in lines_by_order.into_iter().rev() {
            let order =
                self.db.fetch_order(order_id).await.map_err(|e| OrderFlowError::storage("Order lookup", order_id, e))?;
            let Some(order) = order else {
                warn!("📦️ {vendor_id} has lines for order {order_id}, but the order does not exist");
                continue;
            };
            let Some(payment) = self.payment_summary(order_id).await? else {
                trace!("📦️ Order {order_id} has no payment yet. Not showing it to {vendor_id}");
                continue;
            };
            result.push(OrderDetail { order, payment: Some(payment), lines });
        }
        debug!("📦️ {vendor_id} has {} orders with lines in [{}]", result.len(), join_statuses(statuses));
        Ok(result)
    }
}

fn join_statuses(statuses: &[CartLineStatus]) -> String {
    statuses.iter().map(CartLineStatus::as_str).collect::<Vec<_>>().join(",")
}
