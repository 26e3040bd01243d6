use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{BuyerInfo, CartLine, GuestId, Order},
    kpe_api::{cart_api::ensure_guest, errors::OrderFlowError},
    traits::OrderManagement,
};

/// `CheckoutApi` turns a guest's cart into an immutable, priced order.
pub struct CheckoutApi<B> {
    db: B,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CheckoutApi<B>
where B: OrderManagement
{
    /// Creates an order from everything in the guest's cart.
    ///
    /// The order, the move of its lines to `unpaid` and the order total are written in one storage transaction, so
    /// either all of it is visible or none of it is.
    ///
    /// ## Failure modes
    /// * `ValidationError` if the buyer name or seat is missing.
    /// * `EmptyCart` if there is nothing in the cart. No order is created.
    pub async fn checkout(&self, guest: &GuestId, buyer: &BuyerInfo) -> Result<(Order, Vec<CartLine>), OrderFlowError> {
        checkout_cart(&self.db, guest, buyer).await
    }
}

pub(crate) fn validate_buyer(buyer: &BuyerInfo) -> Result<(), OrderFlowError> {
    if buyer.buyer_name.trim().is_empty() {
        return Err(OrderFlowError::ValidationError("A buyer name is required".to_string()));
    }
    if buyer.seat.trim().is_empty() {
        return Err(OrderFlowError::ValidationError("A seat is required".to_string()));
    }
    Ok(())
}

pub(crate) async fn checkout_cart<B: OrderManagement>(
    db: &B,
    guest: &GuestId,
    buyer: &BuyerInfo,
) -> Result<(Order, Vec<CartLine>), OrderFlowError> {
    ensure_guest(guest)?;
    validate_buyer(buyer)?;
    let (order, lines) = db
        .checkout_cart(guest, buyer)
        .await
        .map_err(|e| OrderFlowError::storage("Checkout", guest, e))?
        .ok_or_else(|| OrderFlowError::EmptyCart(guest.clone()))?;
    info!(
        "📦️ Order {} placed by {guest} ({}, seat {}). {} lines, total {}",
        order.id,
        order.buyer_name,
        order.seat,
        lines.len(),
        order.total_price
    );
    Ok((order, lines))
}
