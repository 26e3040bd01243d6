use crate::{
    db_types::{BuyerInfo, CartLine, CartLineStatus, GuestId, Order, OrderId},
    traits::StorageError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Converts the guest's active cart into an order, in a single atomic transaction:
    /// * A new order is created for the guest and buyer details.
    /// * Every `in_cart` line of the guest is moved to `unpaid` and stamped with the new order id.
    /// * The order total is set to the sum of the moved lines' totals.
    ///
    /// If the guest has no `in_cart` lines, nothing is written and `None` is returned.
    async fn checkout_cart(
        &self,
        guest: &GuestId,
        buyer: &BuyerInfo,
    ) -> Result<Option<(Order, Vec<CartLine>)>, StorageError>;

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, StorageError>;

    /// Returns up to `limit` of the guest's orders that have at least one line in one of `statuses`, newest first.
    async fn fetch_recent_orders_for_guest(
        &self,
        guest: &GuestId,
        statuses: &[CartLineStatus],
        limit: u32,
    ) -> Result<Vec<Order>, StorageError>;
}
