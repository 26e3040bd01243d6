use crate::{
    db_types::{CartLine, CartLineDetail, CartLineStatus, GuestId, MenuItem, OrderId, VendorId},
    order_objects::CartLineQueryFilter,
    traits::{LineRemoval, StorageError},
};

#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Adds `quantity` units of `item` to the guest's active cart.
    ///
    /// If the guest already has an `in_cart` line for the same vendor and menu item, the quantity and total of that line
    /// are incremented, using the unit price captured when the line was created. Otherwise a new line is created with
    /// the item's current price. This must happen atomically, so that concurrent adds for the same item result in a
    /// single line.
    ///
    /// Returns `None`, leaving the line untouched, if the merged quantity would exceed
    /// [`crate::db_types::MAX_LINE_QUANTITY`].
    async fn upsert_cart_line(
        &self,
        guest: &GuestId,
        item: &MenuItem,
        quantity: i64,
    ) -> Result<Option<CartLine>, StorageError>;

    async fn fetch_cart_line(&self, line_id: i64) -> Result<Option<CartLine>, StorageError>;

    /// Takes one unit off an `in_cart` line, deleting the line if no units remain.
    async fn remove_one_unit(&self, line_id: i64) -> Result<LineRemoval, StorageError>;

    async fn fetch_cart_lines(&self, filter: CartLineQueryFilter) -> Result<Vec<CartLine>, StorageError>;

    /// As for [`Self::fetch_cart_lines`], but with vendor and menu item names attached.
    async fn fetch_cart_line_details(&self, filter: CartLineQueryFilter) -> Result<Vec<CartLineDetail>, StorageError>;

    /// Moves the lines of `order_id` sold by `vendor_id` whose status is one of `from` into the `to` status. If `from` is
    /// empty, all the vendor's lines for the order are moved. Returns the number of lines changed.
    async fn update_vendor_line_statuses(
        &self,
        order_id: OrderId,
        vendor_id: VendorId,
        from: &[CartLineStatus],
        to: CartLineStatus,
    ) -> Result<u64, StorageError>;
}
