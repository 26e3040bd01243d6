use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartLine, CartLineDetail, CartLineStatus, GuestId, MenuItemId, VendorId, MAX_LINE_QUANTITY},
    kpe_api::{errors::OrderFlowError, order_objects::CartLineQueryFilter},
    traits::{CartManagement, CatalogManagement, LineRemoval},
};

/// `CartApi` manages a guest's active cart: adding items, taking them off again, and listing what is in the cart.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

pub(crate) fn ensure_guest(guest: &GuestId) -> Result<(), OrderFlowError> {
    if guest.is_blank() {
        return Err(OrderFlowError::ValidationError("A guest id is required".to_string()));
    }
    Ok(())
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CartApi<B>
where B: CatalogManagement + CartManagement
{
    /// Adds `quantity` units of a menu item to the guest's cart.
    ///
    /// If the item is already in the cart, the existing line is incremented at the price it was first added at.
    /// Otherwise a new line is created at the current menu price.
    ///
    /// ## Failure modes
    /// * `ValidationError` if `quantity` is not positive, or the line would end up holding more than
    ///   [`MAX_LINE_QUANTITY`] units.
    /// * `NotFound` if the vendor does not sell the item.
    pub async fn add_item(
        &self,
        guest: &GuestId,
        vendor_id: VendorId,
        item_id: MenuItemId,
        quantity: i64,
    ) -> Result<CartLine, OrderFlowError> {
        ensure_guest(guest)?;
        if quantity <= 0 {
            return Err(OrderFlowError::ValidationError(format!("Quantity must be positive, but was {quantity}")));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(OrderFlowError::ValidationError(format!(
                "At most {MAX_LINE_QUANTITY} units of an item can be ordered, but {quantity} were requested"
            )));
        }
        let item = self
            .db
            .fetch_menu_item(vendor_id, item_id)
            .await
            .map_err(|e| OrderFlowError::storage("Menu item lookup", item_id, e))?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Menu item {item_id} of {vendor_id}")))?;
        if item.price.checked_mul(quantity).is_none() {
            return Err(OrderFlowError::ValidationError(format!("{quantity} x {} is too large an amount", item.price)));
        }
        let line = self
            .db
            .upsert_cart_line(guest, &item, quantity)
            .await
            .map_err(|e| OrderFlowError::storage("Add to cart", guest, e))?
            .ok_or_else(|| {
                OrderFlowError::ValidationError(format!(
                    "{guest} already has {} in their cart. A line can hold at most {MAX_LINE_QUANTITY} units",
                    item.name
                ))
            })?;
        info!("🛒️ {guest} added {quantity} x {} to their cart. Line #{} now holds {}", item.name, line.id, line.quantity);
        Ok(line)
    }

    /// Takes one unit off a cart line, deleting the line when the last unit goes.
    ///
    /// ## Failure modes
    /// * `NotFound` if there is no such line.
    /// * `AuthorizationError` if the line belongs to someone else.
    /// * `ValidationError` if the line has already been checked out.
    pub async fn remove_one_unit(&self, guest: &GuestId, line_id: i64) -> Result<LineRemoval, OrderFlowError> {
        ensure_guest(guest)?;
        let line = self
            .db
            .fetch_cart_line(line_id)
            .await
            .map_err(|e| OrderFlowError::storage("Cart line lookup", line_id, e))?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Cart line #{line_id}")))?;
        if &line.guest_id != guest {
            warn!("🛒️ {guest} tried to change cart line #{line_id}, which belongs to {}", line.guest_id);
            return Err(OrderFlowError::AuthorizationError(format!("Cart line #{line_id} is not yours")));
        }
        if line.status != CartLineStatus::InCart {
            return Err(OrderFlowError::ValidationError(format!(
                "Cart line #{line_id} has already been checked out ({})",
                line.status
            )));
        }
        let result = self
            .db
            .remove_one_unit(line_id)
            .await
            .map_err(|e| OrderFlowError::storage("Remove from cart", line_id, e))?;
        match &result {
            LineRemoval::Decremented(l) => debug!("🛒️ Cart line #{line_id} for {guest} now holds {}", l.quantity),
            LineRemoval::Deleted(_) => debug!("🛒️ Cart line #{line_id} for {guest} removed"),
            LineRemoval::NotInCart => {
                return Err(OrderFlowError::ValidationError(format!(
                    "Cart line #{line_id} was checked out before it could be changed"
                )));
            },
        }
        Ok(result)
    }

    /// All the lines in the guest's active cart, with vendor and menu item names.
    pub async fn list_active(&self, guest: &GuestId) -> Result<Vec<CartLineDetail>, OrderFlowError> {
        ensure_guest(guest)?;
        let filter = CartLineQueryFilter::default().with_guest_id(guest.clone()).with_status(CartLineStatus::InCart);
        let lines =
            self.db.fetch_cart_line_details(filter).await.map_err(|e| OrderFlowError::storage("Cart listing", guest, e))?;
        trace!("🛒️ {guest} has {} lines in their cart", lines.len());
        Ok(lines)
    }
}
