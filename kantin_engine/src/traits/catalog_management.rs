use crate::{
    db_types::{MenuItem, MenuItemId, Vendor, VendorId},
    traits::StorageError,
};

/// Read-only access to the vendors and menus. Menu and vendor maintenance happens elsewhere.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_vendor(&self, vendor_id: VendorId) -> Result<Option<Vendor>, StorageError>;

    /// Fetches the menu item with the given id, but only if it is sold by `vendor_id`.
    async fn fetch_menu_item(&self, vendor_id: VendorId, item_id: MenuItemId)
        -> Result<Option<MenuItem>, StorageError>;
}
