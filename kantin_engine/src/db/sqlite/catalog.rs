use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{MenuItem, MenuItemId, Rupiah, Vendor, VendorId},
};

pub async fn fetch_vendor(
    vendor_id: VendorId,
    conn: &mut SqliteConnection,
) -> Result<Option<Vendor>, SqliteDatabaseError> {
    let vendor = sqlx::query_as::<_, Vendor>("SELECT id, name FROM vendors WHERE id = $1")
        .bind(vendor_id)
        .fetch_optional(conn)
        .await?;
    Ok(vendor)
}

pub async fn fetch_menu_item(
    vendor_id: VendorId,
    item_id: MenuItemId,
    conn: &mut SqliteConnection,
) -> Result<Option<MenuItem>, SqliteDatabaseError> {
    let item = sqlx::query_as::<_, MenuItem>(
        "SELECT id, vendor_id, name, price FROM menu_items WHERE id = $1 AND vendor_id = $2",
    )
    .bind(item_id)
    .bind(vendor_id)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

pub async fn insert_vendor(name: &str, conn: &mut SqliteConnection) -> Result<Vendor, SqliteDatabaseError> {
    let vendor = sqlx::query_as::<_, Vendor>("INSERT INTO vendors (name) VALUES ($1) RETURNING id, name")
        .bind(name)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Vendor {} created with id {}", vendor.name, vendor.id);
    Ok(vendor)
}

pub async fn insert_menu_item(
    vendor_id: VendorId,
    name: &str,
    price: Rupiah,
    conn: &mut SqliteConnection,
) -> Result<MenuItem, SqliteDatabaseError> {
    let item = sqlx::query_as::<_, MenuItem>(
        r#"
            INSERT INTO menu_items (vendor_id, name, price) VALUES ($1, $2, $3)
            RETURNING id, vendor_id, name, price
        "#,
    )
    .bind(vendor_id)
    .bind(name)
    .bind(price)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Menu item {} ({}) added for {vendor_id}", item.name, item.price);
    Ok(item)
}

pub async fn update_menu_item_price(
    item_id: MenuItemId,
    price: Rupiah,
    conn: &mut SqliteConnection,
) -> Result<Option<MenuItem>, SqliteDatabaseError> {
    let item = sqlx::query_as::<_, MenuItem>(
        r#"
            UPDATE menu_items SET price = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2
            RETURNING id, vendor_id, name, price
        "#,
    )
    .bind(price)
    .bind(item_id)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}
