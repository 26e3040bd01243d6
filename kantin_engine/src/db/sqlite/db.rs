use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::{cart_lines, catalog, db_url, new_pool, orders, payment_records, SqliteDatabaseError};
use crate::{
    db_types::{
        BuyerInfo,
        CartLine,
        CartLineDetail,
        CartLineStatus,
        GuestId,
        MenuItem,
        MenuItemId,
        NewPaymentRecord,
        Order,
        OrderId,
        PaymentRecord,
        PaymentStatus,
        Rupiah,
        Vendor,
        VendorId,
    },
    order_objects::CartLineQueryFilter,
    traits::{
        CartManagement,
        CatalogManagement,
        InsertPaymentResult,
        LineRemoval,
        OrderManagement,
        PaymentRecordManagement,
        StorageError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_vendor(&self, vendor_id: VendorId) -> Result<Option<Vendor>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_vendor(vendor_id, &mut conn).await?)
    }

    async fn fetch_menu_item(
        &self,
        vendor_id: VendorId,
        item_id: MenuItemId,
    ) -> Result<Option<MenuItem>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_menu_item(vendor_id, item_id, &mut conn).await?)
    }
}

impl CartManagement for SqliteDatabase {
    async fn upsert_cart_line(
        &self,
        guest: &GuestId,
        item: &MenuItem,
        quantity: i64,
    ) -> Result<Option<CartLine>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let line = cart_lines::upsert_cart_line(guest, item, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(line)
    }

    async fn fetch_cart_line(&self, line_id: i64) -> Result<Option<CartLine>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(cart_lines::fetch_cart_line(line_id, &mut conn).await?)
    }

    async fn remove_one_unit(&self, line_id: i64) -> Result<LineRemoval, StorageError> {
        let mut tx = self.pool.begin().await?;
        let result = cart_lines::remove_one_unit(line_id, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_cart_lines(&self, filter: CartLineQueryFilter) -> Result<Vec<CartLine>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(cart_lines::fetch_cart_lines(filter, &mut conn).await?)
    }

    async fn fetch_cart_line_details(&self, filter: CartLineQueryFilter) -> Result<Vec<CartLineDetail>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(cart_lines::fetch_cart_line_details(filter, &mut conn).await?)
    }

    async fn update_vendor_line_statuses(
        &self,
        order_id: OrderId,
        vendor_id: VendorId,
        from: &[CartLineStatus],
        to: CartLineStatus,
    ) -> Result<u64, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(cart_lines::update_vendor_line_statuses(order_id, vendor_id, from, to, &mut conn).await?)
    }
}

impl OrderManagement for SqliteDatabase {
    /// Takes the guest's cart, and in a single atomic transaction,
    /// * creates a new order for the buyer,
    /// * moves the guest's `in_cart` lines to `unpaid`, stamped with the new order id,
    /// * sets the order total to the sum of those lines.
    ///
    /// If there were no lines to move, the transaction is rolled back and `None` is returned.
    async fn checkout_cart(
        &self,
        guest: &GuestId,
        buyer: &BuyerInfo,
    ) -> Result<Option<(Order, Vec<CartLine>)>, StorageError> {
        let mut tx = self.pool.begin().await?;
        match orders::convert_cart_to_order(guest, buyer, &mut tx).await? {
            Some(result) => {
                tx.commit().await?;
                Ok(Some(result))
            },
            None => {
                tx.rollback().await?;
                Ok(None)
            },
        }
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn fetch_recent_orders_for_guest(
        &self,
        guest: &GuestId,
        statuses: &[CartLineStatus],
        limit: u32,
    ) -> Result<Vec<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_recent_orders_for_guest(guest, statuses, limit, &mut conn).await?)
    }
}

impl PaymentRecordManagement for SqliteDatabase {
    async fn insert_payment_record(&self, record: NewPaymentRecord) -> Result<InsertPaymentResult, StorageError> {
        let mut tx = self.pool.begin().await?;
        let result = payment_records::idempotent_insert(record, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_payment_record_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payment_records::fetch_payment_record_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_payment_record_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<PaymentRecord>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payment_records::fetch_payment_record_by_provider_order_id(provider_order_id, &mut conn).await?)
    }

    async fn transition_payment_status(
        &self,
        provider_order_id: &str,
        observed: PaymentStatus,
        new_status: PaymentStatus,
    ) -> Result<Option<PaymentRecord>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let result = payment_records::transition_status(provider_order_id, observed, new_status, &mut tx).await?;
        match result {
            Some(_) => tx.commit().await?,
            None => tx.rollback().await?,
        }
        Ok(result)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `KPG_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }

    pub async fn insert_vendor(&self, name: &str) -> Result<Vendor, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_vendor(name, &mut conn).await
    }

    pub async fn insert_menu_item(
        &self,
        vendor_id: VendorId,
        name: &str,
        price: Rupiah,
    ) -> Result<MenuItem, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_menu_item(vendor_id, name, price, &mut conn).await
    }

    /// Changes the current menu price. Lines already in a cart keep the price they were added at.
    pub async fn update_menu_item_price(
        &self,
        item_id: MenuItemId,
        price: Rupiah,
    ) -> Result<Option<MenuItem>, SqliteDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let item = catalog::update_menu_item_price(item_id, price, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }
}
