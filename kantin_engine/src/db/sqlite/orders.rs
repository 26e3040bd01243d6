use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::{cart_lines::CART_LINE_COLUMNS, SqliteDatabaseError},
    db_types::{BuyerInfo, CartLine, CartLineStatus, GuestId, Order, OrderId, Rupiah},
};

const ORDER_COLUMNS: &str = "id, guest_id, buyer_name, seat, notes, email, total_price, created_at";

/// Inserts a new order with a zero total. This is not atomic. You can embed this call inside a transaction if you need
/// to ensure atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(
    guest: &GuestId,
    buyer: &BuyerInfo,
    conn: &mut SqliteConnection,
) -> Result<OrderId, SqliteDatabaseError> {
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO orders (guest_id, buyer_name, seat, notes, email, total_price)
            VALUES ($1, $2, $3, $4, $5, 0)
            RETURNING id
        "#,
    )
    .bind(guest.as_str())
    .bind(buyer.buyer_name.trim())
    .bind(buyer.seat.trim())
    .bind(buyer.notes.trim())
    .bind(buyer.email.trim())
    .fetch_one(conn)
    .await?;
    Ok(OrderId(id))
}

/// Moves every `in_cart` line of the guest into `unpaid`, stamped with `order_id`, and returns the moved lines.
async fn claim_cart_lines(
    guest: &GuestId,
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<CartLine>, SqliteDatabaseError> {
    let sql = format!(
        r#"
            UPDATE cart_lines SET status = 'unpaid', order_id = $1, updated_at = CURRENT_TIMESTAMP
            WHERE guest_id = $2 AND status = 'in_cart'
            RETURNING {CART_LINE_COLUMNS}
        "#
    );
    let mut lines =
        sqlx::query_as::<_, CartLine>(&sql).bind(order_id).bind(guest.as_str()).fetch_all(conn).await?;
    lines.sort_by_key(|l| l.id);
    Ok(lines)
}

async fn set_order_total(
    order_id: OrderId,
    total: Rupiah,
    conn: &mut SqliteConnection,
) -> Result<Order, SqliteDatabaseError> {
    let sql = format!("UPDATE orders SET total_price = $1 WHERE id = $2 RETURNING {ORDER_COLUMNS}");
    let order = sqlx::query_as::<_, Order>(&sql).bind(total).bind(order_id).fetch_one(conn).await?;
    Ok(order)
}

/// Converts the guest's cart into an order. Run this inside a transaction: if the cart turns out to be empty, the
/// caller must roll back so that the empty order is discarded.
pub async fn convert_cart_to_order(
    guest: &GuestId,
    buyer: &BuyerInfo,
    conn: &mut SqliteConnection,
) -> Result<Option<(Order, Vec<CartLine>)>, SqliteDatabaseError> {
    let order_id = insert_order(guest, buyer, &mut *conn).await?;
    let lines = claim_cart_lines(guest, order_id, &mut *conn).await?;
    if lines.is_empty() {
        trace!("🗃️ Guest {guest} has nothing in their cart");
        return Ok(None);
    }
    let total = lines.iter().map(|l| l.total_price).sum::<Rupiah>();
    let order = set_order_total(order_id, total, conn).await?;
    debug!("🗃️ Order {order_id} created for {guest} with {} lines totalling {total}", lines.len());
    Ok(Some((order, lines)))
}

pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches up to `limit` of the guest's orders that have a line in one of the given statuses, newest first.
pub async fn fetch_recent_orders_for_guest(
    guest: &GuestId,
    statuses: &[CartLineStatus],
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.guest_id = "));
    builder.push_bind(guest.as_str().to_string());
    if !statuses.is_empty() {
        builder.push(" AND EXISTS (SELECT 1 FROM cart_lines c WHERE c.order_id = o.id AND c.status IN (");
        let mut list = builder.separated(", ");
        for status in statuses {
            list.push_bind(status.as_str());
        }
        list.push_unseparated("))");
    }
    builder.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ");
    builder.push_bind(i64::from(limit));
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}
