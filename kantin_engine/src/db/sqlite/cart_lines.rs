use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{CartLine, CartLineDetail, CartLineStatus, GuestId, MenuItem, OrderId, VendorId, MAX_LINE_QUANTITY},
    order_objects::CartLineQueryFilter,
    traits::LineRemoval,
};

pub(crate) const CART_LINE_COLUMNS: &str = "id, guest_id, vendor_id, menu_item_id, quantity, unit_price, total_price, \
                                            status, order_id, created_at, updated_at";

/// Adds `quantity` units of `item` to the guest's active cart in a single statement.
///
/// The partial unique index on `(guest_id, vendor_id, menu_item_id) WHERE status = 'in_cart'` turns a second add of
/// the same item into an increment of the existing line. The increment uses the line's own `unit_price`, not the
/// current menu price. An increment that would take the line past `MAX_LINE_QUANTITY` matches no row, and `None` is
/// returned.
///
/// Run this inside a transaction, so that the increment read back through `RETURNING` is the one that gets committed.
pub async fn upsert_cart_line(
    guest: &GuestId,
    item: &MenuItem,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartLine>, SqliteDatabaseError> {
    let total = item.price.checked_mul(quantity).ok_or_else(|| {
        SqliteDatabaseError::QueryError(format!("{quantity} x {} overflows the line total", item.price))
    })?;
    let sql = format!(
        r#"
            INSERT INTO cart_lines (guest_id, vendor_id, menu_item_id, quantity, unit_price, total_price, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'in_cart')
            ON CONFLICT (guest_id, vendor_id, menu_item_id) WHERE status = 'in_cart'
            DO UPDATE SET
                quantity = quantity + excluded.quantity,
                total_price = total_price + excluded.quantity * unit_price,
                updated_at = CURRENT_TIMESTAMP
            WHERE quantity + excluded.quantity <= $7
            RETURNING {CART_LINE_COLUMNS}
        "#
    );
    let line = sqlx::query_as::<_, CartLine>(&sql)
        .bind(guest.as_str())
        .bind(item.vendor_id)
        .bind(item.id)
        .bind(quantity)
        .bind(item.price)
        .bind(total)
        .bind(MAX_LINE_QUANTITY)
        .fetch_optional(conn)
        .await?;
    match &line {
        Some(l) => trace!("🗃️ Cart line #{} for {guest} now has {} x {}", l.id, l.quantity, item.name),
        None => debug!("🗃️ Adding {quantity} x {} for {guest} would exceed the line limit", item.name),
    }
    Ok(line)
}

pub async fn fetch_cart_line(line_id: i64, conn: &mut SqliteConnection) -> Result<Option<CartLine>, SqliteDatabaseError> {
    let sql = format!("SELECT {CART_LINE_COLUMNS} FROM cart_lines WHERE id = $1");
    let line = sqlx::query_as::<_, CartLine>(&sql).bind(line_id).fetch_optional(conn).await?;
    Ok(line)
}

/// Takes one unit off an `in_cart` line. If that was the last unit, the line is deleted.
///
/// This is not atomic on its own. Call it inside a transaction, passing `&mut *tx` as the connection.
pub async fn remove_one_unit(line_id: i64, conn: &mut SqliteConnection) -> Result<LineRemoval, SqliteDatabaseError> {
    let sql = format!(
        r#"
            UPDATE cart_lines SET
                quantity = quantity - 1,
                total_price = total_price - unit_price,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'in_cart' AND quantity > 0
            RETURNING {CART_LINE_COLUMNS}
        "#
    );
    let line = sqlx::query_as::<_, CartLine>(&sql).bind(line_id).fetch_optional(&mut *conn).await?;
    let result = match line {
        None => LineRemoval::NotInCart,
        Some(line) if line.quantity == 0 => {
            sqlx::query("DELETE FROM cart_lines WHERE id = $1").bind(line_id).execute(conn).await?;
            debug!("🗃️ Cart line #{line_id} removed");
            LineRemoval::Deleted(line_id)
        },
        Some(line) => LineRemoval::Decremented(line),
    };
    Ok(result)
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: CartLineQueryFilter, table: &str) {
    if filter.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(guest_id) = filter.guest_id {
        where_clause.push(format!("{table}guest_id = "));
        where_clause.push_bind_unseparated(guest_id.as_str().to_string());
    }
    if let Some(order_id) = filter.order_id {
        where_clause.push(format!("{table}order_id = "));
        where_clause.push_bind_unseparated(order_id.value());
    }
    if let Some(vendor_id) = filter.vendor_id {
        where_clause.push(format!("{table}vendor_id = "));
        where_clause.push_bind_unseparated(vendor_id.value());
    }
    if let Some(statuses) = filter.status {
        if statuses.is_empty() {
            // An explicit, empty status list matches nothing
            where_clause.push("1 = 0");
        } else {
            where_clause.push(format!("{table}status IN ("));
            let mut first = true;
            for status in statuses {
                if !first {
                    where_clause.push_unseparated(", ");
                }
                where_clause.push_bind_unseparated(status.as_str());
                first = false;
            }
            where_clause.push_unseparated(")");
        }
    }
}

/// Fetches cart lines according to the criteria in the `CartLineQueryFilter`, ordered by line id.
pub async fn fetch_cart_lines(
    filter: CartLineQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<CartLine>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(format!("SELECT {CART_LINE_COLUMNS} FROM cart_lines"));
    push_filter(&mut builder, filter, "");
    builder.push(" ORDER BY id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let lines = builder.build_query_as::<CartLine>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_cart_lines: {}", lines.len());
    Ok(lines)
}

pub async fn fetch_cart_line_details(
    filter: CartLineQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<CartLineDetail>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(
        r#"
        SELECT
            c.id AS id,
            c.guest_id AS guest_id,
            c.vendor_id AS vendor_id,
            c.menu_item_id AS menu_item_id,
            c.quantity AS quantity,
            c.unit_price AS unit_price,
            c.total_price AS total_price,
            c.status AS status,
            c.order_id AS order_id,
            c.created_at AS created_at,
            c.updated_at AS updated_at,
            v.name AS vendor_name,
            m.name AS menu_item_name
        FROM cart_lines c
        JOIN vendors v ON v.id = c.vendor_id
        JOIN menu_items m ON m.id = c.menu_item_id
        "#,
    );
    push_filter(&mut builder, filter, "c.");
    builder.push(" ORDER BY c.vendor_id ASC, c.id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let lines = builder.build_query_as::<CartLineDetail>().fetch_all(conn).await?;
    Ok(lines)
}

/// Moves the vendor's lines for an order into `to`. Lines already in `to` are not counted.
pub async fn update_vendor_line_statuses(
    order_id: OrderId,
    vendor_id: VendorId,
    from: &[CartLineStatus],
    to: CartLineStatus,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE cart_lines SET updated_at = CURRENT_TIMESTAMP, status = ");
    builder.push_bind(to.as_str());
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.value());
    builder.push(" AND vendor_id = ");
    builder.push_bind(vendor_id.value());
    builder.push(" AND status <> ");
    builder.push_bind(to.as_str());
    if !from.is_empty() {
        builder.push(" AND status IN (");
        let mut statuses = builder.separated(", ");
        for status in from {
            statuses.push_bind(status.as_str());
        }
        statuses.push_unseparated(")");
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build().execute(conn).await?;
    debug!("🗃️ {} lines of order {order_id} for {vendor_id} moved to {to}", result.rows_affected());
    Ok(result.rows_affected())
}

/// Moves every `unpaid` line of the order into `to`. Returns the number of lines changed.
pub(crate) async fn settle_unpaid_lines(
    order_id: OrderId,
    to: CartLineStatus,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE cart_lines SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 AND status = 'unpaid'",
    )
    .bind(to.as_str())
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
