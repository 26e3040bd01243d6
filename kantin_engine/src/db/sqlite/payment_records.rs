use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::{cart_lines::settle_unpaid_lines, SqliteDatabaseError},
    db_types::{NewPaymentRecord, OrderId, PaymentRecord, PaymentStatus},
    traits::InsertPaymentResult,
};

const PAYMENT_RECORD_COLUMNS: &str = "id, order_id, provider_transaction_id, provider_order_id, payment_method, \
                                      gross_amount, status, payment_data, created_at, updated_at";

/// Inserts the record unless one already exists for the order, in which case the existing record is returned.
pub async fn idempotent_insert(
    record: NewPaymentRecord,
    conn: &mut SqliteConnection,
) -> Result<InsertPaymentResult, SqliteDatabaseError> {
    let order_id = record.order_id;
    let sql = format!(
        r#"
            INSERT INTO payment_records (
                order_id,
                provider_transaction_id,
                provider_order_id,
                payment_method,
                gross_amount,
                status,
                payment_data
            ) VALUES ($1, $2, $3, $4, $5, 'pending', $6)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING {PAYMENT_RECORD_COLUMNS}
        "#
    );
    let inserted = sqlx::query_as::<_, PaymentRecord>(&sql)
        .bind(record.order_id)
        .bind(record.provider_transaction_id)
        .bind(record.provider_order_id)
        .bind(record.payment_method)
        .bind(record.gross_amount)
        .bind(record.payment_data)
        .fetch_optional(&mut *conn)
        .await?;
    match inserted {
        Some(r) => {
            debug!("🗃️ Payment record {} saved for order {order_id}", r.provider_order_id);
            Ok(InsertPaymentResult::Inserted(r))
        },
        None => {
            let existing = fetch_payment_record_for_order(order_id, conn).await?.ok_or_else(|| {
                SqliteDatabaseError::QueryError(format!("Payment record for order {order_id} vanished after a conflict"))
            })?;
            debug!("🗃️ Order {order_id} already has payment record {}", existing.provider_order_id);
            Ok(InsertPaymentResult::AlreadyExists(existing))
        },
    }
}

pub async fn fetch_payment_record_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, SqliteDatabaseError> {
    let sql = format!("SELECT {PAYMENT_RECORD_COLUMNS} FROM payment_records WHERE order_id = $1");
    let record = sqlx::query_as::<_, PaymentRecord>(&sql).bind(order_id).fetch_optional(conn).await?;
    Ok(record)
}

pub async fn fetch_payment_record_by_provider_order_id(
    provider_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, SqliteDatabaseError> {
    let sql = format!("SELECT {PAYMENT_RECORD_COLUMNS} FROM payment_records WHERE provider_order_id = $1");
    let record = sqlx::query_as::<_, PaymentRecord>(&sql).bind(provider_order_id).fetch_optional(conn).await?;
    Ok(record)
}

/// Conditionally moves a payment record from `observed` to `new_status`, and settles the order's unpaid lines to
/// match. Run this inside a transaction so that the record and its lines change together.
pub async fn transition_status(
    provider_order_id: &str,
    observed: PaymentStatus,
    new_status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, SqliteDatabaseError> {
    let sql = format!(
        r#"
            UPDATE payment_records SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE provider_order_id = $2 AND status = $3
            RETURNING {PAYMENT_RECORD_COLUMNS}
        "#
    );
    let record = sqlx::query_as::<_, PaymentRecord>(&sql)
        .bind(new_status)
        .bind(provider_order_id)
        .bind(observed)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(record) = record else {
        trace!("🗃️ Payment {provider_order_id} is no longer {observed}. No update made.");
        return Ok(None);
    };
    if let Some(line_status) = new_status.line_status() {
        let n = settle_unpaid_lines(record.order_id, line_status, conn).await?;
        debug!("🗃️ {n} lines of order {} are now {line_status}", record.order_id);
    }
    debug!("🗃️ Payment {provider_order_id} moved from {observed} to {new_status}");
    Ok(Some(record))
}
