use crate::{
    db_types::{NewPaymentRecord, OrderId, PaymentRecord, PaymentStatus},
    traits::{InsertPaymentResult, StorageError},
};

#[allow(async_fn_in_trait)]
pub trait PaymentRecordManagement {
    /// Stores a new `pending` payment record. There is at most one record per order, so if one already exists it is
    /// returned as [`InsertPaymentResult::AlreadyExists`] and nothing is written.
    async fn insert_payment_record(&self, record: NewPaymentRecord) -> Result<InsertPaymentResult, StorageError>;

    async fn fetch_payment_record_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>, StorageError>;

    async fn fetch_payment_record_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<PaymentRecord>, StorageError>;

    /// Moves the record from `observed` to `new_status`, but only if it is still in the `observed` status. In the same
    /// transaction, the order's `unpaid` lines take on [`PaymentStatus::line_status`] of the new status.
    ///
    /// Returns the updated record, or `None` if the record was not in the `observed` status (or does not exist).
    async fn transition_payment_status(
        &self,
        provider_order_id: &str,
        observed: PaymentStatus,
        new_status: PaymentStatus,
    ) -> Result<Option<PaymentRecord>, StorageError>;
}
