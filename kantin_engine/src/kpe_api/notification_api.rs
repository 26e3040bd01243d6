use std::{fmt::Debug, time::Duration};

use log::*;
use serde_json::Value;

use crate::{
    db_types::{PaymentRecord, PaymentStatus},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    kpe_api::{
        errors::OrderFlowError,
        payment_objects::{
            classify_transition,
            map_provider_status,
            NotificationOutcome,
            PaymentTransition,
            DEFAULT_PROVIDER_TIMEOUT,
        },
    },
    traits::{OrderManagement, PaymentProvider, PaymentRecordManagement, ProviderStatus},
};

/// `NotificationApi` reconciles the payment provider's asynchronous notifications with our payment records.
///
/// The notification body is never trusted for the status itself. Only its `order_id` is used, and the current status
/// is fetched from the provider before anything is changed.
pub struct NotificationApi<B, P> {
    db: B,
    provider: P,
    producers: EventProducers,
    provider_timeout: Duration,
}

impl<B, P> Debug for NotificationApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi")
    }
}

impl<B, P> NotificationApi<B, P> {
    pub fn new(db: B, provider: P, producers: EventProducers) -> Self {
        Self { db, provider, producers, provider_timeout: DEFAULT_PROVIDER_TIMEOUT }
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, P> NotificationApi<B, P>
where
    B: OrderManagement + PaymentRecordManagement,
    P: PaymentProvider,
{
    /// Handles one notification payload.
    ///
    /// 1. The `order_id` field is extracted (`MalformedPayload` if it is missing or empty).
    /// 2. The provider is asked for the transaction's current status (`GatewayError` if that fails or times out).
    /// 3. The payment record is looked up by provider order id (`NotFound` if there is none).
    /// 4. The provider status is mapped with [`map_provider_status`]. Unrecognised statuses are logged and ignored.
    /// 5. The transition is applied according to [`classify_transition`]:
    ///    * the same status again is a no-op,
    ///    * forward moves are applied with a conditional update, re-reading the record once if another notification got
    ///      there first,
    ///    * moves back to `pending` or `challenge` are stale and ignored,
    ///    * a move from one terminal status to another is a `ConsistencyConflict` and the record is left alone.
    ///
    /// Nothing is retried here. The provider redelivers notifications that were not acknowledged.
    pub async fn handle_notification(&self, payload: &Value) -> Result<NotificationOutcome, OrderFlowError> {
        let order_ref = payload
            .get("order_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OrderFlowError::MalformedPayload("order_id is missing".to_string()))?;
        trace!("🔔️ Notification received for {order_ref}");
        let status = self.query_status(order_ref).await?;
        let record = self
            .db
            .fetch_payment_record_by_provider_order_id(order_ref)
            .await
            .map_err(|e| OrderFlowError::storage("Payment record lookup", order_ref, e))?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Payment {order_ref}")))?;
        let Some(reported) = map_provider_status(&status.transaction_status, status.fraud_status.as_deref()) else {
            warn!(
                "🔔️ Unrecognised status for {order_ref}: transaction status '{}', fraud status '{}'. Ignoring it.",
                status.transaction_status,
                status.fraud_status.as_deref().unwrap_or("none")
            );
            return Ok(NotificationOutcome::Unrecognised(record));
        };
        self.apply(record, reported).await
    }

    async fn query_status(&self, order_ref: &str) -> Result<ProviderStatus, OrderFlowError> {
        match tokio::time::timeout(self.provider_timeout, self.provider.query_status(order_ref)).await {
            Ok(Ok(status)) => {
                debug!(
                    "🔔️ Provider reports {order_ref} as {} (fraud status {:?})",
                    status.transaction_status, status.fraud_status
                );
                Ok(status)
            },
            Ok(Err(e)) => Err(OrderFlowError::provider("Status query", order_ref, e)),
            Err(_) => Err(OrderFlowError::GatewayError(format!(
                "Status query for {order_ref} timed out after {}s",
                self.provider_timeout.as_secs_f32()
            ))),
        }
    }

    async fn apply(
        &self,
        mut record: PaymentRecord,
        reported: PaymentStatus,
    ) -> Result<NotificationOutcome, OrderFlowError> {
        let order_ref = record.provider_order_id.clone();
        for attempt in 0..2 {
            let current = record.status;
            match classify_transition(current, reported) {
                PaymentTransition::Unchanged => {
                    debug!("🔔️ Payment {order_ref} is already {current}. Nothing to do.");
                    return Ok(NotificationOutcome::Unchanged(record));
                },
                PaymentTransition::Stale => {
                    info!("🔔️ Ignoring stale {reported} notification for payment {order_ref}, which is {current}");
                    return Ok(NotificationOutcome::Stale(record));
                },
                PaymentTransition::Conflict => {
                    error!(
                        "🔔️ CONFLICT: payment {order_ref} is {current}, but the provider now reports {reported}. The \
                         record has not been changed."
                    );
                    return Err(OrderFlowError::ConsistencyConflict(format!(
                        "Payment {order_ref} is {current} and cannot become {reported}"
                    )));
                },
                PaymentTransition::Apply => {
                    let updated = self
                        .db
                        .transition_payment_status(&order_ref, current, reported)
                        .await
                        .map_err(|e| OrderFlowError::storage("Payment status update", &order_ref, e))?;
                    if let Some(updated) = updated {
                        info!("🔔️ Payment {order_ref} moved from {current} to {reported}");
                        self.publish(&updated).await;
                        return Ok(NotificationOutcome::Updated { previous: current, record: updated });
                    }
                    debug!("🔔️ Payment {order_ref} changed underneath us (attempt {attempt}). Re-reading it.");
                    record = self
                        .db
                        .fetch_payment_record_by_provider_order_id(&order_ref)
                        .await
                        .map_err(|e| OrderFlowError::storage("Payment record lookup", &order_ref, e))?
                        .ok_or_else(|| OrderFlowError::NotFound(format!("Payment {order_ref}")))?;
                },
            }
        }
        Err(OrderFlowError::ConsistencyConflict(format!(
            "Payment {order_ref} kept changing while a {reported} notification was being applied"
        )))
    }

    async fn publish(&self, record: &PaymentRecord) {
        let is_paid = record.status == PaymentStatus::Success;
        let is_annulled = record.status.is_terminal() && !is_paid;
        if !is_paid && !is_annulled {
            return;
        }
        let order = match self.db.fetch_order(record.order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                error!("🔔️ Order {} for payment {} does not exist", record.order_id, record.provider_order_id);
                return;
            },
            Err(e) => {
                error!("🔔️ Could not fetch order {} to publish payment events. {e}", record.order_id);
                return;
            },
        };
        if is_paid {
            for emitter in &self.producers.order_paid_producer {
                debug!("🔔️ Notifying order paid hook subscribers");
                emitter.publish_event(OrderPaidEvent::new(order.clone(), record.clone())).await;
            }
        } else {
            for emitter in &self.producers.order_annulled_producer {
                debug!("🔔️ Notifying order annulled hook subscribers");
                emitter.publish_event(OrderAnnulledEvent::new(order.clone(), record.clone())).await;
            }
        }
    }
}
