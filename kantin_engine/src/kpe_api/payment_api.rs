use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{
        BuyerInfo,
        CartLineDetail,
        CartLineStatus,
        GuestId,
        NewPaymentRecord,
        Order,
        OrderId,
        PaymentAction,
        PaymentMethod,
        PaymentRecord,
        Rupiah,
    },
    kpe_api::{
        cart_api::ensure_guest,
        checkout_api::checkout_cart,
        errors::OrderFlowError,
        order_objects::CartLineQueryFilter,
        payment_objects::{
            encode_payment_action,
            CheckoutReceipt,
            PaymentConfig,
            PaymentDetail,
            DEEPLINK_ACTION,
            QR_CODE_ACTION,
        },
    },
    traits::{
        CartManagement,
        ChargeItem,
        CustomerContact,
        InsertPaymentResult,
        OrderManagement,
        PaymentProvider,
        PaymentRecordManagement,
        ProviderChargeRequest,
        ProviderChargeResponse,
    },
};

/// `PaymentApi` starts payments for orders. Cash payments are recorded directly. Gateway payments are charged through
/// the [`PaymentProvider`] first, and the payment links it hands back are stored with the record.
pub struct PaymentApi<B, P> {
    db: B,
    provider: P,
    config: PaymentConfig,
}

impl<B, P> Debug for PaymentApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B, P> PaymentApi<B, P> {
    pub fn new(db: B, provider: P, config: PaymentConfig) -> Self {
        Self { db, provider, config }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }

    /// Resolves a payment method id, checking that the method is switched on.
    pub fn resolve_method(&self, method_id: i32) -> Result<PaymentMethod, OrderFlowError> {
        let method = PaymentMethod::try_from(method_id)
            .map_err(|_| OrderFlowError::UnsupportedPaymentMethod(format!("#{method_id}")))?;
        self.ensure_enabled(method)?;
        Ok(method)
    }

    fn ensure_enabled(&self, method: PaymentMethod) -> Result<(), OrderFlowError> {
        if self.config.is_enabled(method) {
            Ok(())
        } else {
            Err(OrderFlowError::UnsupportedPaymentMethod(method.to_string()))
        }
    }
}

impl<B, P> PaymentApi<B, P>
where
    B: OrderManagement + CartManagement + PaymentRecordManagement,
    P: PaymentProvider,
{
    /// The full checkout flow: the cart is converted into an order, the order is charged, and the payment record is
    /// stored.
    ///
    /// The payment method is checked before anything is written. The checkout transaction is committed before the
    /// provider is called. If the charge fails, the order stays `unpaid` without a payment record, and the payment can
    /// be retried with [`Self::pay_for_order`].
    pub async fn checkout_and_pay(
        &self,
        guest: &GuestId,
        buyer: &BuyerInfo,
        method_id: i32,
    ) -> Result<CheckoutReceipt, OrderFlowError> {
        let method = self.resolve_method(method_id)?;
        let (order, _) = checkout_cart(&self.db, guest, buyer).await?;
        let lines = self.order_lines(order.id, &[CartLineStatus::Unpaid]).await?;
        let contact = contact_for(&order);
        let record = self.initiate_charge(&order, &lines, method, contact).await?;
        let payment = PaymentDetail::try_from(&record)?;
        Ok(CheckoutReceipt { order, lines, payment })
    }

    /// Charges an order.
    ///
    /// * Cash needs no provider call. The pseudo id `<cash prefix>-<order id>-<unix time>` is used as both the provider
    ///   transaction id and the provider order id, and there is no payment action.
    /// * Gateway methods are charged under the reference `<gateway prefix>-<order id>-<unix time>`, with one item per
    ///   line. The QR code and deep link are taken from the provider's actions.
    ///
    /// The amount charged is the sum of `lines`. It is less than the order total when a vendor has cancelled part of the
    /// order before payment.
    ///
    /// A `pending` payment record is stored before returning. If the record cannot be stored after a successful charge,
    /// the error is returned and the orphaned charge is logged. It is not voided.
    pub async fn initiate_charge(
        &self,
        order: &Order,
        lines: &[CartLineDetail],
        method: PaymentMethod,
        contact: CustomerContact,
    ) -> Result<PaymentRecord, OrderFlowError> {
        self.ensure_enabled(method)?;
        let amount: Rupiah = lines.iter().map(|l| l.line.total_price).sum();
        if amount != order.total_price {
            info!("💳️ Order {} totals {}, but only {amount} is still payable", order.id, order.total_price);
        }
        let timestamp = Utc::now().timestamp();
        let (provider_transaction_id, provider_order_id, action) = match method {
            PaymentMethod::Cash => {
                let id = format!("{}-{}-{timestamp}", self.config.cash_prefix, order.id.value());
                debug!("💳️ Cash payment {id} for order {}", order.id);
                (id.clone(), id, PaymentAction::default())
            },
            method => {
                let reference = format!("{}-{}-{timestamp}", self.config.gateway_prefix, order.id.value());
                let request = charge_request(lines, amount, method, &reference, contact);
                let response = self.charge(request).await?;
                let action = extract_payment_action(method, &response)?;
                let provider_order_id = if response.order_id.is_empty() { reference } else { response.order_id };
                (response.transaction_id, provider_order_id, action)
            },
        };
        let record = NewPaymentRecord {
            order_id: order.id,
            provider_transaction_id,
            provider_order_id: provider_order_id.clone(),
            payment_method: method,
            gross_amount: amount,
            payment_data: encode_payment_action(&action)?,
        };
        match self.db.insert_payment_record(record).await {
            Ok(InsertPaymentResult::Inserted(record)) => {
                info!("💳️ {method} payment {provider_order_id} for order {} is pending", order.id);
                Ok(record)
            },
            Ok(InsertPaymentResult::AlreadyExists(record)) => {
                warn!(
                    "💳️ Order {} was paid for concurrently. Keeping {} and abandoning {provider_order_id}",
                    order.id, record.provider_order_id
                );
                Ok(record)
            },
            Err(e) => {
                error!(
                    "💳️ INCONSISTENCY: {method} charge {provider_order_id} for order {} was created, but the payment \
                     record could not be saved. {e}",
                    order.id
                );
                Err(OrderFlowError::storage("Saving payment record", provider_order_id, e))
            },
        }
    }

    /// Starts payment for an order that does not have a payment record yet, e.g. after a provider timeout. If a
    /// record already exists, it is returned as is.
    ///
    /// ## Failure modes
    /// * `NotFound` if the order does not exist.
    /// * `AuthorizationError` if the order belongs to another guest.
    /// * `ValidationError` if the order has no unpaid lines left.
    pub async fn pay_for_order(
        &self,
        guest: &GuestId,
        order_id: OrderId,
        method_id: i32,
    ) -> Result<PaymentRecord, OrderFlowError> {
        ensure_guest(guest)?;
        let order = self
            .db
            .fetch_order(order_id)
            .await
            .map_err(|e| OrderFlowError::storage("Order lookup", order_id, e))?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Order {order_id}")))?;
        if &order.guest_id != guest {
            warn!("💳️ {guest} tried to pay for order {order_id}, which belongs to {}", order.guest_id);
            return Err(OrderFlowError::AuthorizationError(format!("Order {order_id} is not yours")));
        }
        if let Some(record) = self.fetch_record(order_id).await? {
            debug!("💳️ Order {order_id} already has payment {}", record.provider_order_id);
            return Ok(record);
        }
        let method = self.resolve_method(method_id)?;
        let lines = self.order_lines(order_id, &[CartLineStatus::Unpaid]).await?;
        if lines.is_empty() {
            return Err(OrderFlowError::ValidationError(format!("Order {order_id} has nothing left to pay for")));
        }
        let contact = contact_for(&order);
        self.initiate_charge(&order, &lines, method, contact).await
    }

    /// The current payment status for an order, with the payment links decoded.
    pub async fn payment_detail(&self, order_id: OrderId) -> Result<PaymentDetail, OrderFlowError> {
        let record = self
            .fetch_record(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Payment for order {order_id}")))?;
        PaymentDetail::try_from(&record)
    }

    async fn fetch_record(&self, order_id: OrderId) -> Result<Option<PaymentRecord>, OrderFlowError> {
        self.db
            .fetch_payment_record_for_order(order_id)
            .await
            .map_err(|e| OrderFlowError::storage("Payment record lookup", order_id, e))
    }

    async fn order_lines(
        &self,
        order_id: OrderId,
        statuses: &[CartLineStatus],
    ) -> Result<Vec<CartLineDetail>, OrderFlowError> {
        let filter = CartLineQueryFilter::default().with_order_id(order_id).with_statuses(statuses);
        self.db.fetch_cart_line_details(filter).await.map_err(|e| OrderFlowError::storage("Order lines", order_id, e))
    }

    async fn charge(&self, request: ProviderChargeRequest) -> Result<ProviderChargeResponse, OrderFlowError> {
        let reference = request.provider_order_id.clone();
        let timeout = self.config.provider_timeout;
        trace!("💳️ Sending {} charge {reference} for {}", request.payment_method, request.gross_amount);
        match tokio::time::timeout(timeout, self.provider.charge(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                warn!("💳️ Charge {reference} failed. {e}");
                Err(OrderFlowError::provider("Charge", reference, e))
            },
            Err(_) => {
                warn!("💳️ Charge {reference} timed out after {}s", timeout.as_secs_f32());
                Err(OrderFlowError::GatewayError(format!(
                    "Charge {reference} timed out after {}s",
                    timeout.as_secs_f32()
                )))
            },
        }
    }
}

fn contact_for(order: &Order) -> CustomerContact {
    CustomerContact { name: order.buyer_name.clone(), email: order.email.clone() }
}

fn charge_request(
    lines: &[CartLineDetail],
    gross_amount: Rupiah,
    method: PaymentMethod,
    reference: &str,
    customer: CustomerContact,
) -> ProviderChargeRequest {
    let items = lines
        .iter()
        .map(|l| ChargeItem {
            id: l.line.id.to_string(),
            price: l.line.unit_price,
            quantity: l.line.quantity,
            name: l.menu_item_name.clone(),
        })
        .collect();
    ProviderChargeRequest {
        payment_method: method,
        provider_order_id: reference.to_string(),
        gross_amount,
        items,
        customer,
    }
}

/// Pulls the payment links out of the provider's actions. GoPay needs both the QR code and the deep link. QRIS only
/// has a QR code.
pub fn extract_payment_action(
    method: PaymentMethod,
    response: &ProviderChargeResponse,
) -> Result<PaymentAction, OrderFlowError> {
    let required = |name: &str| {
        response.action_url(name).map(str::to_string).ok_or_else(|| {
            OrderFlowError::GatewayError(format!(
                "The {method} charge {} has no '{name}' action",
                response.order_id
            ))
        })
    };
    match method {
        PaymentMethod::Cash => Ok(PaymentAction::default()),
        PaymentMethod::Gopay => Ok(PaymentAction { key: required(DEEPLINK_ACTION)?, qr: required(QR_CODE_ACTION)? }),
        PaymentMethod::Qris => Ok(PaymentAction { key: String::new(), qr: required(QR_CODE_ACTION)? }),
    }
}
