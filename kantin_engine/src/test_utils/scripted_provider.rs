use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::*;

use crate::{
    db_types::PaymentMethod,
    payment_objects::{DEEPLINK_ACTION, QR_CODE_ACTION},
    traits::{
        PaymentProvider,
        ProviderAction,
        ProviderChargeRequest,
        ProviderChargeResponse,
        ProviderError,
        ProviderStatus,
    },
};

#[derive(Default)]
struct Script {
    charges: Vec<ProviderChargeRequest>,
    statuses: HashMap<String, ProviderStatus>,
    charge_failure: Option<ProviderError>,
    status_failure: Option<ProviderError>,
    delay: Option<Duration>,
    omit_actions: bool,
    status_queries: usize,
}

/// An in-memory payment provider whose behaviour is set up by the test.
///
/// Charges succeed by default, with GoPay and QRIS style actions, and register the charge as `pending`. Status
/// queries answer from whatever the test has set with [`ScriptedProvider::set_status`].
///
/// Clones share the same script, so a test can keep a handle after giving the provider to an API.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
}

impl Debug for ScriptedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScriptedProvider")
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().expect("Provider script lock poisoned");
        f(&mut script)
    }

    pub fn set_status(&self, provider_order_id: &str, transaction_status: &str, fraud_status: Option<&str>) {
        let mut status = ProviderStatus::new(provider_order_id, transaction_status);
        if let Some(fraud) = fraud_status {
            status = status.with_fraud_status(fraud);
        }
        self.with_script(|s| s.statuses.insert(provider_order_id.to_string(), status));
    }

    pub fn fail_charges_with(&self, e: ProviderError) {
        self.with_script(|s| s.charge_failure = Some(e));
    }

    pub fn fail_status_queries_with(&self, e: ProviderError) {
        self.with_script(|s| s.status_failure = Some(e));
    }

    /// Every call to the provider sleeps this long before answering.
    pub fn delay_responses(&self, delay: Duration) {
        self.with_script(|s| s.delay = Some(delay));
    }

    /// Successful charges come back without any actions.
    pub fn omit_actions(&self) {
        self.with_script(|s| s.omit_actions = true);
    }

    pub fn charges(&self) -> Vec<ProviderChargeRequest> {
        self.with_script(|s| s.charges.clone())
    }

    pub fn status_queries(&self) -> usize {
        self.with_script(|s| s.status_queries)
    }

    async fn pause(&self) {
        if let Some(delay) = self.with_script(|s| s.delay) {
            tokio::time::sleep(delay).await;
        }
    }
}

impl PaymentProvider for ScriptedProvider {
    async fn charge(&self, request: ProviderChargeRequest) -> Result<ProviderChargeResponse, ProviderError> {
        self.pause().await;
        let reference = request.provider_order_id.clone();
        let method = request.payment_method;
        let (failure, omit_actions) = self.with_script(|s| {
            s.charges.push(request);
            (s.charge_failure.clone(), s.omit_actions)
        });
        if let Some(e) = failure {
            debug!("🧪️ Scripted charge {reference} fails with {e}");
            return Err(e);
        }
        let transaction_id = format!("tx-{reference}");
        let actions = match (method, omit_actions) {
            (_, true) | (PaymentMethod::Cash, _) => vec![],
            (PaymentMethod::Gopay, _) => vec![
                ProviderAction::new(QR_CODE_ACTION.to_string(), format!("https://qr.example/{transaction_id}")),
                ProviderAction::new(DEEPLINK_ACTION.to_string(), format!("gojek://pay/{transaction_id}")),
                ProviderAction::new("get-status".to_string(), format!("https://status.example/{transaction_id}")),
            ],
            (PaymentMethod::Qris, _) => {
                vec![ProviderAction::new(QR_CODE_ACTION.to_string(), format!("https://qr.example/{transaction_id}"))]
            },
        };
        self.set_status(&reference, "pending", None);
        Ok(ProviderChargeResponse { transaction_id, order_id: reference, actions })
    }

    async fn query_status(&self, provider_order_id: &str) -> Result<ProviderStatus, ProviderError> {
        self.pause().await;
        let (failure, status) = self.with_script(|s| {
            s.status_queries += 1;
            (s.status_failure.clone(), s.statuses.get(provider_order_id).cloned())
        });
        if let Some(e) = failure {
            return Err(e);
        }
        status.ok_or_else(|| ProviderError::Rejected(format!("Transaction {provider_order_id} doesn't exist")))
    }
}
