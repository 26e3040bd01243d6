//! [`PaymentProvider`] over the Midtrans Core API.
use kantin_engine::traits::{
    PaymentProvider,
    ProviderAction,
    ProviderChargeRequest,
    ProviderChargeResponse,
    ProviderError,
    ProviderStatus,
};
use log::*;
use midtrans_tools::{
    ChargeRequest,
    ChargeResponse,
    CustomerDetails,
    ItemDetails,
    MidtransApi,
    MidtransApiError,
    MidtransConfig,
    TransactionDetails,
    TransactionStatusResponse,
};

use crate::errors::ServerError;

#[derive(Clone)]
pub struct MidtransProvider {
    api: MidtransApi,
}

impl MidtransProvider {
    pub fn new(api: MidtransApi) -> Self {
        Self { api }
    }

    pub fn try_from_config(config: MidtransConfig) -> Result<Self, ServerError> {
        info!("💳️ Using the Midtrans {} environment at {}", config.environment, config.base_url());
        let api = MidtransApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self::new(api))
    }
}

impl PaymentProvider for MidtransProvider {
    async fn charge(&self, request: ProviderChargeRequest) -> Result<ProviderChargeResponse, ProviderError> {
        let request = to_charge_request(request);
        let response = self.api.charge(&request).await.map_err(to_provider_error)?;
        Ok(from_charge_response(response))
    }

    async fn query_status(&self, provider_order_id: &str) -> Result<ProviderStatus, ProviderError> {
        let response = self.api.transaction_status(provider_order_id).await.map_err(to_provider_error)?;
        Ok(from_status_response(provider_order_id, response))
    }
}

pub fn to_charge_request(request: ProviderChargeRequest) -> ChargeRequest {
    let item_details = request
        .items
        .into_iter()
        .map(|i| ItemDetails { id: i.id, price: i.price.value(), quantity: i.quantity, name: i.name })
        .collect();
    ChargeRequest {
        payment_type: request.payment_method.as_str().to_string(),
        transaction_details: TransactionDetails {
            order_id: request.provider_order_id,
            gross_amount: request.gross_amount.value(),
        },
        item_details,
        customer_details: CustomerDetails { first_name: request.customer.name, email: request.customer.email },
    }
}

pub fn from_charge_response(response: ChargeResponse) -> ProviderChargeResponse {
    let actions = response.actions.into_iter().map(|a| ProviderAction::new(a.name, a.url)).collect();
    ProviderChargeResponse { transaction_id: response.transaction_id, order_id: response.order_id, actions }
}

pub fn from_status_response(provider_order_id: &str, response: TransactionStatusResponse) -> ProviderStatus {
    let order_id = if response.order_id.is_empty() { provider_order_id.to_string() } else { response.order_id };
    let status = ProviderStatus::new(order_id, response.transaction_status);
    match response.fraud_status {
        Some(fraud) if !fraud.is_empty() => status.with_fraud_status(fraud),
        _ => status,
    }
}

fn to_provider_error(e: MidtransApiError) -> ProviderError {
    match e {
        MidtransApiError::Initialization(s) |
        MidtransApiError::InvalidUrl(s) |
        MidtransApiError::RestResponseError(s) => ProviderError::Unreachable(s),
        MidtransApiError::QueryError { status, message } => ProviderError::Rejected(format!("HTTP {status}. {message}")),
        MidtransApiError::Rejected { status_code, message } => {
            ProviderError::Rejected(format!("Status {status_code}. {message}"))
        },
        MidtransApiError::JsonError(s) | MidtransApiError::InvalidCurrencyAmount(s) => ProviderError::InvalidResponse(s),
    }
}
