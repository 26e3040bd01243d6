use crate::traits::{ProviderChargeRequest, ProviderChargeResponse, ProviderError, ProviderStatus};

/// The external payment gateway.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    async fn charge(&self, request: ProviderChargeRequest) -> Result<ProviderChargeResponse, ProviderError>;

    async fn query_status(&self, provider_order_id: &str) -> Result<ProviderStatus, ProviderError>;
}
