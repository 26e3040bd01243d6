use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    Url,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::MidtransConfig,
    data_objects::is_success_code,
    ChargeRequest,
    ChargeResponse,
    MidtransApiError,
    TransactionStatusResponse,
};

#[derive(Clone)]
pub struct MidtransApi {
    config: MidtransConfig,
    client: Arc<Client>,
}

impl MidtransApi {
    pub fn new(config: MidtransConfig) -> Result<Self, MidtransApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let credentials = base64::encode(format!("{}:", config.server_key.reveal()));
        let val = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MidtransConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<B>,
    ) -> Result<T, MidtransApiError> {
        let url = self.url(segments)?;
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| MidtransApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MidtransApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MidtransApiError::RestResponseError(e.to_string()))?;
            Err(MidtransApiError::QueryError { status, message })
        }
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded, so an order id can never change the path.
    pub fn url(&self, segments: &[&str]) -> Result<Url, MidtransApiError> {
        let base = self.config.base_url();
        let mut url = Url::parse(base).map_err(|e| MidtransApiError::InvalidUrl(format!("{base}. {e}")))?;
        url.path_segments_mut()
            .map_err(|_| MidtransApiError::InvalidUrl(format!("{base} cannot be a base URL")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Creates a charge. Midtrans reports most failures with an HTTP 200 and a non-2xx `status_code` in the body, so
    /// both are checked.
    pub async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResponse, MidtransApiError> {
        let order_id = &request.transaction_details.order_id;
        debug!("Creating {} charge for {order_id}", request.payment_type);
        let response = self.rest_query::<ChargeResponse, _>(Method::POST, &["v2", "charge"], Some(request)).await?;
        if !is_success_code(&response.status_code) {
            warn!("Charge for {order_id} rejected. {} {}", response.status_code, response.status_message);
            return Err(MidtransApiError::Rejected {
                status_code: response.status_code,
                message: response.status_message,
            });
        }
        info!("Charge created for {order_id}. Midtrans transaction id: {}", response.transaction_id);
        Ok(response)
    }

    pub async fn transaction_status(&self, order_id: &str) -> Result<TransactionStatusResponse, MidtransApiError> {
        debug!("Fetching transaction status for {order_id}");
        let segments = ["v2", order_id, "status"];
        let response = self.rest_query::<TransactionStatusResponse, ()>(Method::GET, &segments, None).await?;
        if !is_success_code(&response.status_code) {
            return Err(MidtransApiError::Rejected {
                status_code: response.status_code,
                message: response.status_message,
            });
        }
        Ok(response)
    }
}
