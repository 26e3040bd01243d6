use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use kantin_engine::OrderFlowError;
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The X-Guest-Id header is missing or empty")]
    MissingGuestId,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error(transparent)]
    OrderFlow(#[from] OrderFlowError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingGuestId => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OrderFlow(e) => order_flow_status(e),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

fn order_flow_status(e: &OrderFlowError) -> StatusCode {
    match e {
        OrderFlowError::ValidationError(_) => StatusCode::BAD_REQUEST,
        OrderFlowError::EmptyCart(_) => StatusCode::BAD_REQUEST,
        OrderFlowError::UnsupportedPaymentMethod(_) => StatusCode::BAD_REQUEST,
        OrderFlowError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        OrderFlowError::AuthorizationError(_) => StatusCode::FORBIDDEN,
        OrderFlowError::NotFound(_) => StatusCode::NOT_FOUND,
        OrderFlowError::ConsistencyConflict(_) => StatusCode::CONFLICT,
        OrderFlowError::GatewayError(_) => StatusCode::BAD_GATEWAY,
        OrderFlowError::PaymentDataError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        OrderFlowError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
