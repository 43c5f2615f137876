use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use kekspay_engine::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Unsupported(String),
    #[error("KEKS Pay is not available right now.")]
    ServiceUnavailable,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::UnknownAction(_) => StatusCode::BAD_REQUEST,
            Self::Unsupported(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::InvalidNonce => StatusCode::FORBIDDEN,
                AuthError::MissingApiKey => StatusCode::UNAUTHORIZED,
                AuthError::InvalidApiKey => StatusCode::UNAUTHORIZED,
                AuthError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
                AuthError::ForeignTerminal(_) => StatusCode::FORBIDDEN,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("The request token is invalid or has expired. Reload the page and try again.")]
    InvalidNonce,
    #[error("No API key was provided.")]
    MissingApiKey,
    #[error("The API key is not valid.")]
    InvalidApiKey,
    #[error("The notification could not be authenticated. {0}")]
    InvalidSignature(String),
    #[error("Requests from this address are not accepted.")]
    ForbiddenPeer,
    #[error("The notification was issued for a different terminal ({0}).")]
    ForeignTerminal(String),
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            GatewayError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} does not exist")),
            GatewayError::InvalidSignature(e) => Self::AuthenticationError(AuthError::InvalidSignature(e.to_string())),
            GatewayError::InvalidPayload(e) => Self::InvalidRequestBody(e),
            GatewayError::TerminalMismatch(tid) => Self::AuthenticationError(AuthError::ForeignTerminal(tid)),
            GatewayError::GatewayUnavailable => Self::ServiceUnavailable,
            e @ GatewayError::UnsupportedCurrency(_) => Self::Unsupported(e.to_string()),
            GatewayError::LinkError(e) => Self::BackendError(e.to_string()),
        }
    }
}
