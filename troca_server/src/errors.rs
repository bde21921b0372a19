use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use stripe_tools::StripeApiError;
use thiserror::Error;
use troca_engine::{CatalogApiError, ChatApiError, NegotiationError, UserApiError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Payment gateway error. {0}")]
    PaymentGatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::PaymentGatewayError(_) => StatusCode::BAD_REQUEST,
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
    #[error("An access token is required, but none was provided.")]
    MissingToken,
    #[error("Email or password is incorrect.")]
    InvalidCredentials,
    #[error("A user with this email address already exists.")]
    EmailTaken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
}

impl From<UserApiError> for ServerError {
    fn from(e: UserApiError) -> Self {
        match e {
            UserApiError::EmailAlreadyExists => Self::AuthenticationError(AuthError::EmailTaken),
            UserApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            UserApiError::PasswordHash(e) => Self::BackendError(format!("Password processing error: {e}")),
            UserApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::CategoryNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<ChatApiError> for ServerError {
    fn from(e: ChatApiError) -> Self {
        match e {
            ChatApiError::ChatNotFound => Self::NoRecordFound(e.to_string()),
            ChatApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            ChatApiError::InvalidParticipants => Self::InvalidRequestBody(e.to_string()),
            ChatApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<NegotiationError> for ServerError {
    fn from(e: NegotiationError) -> Self {
        match e {
            NegotiationError::OfferNotFound |
            NegotiationError::ChatNotFound |
            NegotiationError::ProductNotFound(_) |
            NegotiationError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            NegotiationError::InvalidAmount(_) |
            NegotiationError::SelfOffer |
            NegotiationError::RecipientNotFound |
            NegotiationError::PendingOfferExists => Self::InvalidRequestBody(e.to_string()),
            NegotiationError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<StripeApiError> for ServerError {
    fn from(e: StripeApiError) -> Self {
        Self::PaymentGatewayError(e.to_string())
    }
}
