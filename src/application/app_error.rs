use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("No account is mapped to provider customer {0}")]
    UnresolvedAccount(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Customer state for {0} is still missing after a resync")]
    SyncIncomplete(String),

    #[error("Webhook authentication failed: {0}")]
    Authentication(String),

    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    UnresolvedAccount,
    PersistenceError,
    SerializationError,
    SyncIncomplete,
    AuthenticationFailed,
    UnsupportedEvent,
    MalformedEvent,
    ProviderUnavailable,
    CacheError,
    InvalidInput,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::UnresolvedAccount => "UNRESOLVED_ACCOUNT",
            ErrorCode::PersistenceError => "PERSISTENCE_ERROR",
            ErrorCode::SerializationError => "SERIALIZATION_ERROR",
            ErrorCode::SyncIncomplete => "SYNC_INCOMPLETE",
            ErrorCode::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ErrorCode::UnsupportedEvent => "UNSUPPORTED_EVENT",
            ErrorCode::MalformedEvent => "MALFORMED_EVENT",
            ErrorCode::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound => ErrorCode::NotFound,
            AppError::UnresolvedAccount(_) => ErrorCode::UnresolvedAccount,
            AppError::Persistence(_) => ErrorCode::PersistenceError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::SyncIncomplete(_) => ErrorCode::SyncIncomplete,
            AppError::Authentication(_) => ErrorCode::AuthenticationFailed,
            AppError::UnsupportedEvent(_) => ErrorCode::UnsupportedEvent,
            AppError::MalformedEvent(_) => ErrorCode::MalformedEvent,
            AppError::Provider(_) => ErrorCode::ProviderUnavailable,
            AppError::Cache(_) => ErrorCode::CacheError,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// True for rejections of an inbound webhook (the event is dropped, not processed).
    pub fn is_webhook_rejection(&self) -> bool {
        matches!(
            self,
            AppError::Authentication(_) | AppError::UnsupportedEvent(_) | AppError::MalformedEvent(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
