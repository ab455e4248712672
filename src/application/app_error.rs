use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The external event id was already recorded. Recoverable: callers
    /// should treat this as success, not retry.
    #[error("Duplicate event: {0}")]
    DuplicateEvent(String),

    #[error("Unknown plan tier: {0}")]
    UnknownTier(String),

    #[error("Insufficient balance: requested {requested} cents, available {available} cents")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("Provider is not eligible for instant payouts")]
    InstantPayoutIneligible,

    /// The payment processor timed out or refused the connection. Transient:
    /// safe to retry with backoff, the underlying write has not occurred.
    #[error("Payment processor unavailable: {0}")]
    ProcessorUnavailable(String),

    /// A ledger write landed partially. Fatal: the enclosing transaction is
    /// aborted and the condition is alerted, never partially committed.
    #[error("Ledger integrity violation: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a caller (or the processor redelivering a webhook) should
    /// retry after this error. Input errors and duplicates won't change with
    /// a retry; infrastructure failures might.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::ProcessorUnavailable(_) => true,
            AppError::Database(_) => true,
            AppError::Internal(_) => true,

            AppError::DuplicateEvent(_) => false,
            AppError::UnknownTier(_) => false,
            AppError::InsufficientBalance { .. } => false,
            AppError::InstantPayoutIneligible => false,
            AppError::InvalidInput(_) => false,
            AppError::NotFound => false,
            // Retrying a partial write would only repeat the violation.
            AppError::Integrity(_) => false,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::DuplicateEvent(_) => ErrorCode::DuplicateEvent,
            AppError::UnknownTier(_) => ErrorCode::UnknownTier,
            AppError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            AppError::InstantPayoutIneligible => ErrorCode::InstantPayoutIneligible,
            AppError::ProcessorUnavailable(_) => ErrorCode::ProcessorUnavailable,
            AppError::Integrity(_) => ErrorCode::IntegrityViolation,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

/// Stable machine-readable codes so the UI can distinguish "your request was
/// rejected" from "please try again" from "contact support" without string
/// matching messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DuplicateEvent,
    UnknownTier,
    InsufficientBalance,
    InstantPayoutIneligible,
    ProcessorUnavailable,
    IntegrityViolation,
    DatabaseError,
    InvalidInput,
    NotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DuplicateEvent => "DUPLICATE_EVENT",
            ErrorCode::UnknownTier => "UNKNOWN_TIER",
            ErrorCode::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorCode::InstantPayoutIneligible => "INSTANT_PAYOUT_INELIGIBLE",
            ErrorCode::ProcessorUnavailable => "PROCESSOR_UNAVAILABLE",
            ErrorCode::IntegrityViolation => "INTEGRITY_VIOLATION",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
