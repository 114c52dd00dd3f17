use crate::crypto::SignatureError;
use crate::domain::pharmacy::FieldError;
use crate::domain::verification::UnknownStatus;
use crate::infra::didit::ProviderError;
use crate::storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("webhook rejected: {0}")]
    Signature(#[from] SignatureError),
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
