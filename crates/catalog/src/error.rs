//! Catalog layer errors.

use thiserror::Error;

use bombeiro_backend::BackendError;
use bombeiro_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Domain-level refusal: validation failure or missing privilege.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backend boundary failed.
    #[error(transparent)]
    Backend(BackendError),

    /// The requested row does not exist.
    #[error("not found")]
    NotFound,

    /// A row came back in a shape this client could not decode.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<BackendError> for CatalogError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound => CatalogError::NotFound,
            other => CatalogError::Backend(other),
        }
    }
}

impl CatalogError {
    pub fn unauthorized() -> Self {
        CatalogError::Domain(DomainError::Unauthorized)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CatalogError::Domain(DomainError::Unauthorized))
    }
}
