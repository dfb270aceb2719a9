//! Credential Source Port - per-user AI settings owned by the operator
//! application.

use async_trait::async_trait;

use super::reasoning_resolver::ProviderSettings;
use crate::domain::foundation::UserId;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential service unreachable: {0}")]
    Unreachable(String),

    #[error("Credential service returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Settings configured for `user`, or `None` when the user has none.
    async fn credentials_for(&self, user: UserId) -> Result<Option<ProviderSettings>, CredentialError>;
}
