use crate::domain::error::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("fetch failed: {0}")]
    FetchFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("{message}")]
    MutationFailed {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("no delete awaiting confirmation")]
    NoPendingDelete,

    #[error("controller has been deactivated")]
    Deactivated,
}
