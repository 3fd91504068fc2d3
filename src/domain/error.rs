#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("unknown field '{name}' for {resource}")]
    UnknownField {
        resource: &'static str,
        name: String,
    },

    #[error("{field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}
