use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("history store failure: {0}")]
    HistoryStore(String),
}

impl ApplicationError {
    /// Stable snake_case class reported to operators alongside the message.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidInput(_)) => "invalid_input",
            Self::Domain(DomainError::InvariantViolation(_)) => "invariant_violation",
            Self::HistoryStore(_) => "history_store",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) => "The request could not be processed. Check inputs and try again.",
            Self::HistoryStore(_) => {
                "Recommendation history is temporarily unavailable. Please retry shortly."
            }
        }
    }
}
