use thiserror::Error;

/// Errors raised while serving review requests.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Malformed filter parameter or request body.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Approval update for an id that is not part of the review set.
    #[error("Review {0} not found")]
    NotFound(i64),

    #[error("Listing '{0}' not found")]
    ListingNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReviewError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
