use std::collections::HashSet;
use std::path::Path;

use validator::Validate;

use crate::errors::ReviewError;
use crate::models::Review;

/// Local stand-in for the upstream review feed.
const EMBEDDED_FEED: &str = include_str!("../../data/mock_reviews.json");

pub fn embedded_reviews() -> Result<Vec<Review>, ReviewError> {
    parse_reviews(EMBEDDED_FEED)
}

pub async fn load_reviews(path: &Path) -> Result<Vec<Review>, ReviewError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
        ReviewError::Internal(format!(
            "Failed to read review feed '{}': {err}",
            path.display()
        ))
    })?;
    parse_reviews(&raw)
}

/// Parse a JSON array of reviews and reject records the store cannot serve.
pub fn parse_reviews(raw: &str) -> Result<Vec<Review>, ReviewError> {
    let reviews: Vec<Review> = serde_json::from_str(raw)
        .map_err(|err| ReviewError::Internal(format!("Invalid review feed: {err}")))?;

    let mut seen = HashSet::with_capacity(reviews.len());
    for review in &reviews {
        if let Err(err) = review.validate() {
            return Err(ReviewError::Internal(format!(
                "Review {} is invalid: {err}",
                review.id
            )));
        }
        if !seen.insert(review.id) {
            return Err(ReviewError::Internal(format!(
                "Duplicate review id {} in feed",
                review.id
            )));
        }
    }

    Ok(reviews)
}
