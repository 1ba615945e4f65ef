pub mod seed;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tokio::sync::RwLock;

use crate::errors::ReviewError;
use crate::models::Review;

/// In-memory review store.
///
/// Seed reviews are immutable; approval state lives in a separate map keyed by
/// review id and is merged into every read. Built once at startup and shared
/// with the handlers through `web::Data`.
pub struct ReviewStore {
    reviews: Vec<Review>,
    approvals: RwLock<HashMap<i64, bool>>,
}

impl ReviewStore {
    pub fn new(reviews: Vec<Review>) -> Self {
        let approvals = reviews
            .iter()
            .map(|review| (review.id, review.approved))
            .collect();

        Self {
            reviews,
            approvals: RwLock::new(approvals),
        }
    }

    /// Store backed by the embedded mock feed
    pub fn seeded() -> Result<Self, ReviewError> {
        Ok(Self::new(seed::embedded_reviews()?))
    }

    pub async fn from_file(path: &Path) -> Result<Self, ReviewError> {
        let reviews = seed::load_reviews(path).await?;
        log::info!(
            "Loaded {} reviews from {}",
            reviews.len(),
            path.display()
        );
        Ok(Self::new(reviews))
    }

    /// All reviews with their current approval flag.
    pub async fn list(&self) -> Vec<Review> {
        let approvals = self.approvals.read().await;
        self.reviews
            .iter()
            .map(|review| Self::materialize(review, &approvals))
            .collect()
    }

    pub async fn get(&self, review_id: i64) -> Option<Review> {
        let approvals = self.approvals.read().await;
        self.reviews
            .iter()
            .find(|review| review.id == review_id)
            .map(|review| Self::materialize(review, &approvals))
    }

    /// Set the approval flag of a seeded review.
    ///
    /// Unknown ids are rejected without touching the approval map.
    pub async fn set_approval(&self, review_id: i64, approved: bool) -> Result<(), ReviewError> {
        if !self.contains(review_id) {
            return Err(ReviewError::NotFound(review_id));
        }

        self.approvals.write().await.insert(review_id, approved);
        log::info!("Review {review_id} approval set to {approved}");
        Ok(())
    }

    /// Distinct listing names in first-seen order.
    pub fn list_properties(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.reviews
            .iter()
            .filter(|review| seen.insert(review.listing_name.as_str()))
            .map(|review| review.listing_name.clone())
            .collect()
    }

    pub fn contains(&self, review_id: i64) -> bool {
        self.reviews.iter().any(|review| review.id == review_id)
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    fn materialize(review: &Review, approvals: &HashMap<i64, bool>) -> Review {
        Review {
            approved: approvals.get(&review.id).copied().unwrap_or(false),
            ..review.clone()
        }
    }
}
