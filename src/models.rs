use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// ENUMS
// ============================================================================

/// Direction of a review
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewType {
    GuestToHost,
    HostToGuest,
}

impl FromStr for ReviewType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "guest-to-host" => Ok(ReviewType::GuestToHost),
            "host-to-guest" => Ok(ReviewType::HostToGuest),
            other => Err(format!(
                "unknown review type '{other}', expected 'guest-to-host' or 'host-to-guest'"
            )),
        }
    }
}

// ============================================================================
// REVIEWS
// ============================================================================

/// One named sub-rating on a 0-10 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ReviewCategoryScore {
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(range(min = 0, max = 10))]
    pub rating: i32,
}

/// Review record as delivered by the upstream feed.
///
/// `approved` is the only field that changes after seeding; the store
/// overrides it from its approval map on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    #[serde(rename = "type")]
    pub review_type: ReviewType,
    pub status: String,
    pub rating: Option<f64>,
    pub public_review: String,
    #[validate(nested)]
    pub review_category: Vec<ReviewCategoryScore>,
    #[serde(with = "submitted_at_format")]
    pub submitted_at: NaiveDateTime,
    pub guest_name: String,
    #[validate(length(min = 1))]
    pub listing_name: String,
    #[serde(default)]
    pub approved: bool,
}

impl Review {
    /// Mean of the category scores, `0.0` when the review has none.
    pub fn average_category_rating(&self) -> f64 {
        if self.review_category.is_empty() {
            return 0.0;
        }
        let sum: i32 = self.review_category.iter().map(|score| score.rating).sum();
        f64::from(sum) / self.review_category.len() as f64
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.review_category
            .iter()
            .any(|score| score.category == category)
    }
}

/// Upstream timestamps look like `2023-11-15 14:30:22`.
pub mod submitted_at_format {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// ANALYTICS
// ============================================================================

/// Per-listing rollup shown on the dashboard cards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPerformance {
    pub listing_name: String,
    pub average_rating: f64,
    pub total_reviews: usize,
    pub approved_reviews: usize,
    pub category_averages: BTreeMap<String, f64>,
}

/// Category that keeps collecting negative scores
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub category: String,
    pub count: usize,
    pub average_rating: f64,
}

/// Aggregated counters for the dashboard header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_reviews: usize,
    pub approved_reviews: usize,
    pub pending_reviews: usize,
    pub properties: usize,
}

/// Public page for one listing: approved reviews only
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyReviews {
    pub listing_name: String,
    pub overall_rating: f64,
    pub star_rating: u8,
    pub total_reviews: usize,
    pub category_averages: BTreeMap<String, f64>,
    pub reviews: Vec<Review>,
}

// ============================================================================
// REQUEST/RESPONSE DTOs
// ============================================================================

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

/// Filtered review listing
#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<Review>,
    pub total: usize,
}

/// Approval toggle sent by the dashboard
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub review_id: i64,
    pub approved: bool,
}
