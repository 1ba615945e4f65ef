//! Review filtering.
//!
//! Raw query parameters are parsed into a [`ReviewFilter`] first, so malformed
//! input is rejected before any review is looked at. Well-formed values never
//! fail: an out-of-range rating or an inverted date range simply matches
//! nothing. All present criteria are AND-combined; results come back newest
//! first.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::errors::ReviewError;
use crate::models::{Review, ReviewType};

/// Sentinel the dashboard sends for "no filter" on select inputs.
const ALL: &str = "all";
const ANY: &str = "any";

/// Query string as sent by the dashboard. Every value is kept as text so that
/// parse failures surface as validation errors naming the parameter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub min_rating: Option<String>,
    /// Older dashboards send the rating floor as `rating`; `minRating` wins
    /// when both are present.
    pub rating: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub review_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub listing_name: Option<String>,
    pub approved: Option<String>,
}

/// Parsed filter criteria. `None` means the criterion is not applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewFilter {
    /// Minimum average category rating (inclusive).
    pub min_rating: Option<i32>,

    /// Review must carry at least one score in this category.
    pub category: Option<String>,

    pub review_type: Option<ReviewType>,

    /// Earliest submission time (inclusive).
    pub date_from: Option<NaiveDateTime>,

    /// Latest submission time (inclusive).
    pub date_to: Option<NaiveDateTime>,

    pub listing_name: Option<String>,

    pub approved: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
enum DayBound {
    Start,
    End,
}

impl ReviewQuery {
    pub fn into_filter(self) -> Result<ReviewFilter, ReviewError> {
        let raw_rating = non_empty(self.min_rating).or_else(|| non_empty(self.rating));
        let min_rating = match raw_rating.filter(|v| v != ANY) {
            Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
                ReviewError::validation(format!("minRating must be an integer, got '{raw}'"))
            })?),
            None => None,
        };

        let review_type = match non_empty(self.review_type).filter(|v| v != ALL) {
            Some(raw) => Some(raw.parse::<ReviewType>().map_err(ReviewError::Validation)?),
            None => None,
        };

        let date_from = match non_empty(self.date_from) {
            Some(raw) => Some(parse_date("dateFrom", &raw, DayBound::Start)?),
            None => None,
        };

        let date_to = match non_empty(self.date_to) {
            Some(raw) => Some(parse_date("dateTo", &raw, DayBound::End)?),
            None => None,
        };

        let approved = match non_empty(self.approved).as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                return Err(ReviewError::validation(format!(
                    "approved must be 'true' or 'false', got '{other}'"
                )))
            }
            None => None,
        };

        Ok(ReviewFilter {
            min_rating,
            category: non_empty(self.category),
            review_type,
            date_from,
            date_to,
            listing_name: non_empty(self.listing_name).filter(|v| v != ALL),
            approved,
        })
    }
}

impl ReviewFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
    /// Check a single review against all active criteria.
    pub fn matches(&self, review: &Review) -> bool {
        if let Some(min) = self.min_rating {
            if review.average_category_rating() < f64::from(min) {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if !review.has_category(category) {
                return false;
            }
        }

        if let Some(review_type) = self.review_type {
            if review.review_type != review_type {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if review.submitted_at < from {
                return false;
            }
        }

        if let Some(to) = self.date_to {
            if review.submitted_at > to {
                return false;
            }
        }

        if let Some(listing_name) = &self.listing_name {
            if &review.listing_name != listing_name {
                return false;
            }
        }

        if let Some(approved) = self.approved {
            if review.approved != approved {
                return false;
            }
        }

        true
    }
}

/// Apply `filter` and order the survivors by submission time, newest first.
/// Reviews submitted at the same instant keep their input order.
pub fn filter_reviews(reviews: &[Review], filter: &ReviewFilter) -> Vec<Review> {
    let mut matched: Vec<Review> = reviews
        .iter()
        .filter(|review| filter.matches(review))
        .cloned()
        .collect();
    matched.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    matched
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(param: &str, raw: &str, bound: DayBound) -> Result<NaiveDateTime, ReviewError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.naive_utc());
    }

    // An unencoded `+` in an offset arrives as a space after URL decoding.
    if let Some((stamp, offset)) = raw.split_once('T').and_then(|_| raw.rsplit_once(' ')) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&format!("{stamp}+{offset}")) {
            return Ok(parsed.naive_utc());
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ReviewError::validation(format!("{param} is not a valid date: '{raw}'"))
    })?;

    // A bare date covers the whole day on either side of the range.
    let datetime = match bound {
        DayBound::Start => date.and_hms_opt(0, 0, 0),
        DayBound::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
    };
    datetime.ok_or_else(|| ReviewError::validation(format!("{param} is out of range: '{raw}'")))
}
