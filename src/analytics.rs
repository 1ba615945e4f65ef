//! Dashboard analytics computed from a review list on every request.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::filters::{filter_reviews, ReviewFilter};
use crate::models::{DashboardStats, PropertyPerformance, PropertyReviews, Review, TrendAnalysis};

/// Category scores at or below this value count as negative.
pub const NEGATIVE_RATING_THRESHOLD: i32 = 6;

/// Number of negative categories reported by [`negative_trends`].
pub const MAX_TRENDS: usize = 3;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    sum: i64,
    count: usize,
}

impl Tally {
    fn add(&mut self, rating: i32) {
        self.sum += i64::from(rating);
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

/// Round to one decimal place, halves away from zero.
pub fn round_to_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Convert a 0-10 rating to a 0-5 star count.
pub fn star_rating(rating: f64) -> u8 {
    (rating / 2.0).round().clamp(0.0, 5.0) as u8
}

/// Per-listing rollup in first-seen listing order.
///
/// `average_rating` is the flat mean of every category score in the group, not
/// a mean of per-review averages.
pub fn property_performance(reviews: &[Review]) -> Vec<PropertyPerformance> {
    group_by_listing(reviews)
        .into_iter()
        .map(|(listing_name, group)| {
            let mut overall = Tally::default();
            let mut categories: BTreeMap<String, Tally> = BTreeMap::new();

            for score in group.iter().flat_map(|review| &review.review_category) {
                overall.add(score.rating);
                categories
                    .entry(score.category.clone())
                    .or_default()
                    .add(score.rating);
            }

            PropertyPerformance {
                listing_name: listing_name.to_string(),
                average_rating: round_to_one_decimal(overall.mean()),
                total_reviews: group.len(),
                approved_reviews: group.iter().filter(|review| review.approved).count(),
                category_averages: categories
                    .into_iter()
                    .map(|(category, tally)| (category, tally.mean()))
                    .collect(),
            }
        })
        .collect()
}

/// Categories with the most negative scores, at most [`MAX_TRENDS`] of them.
///
/// Only the negative scores feed the count and the average. Equal counts keep
/// the order in which the category first showed a negative score.
pub fn negative_trends(reviews: &[Review]) -> Vec<TrendAnalysis> {
    let mut order: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, Tally> = HashMap::new();

    for score in reviews.iter().flat_map(|review| &review.review_category) {
        if score.rating > NEGATIVE_RATING_THRESHOLD {
            continue;
        }
        let category = score.category.as_str();
        tallies
            .entry(category)
            .or_insert_with(|| {
                order.push(category);
                Tally::default()
            })
            .add(score.rating);
    }

    let mut trends: Vec<TrendAnalysis> = order
        .into_iter()
        .map(|category| {
            let tally = tallies[category];
            TrendAnalysis {
                category: category.to_string(),
                count: tally.count,
                average_rating: tally.mean(),
            }
        })
        .collect();

    trends.sort_by(|a, b| b.count.cmp(&a.count));
    trends.truncate(MAX_TRENDS);
    trends
}

pub fn dashboard_stats(reviews: &[Review]) -> DashboardStats {
    let approved_reviews = reviews.iter().filter(|review| review.approved).count();
    let properties = reviews
        .iter()
        .map(|review| review.listing_name.as_str())
        .collect::<HashSet<_>>()
        .len();

    DashboardStats {
        total_reviews: reviews.len(),
        approved_reviews,
        pending_reviews: reviews.len() - approved_reviews,
        properties,
    }
}

/// Public view of one listing: approved reviews only, newest first.
pub fn property_reviews(reviews: &[Review], listing_name: &str) -> PropertyReviews {
    let visible = filter_reviews(
        reviews,
        &ReviewFilter {
            listing_name: Some(listing_name.to_string()),
            approved: Some(true),
            ..Default::default()
        },
    );

    let overall_rating = if visible.is_empty() {
        0.0
    } else {
        visible
            .iter()
            .map(Review::average_category_rating)
            .sum::<f64>()
            / visible.len() as f64
    };

    let mut categories: BTreeMap<String, Tally> = BTreeMap::new();
    for score in visible.iter().flat_map(|review| &review.review_category) {
        categories
            .entry(score.category.clone())
            .or_default()
            .add(score.rating);
    }

    PropertyReviews {
        listing_name: listing_name.to_string(),
        overall_rating,
        star_rating: star_rating(overall_rating),
        total_reviews: visible.len(),
        category_averages: categories
            .into_iter()
            .map(|(category, tally)| (category, tally.mean()))
            .collect(),
        reviews: visible,
    }
}

fn group_by_listing(reviews: &[Review]) -> Vec<(&str, Vec<&Review>)> {
    let mut groups: Vec<(&str, Vec<&Review>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for review in reviews {
        let name = review.listing_name.as_str();
        let slot = *index.entry(name).or_insert_with(|| {
            groups.push((name, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(review);
    }

    groups
}
