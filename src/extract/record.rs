//! Output record types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One restaurant detail page, as written to the record file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    #[serde(default)]
    pub editorial_overview: EditorialOverview,

    /// Label to value rows of the restaurant information table
    #[serde(default)]
    pub restaurant_information: BTreeMap<String, String>,

    #[serde(default)]
    pub review_count: Option<u32>,

    #[serde(default)]
    pub review_rating: ReviewRating,

    #[serde(default)]
    pub menu: Vec<MenuSection>,

    /// Absolute image URLs
    #[serde(default)]
    pub photos: Vec<String>,

    pub url: String,
}

impl RestaurantRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorialOverview {
    pub headline: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRating {
    /// Category title to score, e.g. "Dinner" -> 3.58
    #[serde(default)]
    pub average_ratings: BTreeMap<String, f64>,

    #[serde(default)]
    pub rating_distribution: Vec<RatingBucket>,

    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// Share of reviewers in one score band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBucket {
    /// Band label such as "5.0" or "4.5 - 4.9"
    pub range: String,
    pub percentage: u32,
    pub people: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub author: Option<String>,
    pub rating: Option<f64>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSection {
    pub title: Option<String>,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: Option<String>,
}
