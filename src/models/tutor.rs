use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::review::ReviewView;

/// Upper bound the search form uses for "no maximum".
pub const PRICE_CEILING: i64 = 1_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TutorProfile {
    pub id: String,
    pub user_id: String,
    pub bio: String,
    pub university: String,
    pub major: String,
    pub price: i64,
    pub rating: f64,
    pub review_count: i64,
    pub image_url: Option<String>,
    pub education: Option<String>,
    pub locations: Option<String>,
    pub pricing_details: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A tutor user joined with the profile columns the listing pages need.
#[derive(Debug, Clone, FromRow)]
pub struct TutorRow {
    pub id: String,
    pub name: String,
    pub profile_id: Option<String>,
    pub university: Option<String>,
    pub major: Option<String>,
    pub bio: Option<String>,
    pub price: Option<i64>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub image_url: Option<String>,
    pub education: Option<String>,
    pub locations: Option<String>,
    pub pricing_details: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorCard {
    pub id: String,
    pub name: String,
    pub university: String,
    pub major: String,
    pub tags: Vec<String>,
    pub rating: f64,
    pub image_url: String,
    pub price: i64,
}

impl TutorCard {
    pub fn from_row(row: TutorRow, tags: Vec<String>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            university: row.university.unwrap_or_default(),
            major: row.major.unwrap_or_default(),
            tags,
            rating: row.rating.unwrap_or(0.0),
            image_url: row.image_url.unwrap_or_default(),
            price: row.price.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorDetail {
    pub id: String,
    pub name: String,
    pub university: String,
    pub major: String,
    pub bio: String,
    pub education: Vec<String>,
    pub tags: Vec<String>,
    pub rating: f64,
    pub review_count: i64,
    pub price: i64,
    pub image_url: String,
    pub locations: String,
    pub pricing_details: String,
    pub reviews: Vec<ReviewView>,
    pub is_liked: bool,
}

impl TutorDetail {
    pub fn from_row(row: TutorRow, tags: Vec<String>, reviews: Vec<ReviewView>, is_liked: bool) -> Self {
        let university = row.university.unwrap_or_default();
        let major = row.major.unwrap_or_default();
        let education = education_lines(row.education.as_deref(), &university, &major);
        Self {
            id: row.id,
            name: row.name,
            bio: row.bio.unwrap_or_default(),
            education,
            tags,
            rating: row.rating.unwrap_or(0.0),
            review_count: row.review_count.unwrap_or(0),
            price: row.price.unwrap_or(0),
            image_url: row.image_url.unwrap_or_default(),
            locations: row.locations.unwrap_or_default(),
            pricing_details: row.pricing_details.unwrap_or_default(),
            reviews,
            is_liked,
            university,
            major,
        }
    }
}

/// Stored education is a JSON array of lines. Profiles without one (or with a
/// malformed one) show the university and major instead.
fn education_lines(stored: Option<&str>, university: &str, major: &str) -> Vec<String> {
    stored
        .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
        .unwrap_or_else(|| vec![format!("{} {}", university, major).trim().to_string()])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Rating,
    Newest,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorSearch {
    pub q: Option<String>,
    /// Comma separated tag names; a tutor matches if it has any of them.
    pub tags: Option<String>,
    pub sort: Option<SortOrder>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

impl TutorSearch {
    pub fn query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The inclusive price window, or `None` when the filter is left at its extremes.
    pub fn price_range(&self) -> Option<(i64, i64)> {
        let min_set = self.min_price.is_some_and(|p| p > 0);
        let max_set = self.max_price.is_some_and(|p| p < PRICE_CEILING);
        if !min_set && !max_set {
            return None;
        }
        let min = self.min_price.filter(|p| *p > 0).unwrap_or(0);
        let max = self.max_price.filter(|p| *p > 0).unwrap_or(PRICE_CEILING);
        Some((min, max))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub bio: String,
    pub university: String,
    pub major: String,
    pub price: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggled {
    pub success: bool,
    pub is_liked: bool,
}
