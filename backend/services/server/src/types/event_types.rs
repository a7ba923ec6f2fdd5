use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::event_model::PriceType;

pub const MAX_EVENT_DATES: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDateInput {
    pub date: NaiveDate,
    #[serde(rename = "startTime", alias = "start_time", default)]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", alias = "end_time", default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEventRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub category: String,
    pub subcategory: Option<String>,
    #[validate(length(min = 10, max = 5000))]
    pub description: String,
    #[validate(length(min = 1))]
    pub region: String,
    pub subregion: Option<String>,
    #[validate(length(min = 1))]
    pub city: String,
    pub host: Option<String>,
    pub address: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub dates: Vec<EventDateInput>,
    pub image: Option<String>,
    pub price_type: PriceType,
    pub price_amount: Option<f64>,
    #[serde(default)]
    pub links: Vec<String>,
    #[validate(email)]
    pub submitter_email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub category: String,
    pub subcategory: Option<String>,
    #[validate(length(min = 10, max = 5000))]
    pub description: String,
    #[validate(length(min = 1))]
    pub region: String,
    pub subregion: Option<String>,
    #[validate(length(min = 1))]
    pub city: String,
    pub host: Option<String>,
    pub address: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub dates: Vec<EventDateInput>,
    pub image: Option<String>,
    pub price_type: PriceType,
    pub price_amount: Option<f64>,
    #[serde(default)]
    pub links: Vec<String>,
    #[validate(email)]
    pub submitter_email: String,
}

/// Field constraints plus the invariants the derive cannot express: a paid
/// event needs an amount, and every listed link must look like a URL.
fn validate_event_fields<T: Validate>(
    request: &T,
    price_type: PriceType,
    price_amount: Option<f64>,
    links: &[String],
) -> Result<(), ValidationErrors> {
    let mut errors = match request.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(e) => e,
    };

    if price_type == PriceType::Cost && price_amount.is_none() {
        errors.add("price_amount", ValidationError::new("required_for_cost"));
    }

    if links
        .iter()
        .any(|l| !(l.starts_with("http://") || l.starts_with("https://")))
    {
        errors.add("links", ValidationError::new("invalid_url"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl SubmitEventRequest {
    pub fn validate_submission(&self) -> Result<(), ValidationErrors> {
        validate_event_fields(self, self.price_type, self.price_amount, &self.links)
    }
}

impl UpdateEventRequest {
    pub fn validate_update(&self) -> Result<(), ValidationErrors> {
        validate_event_fields(self, self.price_type, self.price_amount, &self.links)
    }
}

#[derive(Debug, Deserialize)]
pub struct EventListQuery {
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl EventListQuery {
    /// Only the plain first page is worth caching; anything filtered is
    /// fetched fresh.
    pub fn is_default_listing(&self) -> bool {
        self.region.is_none()
            && self.subregion.is_none()
            && self.category.is_none()
            && self.q.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.page.unwrap_or(1) == 1
            && self.page_size.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct SimilarEventsQuery {
    pub name: String,
    pub region: String,
    pub city: String,
}
