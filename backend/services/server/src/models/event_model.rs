use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventState {
    Pending,
    Approved,
    Rejected,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::Pending => "pending",
            EventState::Approved => "approved",
            EventState::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<EventState> {
        match value {
            "pending" => Some(EventState::Pending),
            "approved" => Some(EventState::Approved),
            "rejected" => Some(EventState::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Free,
    Cost,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Free => "free",
            PriceType::Cost => "cost",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Internal,
    External,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Internal => "internal",
            EventSource::External => "external",
        }
    }
}

/// A single occurrence of an event: a calendar date plus optional start and
/// end times. Stored inside the row's `dates` JSONB array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDate {
    pub date: NaiveDate,
    #[serde(rename = "startTime", alias = "start_time", default)]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", alias = "end_time", default)]
    pub end_time: Option<String>,
}

/// Raw shape of an `events` row. `dates` and `links` stay untyped here; the
/// conversion to [`Event`] is the only place that interprets them.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: String,
    pub region: String,
    pub subregion: Option<String>,
    pub city: String,
    pub host: Option<String>,
    pub address: Option<String>,
    pub dates: Value,
    pub image: Option<String>,
    pub price_type: String,
    pub price_amount: Option<f64>,
    pub links: Value,
    pub state: String,
    pub added_by: String,
    pub submitter_email: Option<String>,
    pub popularity_score: i32,
    pub trust_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: String,
    pub region: String,
    pub subregion: Option<String>,
    pub city: String,
    pub host: Option<String>,
    pub address: Option<String>,
    pub dates: Vec<EventDate>,
    pub image: Option<String>,
    pub price_type: PriceType,
    pub price_amount: Option<f64>,
    pub links: Vec<String>,
    pub state: EventState,
    pub added_by: EventSource,
    pub submitter_email: Option<String>,
    pub popularity_score: i32,
    pub trust_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Converts a raw row into the domain shape. Malformed `dates` or `links`
    /// entries are dropped with a warning instead of failing the whole row;
    /// unknown enum strings fall back to the documented defaults.
    pub fn from_row(row: EventRow) -> Event {
        let dates = parse_dates(row.id, &row.dates);
        let links = parse_links(row.id, &row.links);

        let state = EventState::parse(&row.state).unwrap_or_else(|| {
            warn!("Event {} has unknown state '{}', treating as pending", row.id, row.state);
            EventState::Pending
        });

        let price_type = match row.price_type.as_str() {
            "cost" => PriceType::Cost,
            "free" => PriceType::Free,
            other => {
                warn!("Event {} has unknown price type '{}', treating as free", row.id, other);
                PriceType::Free
            }
        };

        let added_by = match row.added_by.as_str() {
            "internal" => EventSource::Internal,
            "external" => EventSource::External,
            other => {
                warn!("Event {} has unknown source '{}', treating as external", row.id, other);
                EventSource::External
            }
        };

        Event {
            id: row.id,
            name: row.name,
            category: row.category,
            subcategory: row.subcategory,
            description: row.description,
            region: row.region,
            subregion: row.subregion,
            city: row.city,
            host: row.host,
            address: row.address,
            dates,
            image: row.image,
            price_type,
            price_amount: row.price_amount,
            links,
            state,
            added_by,
            submitter_email: row.submitter_email,
            popularity_score: row.popularity_score,
            trust_score: row.trust_score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn parse_dates(event_id: i64, value: &Value) -> Vec<EventDate> {
    let entries = match value.as_array() {
        Some(entries) => entries,
        None => {
            warn!("Event {} has a non-array dates column", event_id);
            return Vec::new();
        }
    };

    let mut dates: Vec<EventDate> = entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<EventDate>(entry.clone()) {
            Ok(date) => Some(date),
            Err(e) => {
                warn!("Event {} has a malformed date entry, dropping it: {}", event_id, e);
                None
            }
        })
        .collect();

    // Display order is ascending by calendar date.
    dates.sort_by_key(|d| d.date);
    dates
}

fn parse_links(event_id: i64, value: &Value) -> Vec<String> {
    let entries = match value.as_array() {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    entries
        .iter()
        .filter_map(|entry| match entry.as_str() {
            Some(link) => Some(link.to_string()),
            None => {
                warn!("Event {} has a non-string link entry, dropping it", event_id);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row_with(dates: Value, links: Value) -> EventRow {
        EventRow {
            id: 7,
            name: "Herbstmarkt".to_string(),
            category: "Markt".to_string(),
            subcategory: None,
            description: "Regionaler Markt mit Ständen.".to_string(),
            region: "Bregenz".to_string(),
            subregion: None,
            city: "Bregenz".to_string(),
            host: None,
            address: None,
            dates,
            image: None,
            price_type: "free".to_string(),
            price_amount: None,
            links,
            state: "approved".to_string(),
            added_by: "external".to_string(),
            submitter_email: Some("host@example.com".to_string()),
            popularity_score: 0,
            trust_score: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn dates_are_sorted_and_malformed_entries_dropped() {
        let row = row_with(
            json!([
                {"date": "2026-09-20", "startTime": "10:00"},
                {"date": "not-a-date"},
                {"date": "2026-09-18"},
                42,
            ]),
            json!([]),
        );

        let event = Event::from_row(row);
        let days: Vec<String> = event.dates.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(days, vec!["2026-09-18", "2026-09-20"]);
        assert_eq!(event.dates[1].start_time.as_deref(), Some("10:00"));
    }

    #[test]
    fn snake_case_time_keys_are_accepted() {
        let row = row_with(json!([{"date": "2026-01-05", "start_time": "19:30"}]), json!([]));
        let event = Event::from_row(row);
        assert_eq!(event.dates[0].start_time.as_deref(), Some("19:30"));
    }

    #[test]
    fn non_array_dates_default_to_empty() {
        let row = row_with(json!("oops"), json!(null));
        let event = Event::from_row(row);
        assert!(event.dates.is_empty());
        assert!(event.links.is_empty());
    }

    #[test]
    fn unknown_enum_strings_fall_back_to_defaults() {
        let mut row = row_with(json!([{"date": "2026-01-05"}]), json!(["https://example.com"]));
        row.state = "weird".to_string();
        row.price_type = "donation".to_string();
        row.added_by = "robot".to_string();

        let event = Event::from_row(row);
        assert_eq!(event.state, EventState::Pending);
        assert_eq!(event.price_type, PriceType::Free);
        assert_eq!(event.added_by, EventSource::External);
        assert_eq!(event.links, vec!["https://example.com".to_string()]);
    }
}
