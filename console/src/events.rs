use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventState {
    #[default]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDate {
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Client-side view of an event, reduced to what the list views need.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub region: String,
    pub city: String,
    pub dates: Vec<EventDate>,
    pub state: EventState,
    pub added_by: EventSource,
}

impl Event {
    /// Tagged transformation from the wire JSON. Rows without the identifying
    /// fields are rejected (`None`); malformed date entries inside an
    /// otherwise valid row are dropped with a warning.
    pub fn from_wire(value: &Value) -> Option<Event> {
        let id = value.get("id")?.as_i64()?;
        let name = value.get("name")?.as_str()?.to_string();
        let region = value.get("region")?.as_str()?.to_string();
        let city = value.get("city")?.as_str()?.to_string();

        let dates = value
            .get("dates")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| match parse_date_entry(entry) {
                        Some(date) => Some(date),
                        None => {
                            warn!("Event {} has a malformed date entry, dropping it", id);
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let state = value
            .get("state")
            .and_then(Value::as_str)
            .and_then(EventState::parse)
            .unwrap_or_default();

        let added_by = match value.get("addedBy").and_then(Value::as_str) {
            Some("internal") => EventSource::Internal,
            _ => EventSource::External,
        };

        Some(Event {
            id,
            name,
            region,
            city,
            dates,
            state,
            added_by,
        })
    }
}

fn parse_date_entry(value: &Value) -> Option<EventDate> {
    let date = value.get("date")?.as_str()?.parse::<NaiveDate>().ok()?;
    let start_time = value
        .get("startTime")
        .or_else(|| value.get("start_time"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let end_time = value
        .get("endTime")
        .or_else(|| value.get("end_time"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(EventDate {
        date,
        start_time,
        end_time,
    })
}
