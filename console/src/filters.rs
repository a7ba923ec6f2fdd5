use chrono::NaiveDate;

use crate::events::{Event, EventSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    /// At least one date on or after today's calendar day.
    Upcoming,
    /// No date on or after today: the complement of `Upcoming`.
    Past,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFilter {
    All,
    Internal,
    External,
}

/// Calendar-day comparison in the viewer's local timezone; the time of day
/// never matters here.
pub fn is_upcoming(event: &Event, today: NaiveDate) -> bool {
    event.dates.iter().any(|d| d.date >= today)
}

fn matches_source(event: &Event, source: SourceFilter) -> bool {
    match source {
        SourceFilter::All => true,
        SourceFilter::Internal => event.added_by == EventSource::Internal,
        SourceFilter::External => event.added_by == EventSource::External,
    }
}

/// Both predicates must hold. Recomputed from scratch whenever the inputs
/// change; the lists are small enough that nothing incremental is needed.
pub fn filter_events(
    events: &[Event],
    mode: TimeMode,
    source: SourceFilter,
    today: NaiveDate,
) -> Vec<Event> {
    events
        .iter()
        .filter(|event| match mode {
            TimeMode::Upcoming => is_upcoming(event, today),
            TimeMode::Past => !is_upcoming(event, today),
        })
        .filter(|event| matches_source(event, source))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventDate, EventState};

    fn event(id: i64, days: &[&str], added_by: EventSource) -> Event {
        Event {
            id,
            name: format!("event {}", id),
            region: "Bregenz".to_string(),
            city: "Bregenz".to_string(),
            dates: days
                .iter()
                .map(|day| EventDate {
                    date: day.parse().unwrap(),
                    start_time: None,
                    end_time: None,
                })
                .collect(),
            state: EventState::Approved,
            added_by,
        }
    }

    fn today() -> NaiveDate {
        "2026-08-06".parse().unwrap()
    }

    #[test]
    fn upcoming_and_past_partition_the_set() {
        let events = vec![
            event(1, &["2026-08-06"], EventSource::External), // today counts as upcoming
            event(2, &["2026-08-05"], EventSource::External),
            event(3, &["2026-07-01", "2026-12-24"], EventSource::External),
            event(4, &[], EventSource::External),
        ];

        let upcoming = filter_events(&events, TimeMode::Upcoming, SourceFilter::All, today());
        let past = filter_events(&events, TimeMode::Past, SourceFilter::All, today());

        let upcoming_ids: Vec<i64> = upcoming.iter().map(|e| e.id).collect();
        let past_ids: Vec<i64> = past.iter().map(|e| e.id).collect();

        assert_eq!(upcoming_ids, vec![1, 3]);
        assert_eq!(past_ids, vec![2, 4]);
        assert_eq!(upcoming.len() + past.len(), events.len());
    }

    #[test]
    fn source_filter_is_anded_with_the_time_predicate() {
        let events = vec![
            event(1, &["2026-09-01"], EventSource::Internal),
            event(2, &["2026-09-01"], EventSource::External),
            event(3, &["2026-01-01"], EventSource::Internal),
        ];

        let internal_upcoming =
            filter_events(&events, TimeMode::Upcoming, SourceFilter::Internal, today());
        assert_eq!(internal_upcoming.len(), 1);
        assert_eq!(internal_upcoming[0].id, 1);

        let all_upcoming = filter_events(&events, TimeMode::Upcoming, SourceFilter::All, today());
        assert_eq!(all_upcoming.len(), 2);
    }
}
