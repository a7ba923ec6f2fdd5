use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::error;
use thiserror::Error;

use crate::events::Event;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("similarity lookup failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait SimilarityLookup: Send + Sync {
    async fn search_similar(
        &self,
        name: &str,
        region: &str,
        city: &str,
    ) -> Result<Vec<Event>, LookupError>;
}

pub const DUPLICATE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Warns submitters about events that already exist. Every input change calls
/// [`DuplicateDetector::input_changed`]; the lookup only fires once the input
/// has been stable for the debounce window AND name, region, and city are all
/// non-blank. Anything else — a blank field, a superseded timer, a failed
/// lookup — leaves or resets the result list empty. Lookup errors never reach
/// the caller; they are logged and swallowed by design of the original flow.
pub struct DuplicateDetector<L: SimilarityLookup> {
    lookup: Arc<L>,
    generation: Arc<AtomicU64>,
    results: Arc<Mutex<Vec<Event>>>,
    debounce: Duration,
}

impl<L: SimilarityLookup> Clone for DuplicateDetector<L> {
    fn clone(&self) -> Self {
        Self {
            lookup: Arc::clone(&self.lookup),
            generation: Arc::clone(&self.generation),
            results: Arc::clone(&self.results),
            debounce: self.debounce,
        }
    }
}

impl<L: SimilarityLookup> DuplicateDetector<L> {
    pub fn new(lookup: L) -> Self {
        Self::with_debounce(lookup, DUPLICATE_DEBOUNCE)
    }

    pub fn with_debounce(lookup: L, debounce: Duration) -> Self {
        Self {
            lookup: Arc::new(lookup),
            generation: Arc::new(AtomicU64::new(0)),
            results: Arc::new(Mutex::new(Vec::new())),
            debounce,
        }
    }

    pub async fn input_changed(&self, name: &str, region: &str, city: &str) {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.debounce).await;

        // A newer input arrived while we were waiting; that timer wins.
        if self.generation.load(Ordering::SeqCst) != my_generation {
            return;
        }

        if name.trim().is_empty() || region.trim().is_empty() || city.trim().is_empty() {
            self.results.lock().unwrap().clear();
            return;
        }

        match self
            .lookup
            .search_similar(name.trim(), region.trim(), city.trim())
            .await
        {
            Ok(events) => {
                *self.results.lock().unwrap() = events;
            }
            Err(e) => {
                error!("Duplicate lookup failed: {}", e);
                self.results.lock().unwrap().clear();
            }
        }
    }

    pub fn similar_events(&self) -> Vec<Event> {
        self.results.lock().unwrap().clone()
    }

    pub fn has_similar_events(&self) -> bool {
        !self.results.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventSource, EventState};
    use std::sync::atomic::AtomicUsize;

    struct FakeLookup {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeLookup {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl SimilarityLookup for FakeLookup {
        async fn search_similar(
            &self,
            name: &str,
            _region: &str,
            _city: &str,
        ) -> Result<Vec<Event>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LookupError::Failed("backend down".to_string()));
            }
            Ok(vec![Event {
                id: 1,
                name: name.to_string(),
                region: "Bregenz".to_string(),
                city: "Bregenz".to_string(),
                dates: Vec::new(),
                state: EventState::Pending,
                added_by: EventSource::External,
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_only_when_all_three_fields_are_filled() {
        let detector = DuplicateDetector::new(FakeLookup::new());

        detector.input_changed("Sommerfest", "Bregenz", "").await;
        assert_eq!(detector.lookup.calls.load(Ordering::SeqCst), 0);
        assert!(!detector.has_similar_events());

        detector.input_changed("Sommerfest", "Bregenz", "Hard").await;
        assert_eq!(detector.lookup.calls.load(Ordering::SeqCst), 1);
        assert!(detector.has_similar_events());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_only_whitespace_counts_as_blank() {
        let detector = DuplicateDetector::new(FakeLookup::new());

        detector.input_changed("Sommerfest", "   ", "Hard").await;
        assert_eq!(detector.lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_a_field_clears_previous_results() {
        let detector = DuplicateDetector::new(FakeLookup::new());

        detector.input_changed("Sommerfest", "Bregenz", "Hard").await;
        assert!(detector.has_similar_events());

        detector.input_changed("Sommerfest", "", "Hard").await;
        assert!(!detector.has_similar_events());
        assert_eq!(detector.lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_timers_never_search() {
        let detector = DuplicateDetector::new(FakeLookup::new());

        let first = {
            let detector = detector.clone();
            tokio::spawn(async move {
                detector.input_changed("Som", "Bregenz", "Hard").await;
            })
        };
        tokio::task::yield_now().await;

        // The second change lands before the first debounce window closes.
        detector.input_changed("Sommerfest", "Bregenz", "Hard").await;
        first.await.unwrap();

        assert_eq!(detector.lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(detector.similar_events()[0].name, "Sommerfest");
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_errors_degrade_to_empty_results() {
        let detector = DuplicateDetector::new(FakeLookup::failing());

        detector.input_changed("Sommerfest", "Bregenz", "Hard").await;

        assert_eq!(detector.lookup.calls.load(Ordering::SeqCst), 1);
        assert!(!detector.has_similar_events());
        assert!(detector.similar_events().is_empty());
    }
}
