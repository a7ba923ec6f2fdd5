use std::time::{Duration, Instant};

pub const SENTINEL_COOLDOWN: Duration = Duration::from_secs(1);

/// Guard around the infinite-scroll sentinel. The intersection observer can
/// report the sentinel repeatedly while a page is still loading or before the
/// observer resets; this keeps one trigger per second at most, and none while
/// a fetch is in flight.
#[derive(Debug, Default)]
pub struct ScrollSentinel {
    loading: bool,
    cooldown_until: Option<Instant>,
}

impl ScrollSentinel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Call on every sentinel intersection; `true` means fetch the next page.
    pub fn should_fetch(&mut self, now: Instant) -> bool {
        if self.loading {
            return false;
        }
        if let Some(until) = self.cooldown_until {
            if now < until {
                return false;
            }
        }
        self.cooldown_until = Some(now + SENTINEL_COOLDOWN);
        true
    }
}
