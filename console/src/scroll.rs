use std::time::Duration;

use log::debug;

use crate::retry::wait_until;
use crate::session::{
    forget_scroll_position, remember_scroll_position, saved_scroll_position, ScrollOffset,
    SessionStore,
};

/// Viewport access for the scroll logic. The browser build forwards to
/// `window`/`document`; tests use a fake with a growable content height.
pub trait Viewport {
    fn scroll_offset(&self) -> ScrollOffset;
    fn scroll_to(&self, x: f64, y: f64);
    /// Total scrollable height of the document.
    fn content_height(&self) -> f64;
    /// Height of the visible area.
    fn viewport_height(&self) -> f64;
}

pub const RESTORE_ATTEMPTS: u32 = 50;
pub const RESTORE_INTERVAL: Duration = Duration::from_millis(50);

/// Key under which a route's offset is stored: path plus query string, so
/// `/search?region=Bregenz` and `/search?region=Dornbirn` restore separately.
pub fn route_key(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

/// Records the current offset for the route being left.
pub fn save_scroll_position(store: &dyn SessionStore, viewport: &dyn Viewport, route_key: &str) {
    remember_scroll_position(store, route_key, viewport.scroll_offset());
}

/// Replays a saved offset after route entry. Waits (bounded) for the content
/// to grow tall enough to contain the target, then applies the offset — on
/// the final attempt it is applied regardless, best effort — and deletes the
/// stored entry. Returns whether an entry existed.
///
/// The caller is expected to invoke this only once the destination view has
/// rendered, mirroring the deferred callbacks the UI schedules before the
/// polling starts.
pub async fn restore_scroll_position(
    store: &dyn SessionStore,
    viewport: &dyn Viewport,
    route_key: &str,
) -> bool {
    let offset = match saved_scroll_position(store, route_key) {
        Some(offset) => offset,
        None => return false,
    };

    let tall_enough = wait_until(
        || viewport.content_height() >= offset.y + viewport.viewport_height(),
        RESTORE_ATTEMPTS,
        RESTORE_INTERVAL,
    )
    .await;

    if !tall_enough {
        debug!(
            "Content for {} never reached {}px, applying saved offset anyway",
            route_key, offset.y
        );
    }

    viewport.scroll_to(offset.x, offset.y);
    forget_scroll_position(store, route_key);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use std::sync::Mutex;

    struct FakeViewport {
        offset: Mutex<ScrollOffset>,
        content_height: Mutex<f64>,
        viewport_height: f64,
        grow_per_poll: f64,
    }

    impl FakeViewport {
        fn new(content_height: f64, viewport_height: f64) -> Self {
            Self {
                offset: Mutex::new(ScrollOffset::default()),
                content_height: Mutex::new(content_height),
                viewport_height,
                grow_per_poll: 0.0,
            }
        }

        fn growing(mut self, per_poll: f64) -> Self {
            self.grow_per_poll = per_poll;
            self
        }
    }

    impl Viewport for FakeViewport {
        fn scroll_offset(&self) -> ScrollOffset {
            *self.offset.lock().unwrap()
        }

        fn scroll_to(&self, x: f64, y: f64) {
            *self.offset.lock().unwrap() = ScrollOffset { x, y };
        }

        fn content_height(&self) -> f64 {
            let mut height = self.content_height.lock().unwrap();
            let current = *height;
            *height += self.grow_per_poll;
            current
        }

        fn viewport_height(&self) -> f64 {
            self.viewport_height
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restores_once_content_is_tall_enough_and_clears_entry() {
        let store = MemorySessionStore::new();
        let key = route_key("/search", "region=Bregenz");
        remember_scroll_position(&store, &key, ScrollOffset { x: 0.0, y: 500.0 });

        // Starts too short, grows by 100px per poll.
        let viewport = FakeViewport::new(400.0, 800.0).growing(100.0);

        let restored = restore_scroll_position(&store, &viewport, &key).await;

        assert!(restored);
        assert_eq!(viewport.scroll_offset().y, 500.0);
        assert_eq!(saved_scroll_position(&store, &key), None);
    }

    #[tokio::test(start_paused = true)]
    async fn applies_offset_anyway_when_content_stays_short() {
        let store = MemorySessionStore::new();
        let key = route_key("/search", "");
        remember_scroll_position(&store, &key, ScrollOffset { x: 0.0, y: 2000.0 });

        let viewport = FakeViewport::new(300.0, 800.0);

        let restored = restore_scroll_position(&store, &viewport, &key).await;

        assert!(restored);
        assert_eq!(viewport.scroll_offset().y, 2000.0);
        assert_eq!(saved_scroll_position(&store, &key), None);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_entry_is_a_no_op() {
        let store = MemorySessionStore::new();
        let viewport = FakeViewport::new(1000.0, 800.0);

        let restored = restore_scroll_position(&store, &viewport, "/nowhere").await;

        assert!(!restored);
        assert_eq!(viewport.scroll_offset().y, 0.0);
    }

    #[test]
    fn route_keys_include_the_query() {
        assert_eq!(route_key("/search", ""), "/search");
        assert_eq!(
            route_key("/search", "region=Bregenz"),
            "/search?region=Bregenz"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn save_records_the_current_offset() {
        let store = MemorySessionStore::new();
        let viewport = FakeViewport::new(1000.0, 800.0);
        viewport.scroll_to(0.0, 240.0);

        save_scroll_position(&store, &viewport, "/events");

        assert_eq!(
            saved_scroll_position(&store, "/events"),
            Some(ScrollOffset { x: 0.0, y: 240.0 })
        );
    }
}
