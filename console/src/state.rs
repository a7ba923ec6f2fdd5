use crate::events::EventState;
use crate::scroll::Viewport;
use crate::session::{
    clear_navigation_state, load_navigation_state, save_navigation_state, NavigationState,
    ScrollOffset, SessionStore,
};

/// Restoration of the moderation console's tab, page, and scroll offset after
/// the user navigated away and came back.
///
/// `begin` runs on mount and decides which tab/page to fetch; the scroll
/// offset is held back until `complete` is called — the component calls that
/// once its first fetch has finished (loading flipped back to false) and
/// layout has settled, so the offset lands on real content. Restoration is
/// best effort: a missing or unreadable record just means the default view.
#[derive(Debug)]
pub struct ConsoleRestore {
    pub tab: EventState,
    pub page: u32,
    /// The console always comes back showing future events; the stored record
    /// does not override this.
    pub show_future: bool,
    pending_offset: Option<ScrollOffset>,
}

impl ConsoleRestore {
    pub fn begin(store: &dyn SessionStore) -> ConsoleRestore {
        match load_navigation_state(store) {
            Some(state) => ConsoleRestore {
                tab: state.tab,
                page: state.page.max(1),
                show_future: true,
                pending_offset: Some(state.scroll),
            },
            None => ConsoleRestore {
                tab: EventState::Pending,
                page: 1,
                show_future: true,
                pending_offset: None,
            },
        }
    }

    pub fn has_pending_offset(&self) -> bool {
        self.pending_offset.is_some()
    }

    /// Applies the held-back offset and clears both the in-memory value and
    /// the stored record. Safe to call repeatedly; only the first call after
    /// a successful `begin` does anything.
    pub fn complete(&mut self, viewport: &dyn Viewport, store: &dyn SessionStore) {
        if let Some(offset) = self.pending_offset.take() {
            viewport.scroll_to(offset.x, offset.y);
            clear_navigation_state(store);
        }
    }
}

/// Records the console position before navigating away, so the next mount
/// can pick up where the user left off.
pub fn remember_console_position(
    store: &dyn SessionStore,
    viewport: &dyn Viewport,
    tab: EventState,
    page: u32,
) {
    save_navigation_state(
        store,
        &NavigationState {
            tab,
            page,
            scroll: viewport.scroll_offset(),
        },
    );
}
