use std::collections::HashMap;
use std::sync::Mutex;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::events::EventState;

/// Session-scoped key-value persistence, injected instead of reached for
/// ambiently. The browser build backs this with `sessionStorage`; tests use
/// [`MemorySessionStore`]. Single-tab assumption throughout: no cross-tab
/// coordination.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

pub const NAVIGATION_STATE_KEY: &str = "moderationConsoleState";
pub const SCROLL_POSITIONS_KEY: &str = "scrollPositions";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// Where the moderation console was when the user navigated away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    pub tab: EventState,
    pub page: u32,
    pub scroll: ScrollOffset,
}

pub fn load_navigation_state(store: &dyn SessionStore) -> Option<NavigationState> {
    let raw = store.get(NAVIGATION_STATE_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!("Discarding unreadable navigation state: {}", e);
            None
        }
    }
}

pub fn save_navigation_state(store: &dyn SessionStore, state: &NavigationState) {
    match serde_json::to_string(state) {
        Ok(raw) => store.set(NAVIGATION_STATE_KEY, &raw),
        Err(e) => warn!("Failed to serialize navigation state: {}", e),
    }
}

pub fn clear_navigation_state(store: &dyn SessionStore) {
    store.remove(NAVIGATION_STATE_KEY);
}

fn load_scroll_map(store: &dyn SessionStore) -> HashMap<String, ScrollOffset> {
    let raw = match store.get(SCROLL_POSITIONS_KEY) {
        Some(raw) => raw,
        None => return HashMap::new(),
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            warn!("Discarding unreadable scroll positions: {}", e);
            HashMap::new()
        }
    }
}

fn save_scroll_map(store: &dyn SessionStore, map: &HashMap<String, ScrollOffset>) {
    match serde_json::to_string(map) {
        Ok(raw) => store.set(SCROLL_POSITIONS_KEY, &raw),
        Err(e) => warn!("Failed to serialize scroll positions: {}", e),
    }
}

pub fn saved_scroll_position(store: &dyn SessionStore, route_key: &str) -> Option<ScrollOffset> {
    load_scroll_map(store).get(route_key).copied()
}

pub fn remember_scroll_position(store: &dyn SessionStore, route_key: &str, offset: ScrollOffset) {
    let mut map = load_scroll_map(store);
    map.insert(route_key.to_string(), offset);
    save_scroll_map(store, &map);
}

pub fn forget_scroll_position(store: &dyn SessionStore, route_key: &str) {
    let mut map = load_scroll_map(store);
    if map.remove(route_key).is_some() {
        save_scroll_map(store, &map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_state_round_trips() {
        let store = MemorySessionStore::new();
        let state = NavigationState {
            tab: EventState::Approved,
            page: 3,
            scroll: ScrollOffset { x: 0.0, y: 512.0 },
        };

        save_navigation_state(&store, &state);
        assert_eq!(load_navigation_state(&store), Some(state));

        clear_navigation_state(&store);
        assert_eq!(load_navigation_state(&store), None);
    }

    #[test]
    fn corrupt_navigation_state_reads_as_absent() {
        let store = MemorySessionStore::new();
        store.set(NAVIGATION_STATE_KEY, "{not json");
        assert_eq!(load_navigation_state(&store), None);
    }

    #[test]
    fn scroll_positions_are_keyed_by_route() {
        let store = MemorySessionStore::new();
        let key = "/search?region=Bregenz";

        remember_scroll_position(&store, key, ScrollOffset { x: 0.0, y: 500.0 });
        remember_scroll_position(&store, "/other", ScrollOffset { x: 0.0, y: 10.0 });

        assert_eq!(
            saved_scroll_position(&store, key),
            Some(ScrollOffset { x: 0.0, y: 500.0 })
        );

        forget_scroll_position(&store, key);
        assert_eq!(saved_scroll_position(&store, key), None);
        assert!(saved_scroll_position(&store, "/other").is_some());
    }
}
