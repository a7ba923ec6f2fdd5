use serde::{Deserialize, Serialize};

use crate::models::event_model::EventState;

/// Hard cap on a single bulk moderation action. Mirrored by the console's
/// client-side guard; the server enforces it regardless.
pub const BULK_ACTION_LIMIT: usize = 100;

/// Fixed page size for the moderation console listings.
pub const CONSOLE_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ConsolePageQuery {
    pub state: String,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetStateRequest {
    pub state: EventState,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStateRequest {
    pub event_ids: Vec<i64>,
    pub state: EventState,
}

impl BulkStateRequest {
    pub fn exceeds_limit(&self) -> bool {
        self.event_ids.len() > BULK_ACTION_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_limit_boundary() {
        let at_limit = BulkStateRequest {
            event_ids: (0..BULK_ACTION_LIMIT as i64).collect(),
            state: EventState::Approved,
        };
        assert!(!at_limit.exceeds_limit());

        let over_limit = BulkStateRequest {
            event_ids: (0..=BULK_ACTION_LIMIT as i64).collect(),
            state: EventState::Approved,
        };
        assert!(over_limit.exceeds_limit());
    }
}
