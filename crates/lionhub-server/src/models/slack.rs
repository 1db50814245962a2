use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Workspace identity linked to exactly one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SlackUser {
    pub id: String,
    pub member_id: Uuid,
}

impl SlackUser {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// Persisted state of a show's channel.
///
/// `briefing_ts` is the platform timestamp of the pinned briefing message and
/// stays empty until the first briefing is posted. Archived channels are kept
/// for the record and never leave that state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SlackChannel {
    pub id: String,
    pub show_id: Uuid,
    pub briefing_ts: String,
    pub archived: bool,
}

impl SlackChannel {
    pub fn new(id: impl Into<String>, show_id: Uuid) -> Self {
        Self {
            id: id.into(),
            show_id,
            briefing_ts: String::new(),
            archived: false,
        }
    }

    pub fn has_briefing(&self) -> bool {
        !self.briefing_ts.is_empty()
    }
}
