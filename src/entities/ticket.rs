use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side-channel support ticket. Opening one never touches trip state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IssueTicket {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub description: String,
    pub opened_at: DateTime<Utc>,
}
