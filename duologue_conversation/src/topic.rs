//! Topic log entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One recorded conversation topic. Appended to the manager's log when an
/// exchange is initiated; never mutated or removed afterwards. The
/// participant names are captured at record time and are not required to
/// reference currently registered agents.
#[derive(Debug, Clone, Serialize)]
pub struct TopicRecord {
    pub initiator: String,
    pub recipient: String,
    pub topic: String,
    pub timestamp: DateTime<Utc>,
}

impl TopicRecord {
    #[must_use]
    pub fn new(initiator: &str, recipient: &str, topic: &str) -> Self {
        Self {
            initiator: initiator.to_string(),
            recipient: recipient.to_string(),
            topic: topic.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Whether `agent_name` took part in this exchange on either side.
    #[must_use]
    pub fn involves(&self, agent_name: &str) -> bool {
        self.initiator == agent_name || self.recipient == agent_name
    }
}
