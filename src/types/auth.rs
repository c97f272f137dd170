use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Observable state of the background poller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollerStatus {
    Idle,
    Polling {
        session_id: Uuid,
        user_code: String,
        verification_uri: String,
    },
}

/// How a poll session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollTermination {
    Granted,
    Denied(String),
    Cancelled,
}

/// What a single tick decided.
#[derive(Debug, Clone, PartialEq)]
pub enum TickDecision {
    /// Keep polling; wake again after this many seconds.
    Reschedule(u64),
    Finished(PollTermination),
}

/// Authentication state as seen by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub username: Option<String>,
}

impl AuthStatus {
    pub fn signed_out() -> Self {
        Self {
            authenticated: false,
            username: None,
        }
    }
}
