use serde::{Deserialize, Serialize};

use crate::model::{SessionId, TestConfig};

/// Snapshot of a session as reported by the test-summary endpoint.
///
/// Read once at session start; `submitted` gates whether the runner may
/// proceed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub num_questions: usize,
    #[serde(default)]
    pub num_answered: usize,
    pub submitted: bool,
    pub config: TestConfig,
}
