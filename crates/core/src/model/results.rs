use serde::{Deserialize, Serialize};

use crate::model::SessionId;

/// Outcome for one question after grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_index: usize,
    pub question: String,
    pub options: Vec<String>,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Graded test as returned by the submit endpoint.
///
/// The client renders this verbatim; scoring is entirely the service's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    pub session_id: SessionId,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub results: Vec<QuestionResult>,
}
