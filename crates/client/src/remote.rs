use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use exam_core::model::{Question, SessionId, SessionSummary, TestConfig, TestResults};

/// Errors surfaced by exam service adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("session not found or expired")]
    NotFound,

    #[error("{detail}")]
    Rejected { detail: String },

    #[error("service returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("invalid base url: {0}")]
    BaseUrl(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Response to a successful create-session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub session_id: SessionId,
    pub num_questions: usize,
}

/// One question as fetched by index, together with any answer already
/// saved for it server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedQuestion {
    pub index: usize,
    pub total_questions: usize,
    pub question: Question,
    pub user_answer: Option<String>,
}

/// Contract of the remote exam service.
///
/// The service owns test generation, answer persistence, and scoring. The
/// client consumes these six operations and nothing else. Save-answer takes
/// the option TEXT, never a letter.
#[async_trait]
pub trait ExamApi: Send + Sync {
    /// Generate a test for the given config and open a session for it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the service refuses the config.
    async fn create_session(&self, config: &TestConfig) -> Result<CreatedSession, ApiError>;

    /// Fetch the dropdown contents for the configuration form.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or service failures.
    async fn config_options(&self) -> Result<exam_core::model::ConfigOptions, ApiError>;

    /// Fetch the summary for an existing session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for missing or expired sessions.
    async fn session_summary(&self, id: &SessionId) -> Result<SessionSummary, ApiError>;

    /// Fetch one question by index.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for missing sessions and
    /// `ApiError::Rejected` for out-of-range indices.
    async fn question(&self, id: &SessionId, index: usize) -> Result<FetchedQuestion, ApiError>;

    /// Persist the answer text for one question.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the session is already submitted or
    /// the answer does not match an option.
    async fn save_answer(&self, id: &SessionId, index: usize, answer: &str)
    -> Result<(), ApiError>;

    /// Submit the session for grading. Terminal: a session can be submitted
    /// at most once.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for missing or already-submitted
    /// sessions.
    async fn submit(&self, id: &SessionId) -> Result<TestResults, ApiError>;
}

struct SessionState {
    config: TestConfig,
    questions: Vec<Question>,
    answers: Vec<Option<String>>,
    submitted: bool,
}

/// In-process fake with the same observable semantics as the real service.
///
/// Sessions draw their questions from a fixed bank supplied at construction.
/// Used by the services tests and as an offline backend.
#[derive(Clone, Default)]
pub struct InMemoryExamApi {
    sessions: Arc<Mutex<HashMap<SessionId, SessionState>>>,
    bank: Arc<Vec<Question>>,
    next_id: Arc<AtomicU64>,
    fail_saves: Arc<AtomicBool>,
    options: exam_core::model::ConfigOptions,
}

impl InMemoryExamApi {
    #[must_use]
    pub fn new(bank: Vec<Question>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            bank: Arc::new(bank),
            next_id: Arc::new(AtomicU64::new(1)),
            fail_saves: Arc::new(AtomicBool::new(false)),
            options: exam_core::model::ConfigOptions {
                school_subjects: vec!["Mathematics".into(), "Science".into(), "English".into()],
                college_courses: vec!["B.Tech".into(), "B.Sc".into(), "B.Com".into()],
                competitive_exams: vec!["UPSC".into(), "JEE".into(), "NEET".into()],
            },
        }
    }

    /// Install a session directly, bypassing create. Lets tests set up
    /// already-submitted or partially answered sessions.
    pub fn seed_session(
        &self,
        id: SessionId,
        config: TestConfig,
        questions: Vec<Question>,
        answers: Vec<Option<String>>,
        submitted: bool,
    ) {
        let mut answers = answers;
        answers.resize(questions.len(), None);
        let state = SessionState {
            config,
            questions,
            answers,
            submitted,
        };
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(id, state);
        }
    }

    /// When set, `save_answer` fails with a rejected error until cleared.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Answers currently persisted for a session, for assertions in tests.
    #[must_use]
    pub fn saved_answers(&self, id: &SessionId) -> Option<Vec<Option<String>>> {
        let sessions = self.sessions.lock().ok()?;
        sessions.get(id).map(|state| state.answers.clone())
    }

    #[must_use]
    pub fn is_submitted(&self, id: &SessionId) -> Option<bool> {
        let sessions = self.sessions.lock().ok()?;
        sessions.get(id).map(|state| state.submitted)
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, SessionState>>, ApiError> {
        self.sessions.lock().map_err(|_| ApiError::Rejected {
            detail: "service state lock poisoned".into(),
        })
    }
}

#[async_trait]
impl ExamApi for InMemoryExamApi {
    async fn create_session(&self, config: &TestConfig) -> Result<CreatedSession, ApiError> {
        config.validate().map_err(|e| ApiError::Rejected {
            detail: e.to_string(),
        })?;

        let wanted = usize::from(config.num_questions);
        if self.bank.len() < wanted {
            return Err(ApiError::Rejected {
                detail: format!(
                    "could only generate {} valid questions, need {wanted}",
                    self.bank.len()
                ),
            });
        }
        let questions: Vec<Question> = self.bank.iter().take(wanted).cloned().collect();

        let id = SessionId::new(format!(
            "session-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        ));
        let num_questions = questions.len();
        let answers = vec![None; num_questions];
        let mut sessions = self.lock_sessions()?;
        sessions.insert(
            id.clone(),
            SessionState {
                config: config.clone(),
                questions,
                answers,
                submitted: false,
            },
        );

        Ok(CreatedSession {
            session_id: id,
            num_questions,
        })
    }

    async fn config_options(&self) -> Result<exam_core::model::ConfigOptions, ApiError> {
        Ok(self.options.clone())
    }

    async fn session_summary(&self, id: &SessionId) -> Result<SessionSummary, ApiError> {
        let sessions = self.lock_sessions()?;
        let state = sessions.get(id).ok_or(ApiError::NotFound)?;
        Ok(SessionSummary {
            session_id: id.clone(),
            num_questions: state.questions.len(),
            num_answered: state.answers.iter().filter(|a| a.is_some()).count(),
            submitted: state.submitted,
            config: state.config.clone(),
        })
    }

    async fn question(&self, id: &SessionId, index: usize) -> Result<FetchedQuestion, ApiError> {
        let sessions = self.lock_sessions()?;
        let state = sessions.get(id).ok_or(ApiError::NotFound)?;
        let question = state.questions.get(index).ok_or_else(|| ApiError::Rejected {
            detail: "invalid question index".into(),
        })?;
        Ok(FetchedQuestion {
            index,
            total_questions: state.questions.len(),
            question: question.clone(),
            user_answer: state.answers[index].clone(),
        })
    }

    async fn save_answer(
        &self,
        id: &SessionId,
        index: usize,
        answer: &str,
    ) -> Result<(), ApiError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected {
                detail: "save rejected (injected failure)".into(),
            });
        }

        let mut sessions = self.lock_sessions()?;
        let state = sessions.get_mut(id).ok_or(ApiError::NotFound)?;
        if state.submitted {
            return Err(ApiError::Rejected {
                detail: "test already submitted".into(),
            });
        }
        let valid = state
            .questions
            .get(index)
            .is_some_and(|q| q.options().iter().any(|option| option == answer));
        if !valid {
            return Err(ApiError::Rejected {
                detail: "invalid answer or question index".into(),
            });
        }
        state.answers[index] = Some(answer.to_owned());
        Ok(())
    }

    async fn submit(&self, id: &SessionId) -> Result<TestResults, ApiError> {
        let mut sessions = self.lock_sessions()?;
        let state = sessions.get_mut(id).ok_or(ApiError::NotFound)?;
        if state.submitted {
            return Err(ApiError::NotFound);
        }
        state.submitted = true;

        let mut score = 0_u32;
        let mut results = Vec::with_capacity(state.questions.len());
        for (i, question) in state.questions.iter().enumerate() {
            let user_answer = state.answers[i].clone();
            let correct_answer = question.correct_answer().unwrap_or_default().to_owned();
            let is_correct = user_answer.as_deref() == Some(correct_answer.as_str());
            if is_correct {
                score += 1;
            }
            results.push(exam_core::model::QuestionResult {
                question_index: i,
                question: question.text().to_owned(),
                options: question.options().to_vec(),
                user_answer,
                correct_answer,
                is_correct,
            });
        }

        let total = u32::try_from(state.questions.len()).unwrap_or(u32::MAX);
        let percentage = if total == 0 {
            0.0
        } else {
            (f64::from(score) / f64::from(total) * 10_000.0).round() / 100.0
        };

        Ok(TestResults {
            session_id: id.clone(),
            score,
            total,
            percentage,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::TestConfig;

    fn bank(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    format!("Question {i}?"),
                    vec![
                        format!("opt-{i}-a"),
                        format!("opt-{i}-b"),
                        format!("opt-{i}-c"),
                        format!("opt-{i}-d"),
                    ],
                    Some(format!("opt-{i}-b")),
                )
                .unwrap()
            })
            .collect()
    }

    fn config() -> TestConfig {
        TestConfig::school(8, "Science", "Photosynthesis", 5)
    }

    #[tokio::test]
    async fn create_then_summary_round_trips() {
        let api = InMemoryExamApi::new(bank(10));
        let created = api.create_session(&config()).await.unwrap();
        assert_eq!(created.num_questions, 5);

        let summary = api.session_summary(&created.session_id).await.unwrap();
        assert_eq!(summary.num_questions, 5);
        assert_eq!(summary.num_answered, 0);
        assert!(!summary.submitted);
        assert_eq!(summary.config, config());
    }

    #[tokio::test]
    async fn create_rejects_invalid_config() {
        let api = InMemoryExamApi::new(bank(10));
        let bad = TestConfig::school(8, "", "Photosynthesis", 5);
        let err = api.create_session(&bad).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { .. }));
    }

    #[tokio::test]
    async fn question_fetch_is_bounds_checked() {
        let api = InMemoryExamApi::new(bank(10));
        let created = api.create_session(&config()).await.unwrap();

        let fetched = api.question(&created.session_id, 0).await.unwrap();
        assert_eq!(fetched.index, 0);
        assert_eq!(fetched.total_questions, 5);
        assert_eq!(fetched.user_answer, None);

        let err = api.question(&created.session_id, 5).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { .. }));
    }

    #[tokio::test]
    async fn save_answer_validates_text_against_options() {
        let api = InMemoryExamApi::new(bank(10));
        let created = api.create_session(&config()).await.unwrap();
        let id = &created.session_id;

        api.save_answer(id, 0, "opt-0-c").await.unwrap();
        assert_eq!(
            api.saved_answers(id).unwrap()[0].as_deref(),
            Some("opt-0-c")
        );

        let err = api.save_answer(id, 0, "A").await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { .. }));
    }

    #[tokio::test]
    async fn submit_scores_and_is_terminal() {
        let api = InMemoryExamApi::new(bank(10));
        let created = api.create_session(&config()).await.unwrap();
        let id = &created.session_id;

        // Answer three of five correctly.
        for i in 0..5 {
            let answer = if i < 3 {
                format!("opt-{i}-b")
            } else {
                format!("opt-{i}-a")
            };
            api.save_answer(id, i, &answer).await.unwrap();
        }

        let results = api.submit(id).await.unwrap();
        assert_eq!(results.score, 3);
        assert_eq!(results.total, 5);
        assert!((results.percentage - 60.0).abs() < f64::EPSILON);
        assert!(results.results[0].is_correct);
        assert!(!results.results[4].is_correct);

        // Second submit fails, as does saving into a submitted session.
        assert!(matches!(api.submit(id).await, Err(ApiError::NotFound)));
        let err = api.save_answer(id, 0, "opt-0-b").await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { .. }));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let api = InMemoryExamApi::new(bank(10));
        let ghost = SessionId::new("ghost");
        assert!(matches!(
            api.session_summary(&ghost).await,
            Err(ApiError::NotFound)
        ));
        assert!(matches!(api.question(&ghost, 0).await, Err(ApiError::NotFound)));
        assert!(matches!(api.submit(&ghost).await, Err(ApiError::NotFound)));
    }
}
