use chrono::{DateTime, Utc};
use std::fmt;

use exam_core::model::{AnswerLetter, AnswerSheet, Question, SessionId, SessionSummary, TestConfig};

use super::cache::QuestionCache;
use super::progress::RunnerProgress;
use super::view::{IndicatorView, OptionView, QuestionView};
use crate::error::RunnerError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of one session-page instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Loading,
    QuestionDisplayed(usize),
    Submitting,
    Completed,
    Errored,
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

/// In-memory state machine for one test session.
///
/// Holds the question cache, the answer sheet, and per-slot saved flags, and
/// enforces the state transitions. All methods are synchronous and pure with
/// respect to I/O; [`super::RunnerWorkflow`] drives the network side.
pub struct TestRunner {
    session_id: SessionId,
    config: TestConfig,
    cache: QuestionCache,
    sheet: AnswerSheet,
    // saved[i]: the letter in sheet slot i has been persisted server-side
    // and not changed since. Unanswered slots count as saved.
    saved: Vec<bool>,
    current: usize,
    state: RunnerState,
    started_at: DateTime<Utc>,
}

impl TestRunner {
    /// Build a runner from a fresh session summary.
    ///
    /// `started_at` should come from the workflow clock to keep time
    /// deterministic. The runner starts in `Loading`; the first successful
    /// [`display`](Self::display) moves it to `QuestionDisplayed`.
    #[must_use]
    pub fn new(summary: &SessionSummary, started_at: DateTime<Utc>) -> Self {
        let total = summary.num_questions;
        Self {
            session_id: summary.session_id.clone(),
            config: summary.config.clone(),
            cache: QuestionCache::new(total),
            sheet: AnswerSheet::new(total),
            saved: vec![true; total],
            current: 0,
            state: RunnerState::Loading,
            started_at,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.state
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.sheet.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn is_cached(&self, index: usize) -> bool {
        self.cache.is_cached(index)
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<AnswerLetter> {
        self.sheet.get(index)
    }

    /// Submit-readiness: every slot on the sheet holds a letter.
    #[must_use]
    pub fn is_submit_ready(&self) -> bool {
        self.sheet.is_complete()
    }

    /// Store a fetched question, adopting any answer already saved
    /// server-side. Cache insertion is idempotent; an adopted answer never
    /// overwrites a letter the user picked in this page instance.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Question` if the saved answer text does not
    /// match any option of the fetched question.
    pub fn preload(
        &mut self,
        index: usize,
        question: Question,
        saved_answer: Option<&str>,
    ) -> Result<(), RunnerError> {
        self.cache.insert(index, question);

        if let Some(text) = saved_answer {
            if self.sheet.get(index).is_none() {
                let cached = self
                    .cache
                    .get(index)
                    .ok_or(RunnerError::NotCached { index })?;
                let letter = cached.letter_of(text)?;
                self.sheet.set(index, letter);
                self.saved[index] = true;
            }
        }
        Ok(())
    }

    /// Move the display to `index`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for bad indices and `NotCached` when the target
    /// question has not been fetched; displaying an uncached question would
    /// break the letter-to-text invariant.
    pub fn display(&mut self, index: usize) -> Result<(), RunnerError> {
        match self.state {
            RunnerState::Loading | RunnerState::QuestionDisplayed(_) => {}
            _ => return Err(RunnerError::Inactive),
        }
        if index >= self.total_questions() {
            return Err(RunnerError::OutOfRange {
                index,
                total: self.total_questions(),
            });
        }
        if !self.cache.is_cached(index) {
            return Err(RunnerError::NotCached { index });
        }
        self.current = index;
        self.state = RunnerState::QuestionDisplayed(index);
        Ok(())
    }

    /// Record the letter for the displayed question and return the option
    /// text to persist. The slot becomes dirty until `mark_saved`.
    ///
    /// # Errors
    ///
    /// Returns `Inactive` unless a question is displayed.
    pub fn select(&mut self, letter: AnswerLetter) -> Result<(usize, String), RunnerError> {
        let RunnerState::QuestionDisplayed(index) = self.state else {
            return Err(RunnerError::Inactive);
        };
        let question = self
            .cache
            .get(index)
            .ok_or(RunnerError::NotCached { index })?;
        let text = question.option_text(letter).to_owned();

        self.sheet.set(index, letter);
        self.saved[index] = false;
        Ok((index, text))
    }

    /// Option text for the letter recorded at `index`, if any.
    ///
    /// # Errors
    ///
    /// Returns `NotCached` when a letter exists but its question does not;
    /// translation against a missing cache entry is an error, never a
    /// silent no-op.
    pub fn answer_text(&self, index: usize) -> Result<Option<String>, RunnerError> {
        let Some(letter) = self.sheet.get(index) else {
            return Ok(None);
        };
        let question = self
            .cache
            .get(index)
            .ok_or(RunnerError::NotCached { index })?;
        Ok(Some(question.option_text(letter).to_owned()))
    }

    pub fn mark_saved(&mut self, index: usize) {
        if let Some(flag) = self.saved.get_mut(index) {
            *flag = true;
        }
    }

    #[must_use]
    pub fn is_dirty(&self, index: usize) -> bool {
        self.sheet.get(index).is_some() && !self.saved.get(index).copied().unwrap_or(true)
    }

    /// Slots whose recorded letter has not been persisted yet, with the
    /// option text each letter translates to.
    ///
    /// # Errors
    ///
    /// Returns `NotCached` if a dirty slot has no cached question. That is
    /// an invariant breach, not a skippable condition.
    pub fn dirty_answers(&self) -> Result<Vec<(usize, String)>, RunnerError> {
        let mut dirty = Vec::new();
        for (index, letter) in self.sheet.answered() {
            if self.saved.get(index).copied().unwrap_or(true) {
                continue;
            }
            let question = self
                .cache
                .get(index)
                .ok_or(RunnerError::NotCached { index })?;
            dirty.push((index, question.option_text(letter).to_owned()));
        }
        Ok(dirty)
    }

    /// Enter `Submitting`. The previous index is returned so a failed submit
    /// can restore the display.
    ///
    /// # Errors
    ///
    /// Returns `Inactive` unless a question is displayed, `NotReady` unless
    /// every slot is answered.
    pub fn begin_submit(&mut self) -> Result<usize, RunnerError> {
        let RunnerState::QuestionDisplayed(index) = self.state else {
            return Err(RunnerError::Inactive);
        };
        if !self.is_submit_ready() {
            return Err(RunnerError::NotReady);
        }
        self.state = RunnerState::Submitting;
        Ok(index)
    }

    /// Return to the question display after a failed submit (retryable).
    pub fn abort_submit(&mut self, index: usize) {
        if self.state == RunnerState::Submitting {
            self.state = RunnerState::QuestionDisplayed(index.min(self.total_questions().saturating_sub(1)));
        }
    }

    /// Terminal transition after a successful submit.
    pub fn complete(&mut self) {
        self.state = RunnerState::Completed;
    }

    /// Terminal transition for fatal errors and abandoned sessions.
    pub fn fail(&mut self) {
        self.state = RunnerState::Errored;
    }

    #[must_use]
    pub fn progress(&self) -> RunnerProgress {
        RunnerProgress {
            current: self.current + 1,
            total: self.total_questions(),
            answered: self.sheet.answered_count(),
            submit_ready: self.is_submit_ready(),
        }
    }

    /// View of the displayed question, options labeled A-D in fixed order.
    ///
    /// # Errors
    ///
    /// Returns `Inactive` unless a question is displayed.
    pub fn question_view(&self) -> Result<QuestionView, RunnerError> {
        let RunnerState::QuestionDisplayed(index) = self.state else {
            return Err(RunnerError::Inactive);
        };
        let question = self
            .cache
            .get(index)
            .ok_or(RunnerError::NotCached { index })?;
        let selected = self.sheet.get(index);

        let options = AnswerLetter::ALL
            .iter()
            .map(|&letter| OptionView {
                letter,
                text: question.option_text(letter).to_owned(),
                selected: selected == Some(letter),
            })
            .collect();

        Ok(QuestionView {
            index,
            number: index + 1,
            total: self.total_questions(),
            text: question.text().to_owned(),
            options,
            answered: selected.is_some(),
        })
    }

    /// One indicator per question index: current + answered markers.
    #[must_use]
    pub fn indicators(&self) -> Vec<IndicatorView> {
        let current = match self.state {
            RunnerState::QuestionDisplayed(index) => Some(index),
            _ => None,
        };
        (0..self.total_questions())
            .map(|index| IndicatorView {
                index,
                current: current == Some(index),
                answered: self.sheet.get(index).is_some(),
            })
            .collect()
    }
}

impl fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRunner")
            .field("session_id", &self.session_id)
            .field("total", &self.total_questions())
            .field("current", &self.current)
            .field("answered", &self.sheet.answered_count())
            .field("state", &self.state)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
