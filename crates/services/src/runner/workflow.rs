use std::sync::Arc;

use log::{info, warn};
use tokio::sync::Mutex;

use client::remote::{ApiError, ExamApi};
use client::session_ref::SessionRefStore;
use exam_core::Clock;
use exam_core::model::{AnswerLetter, TestResults};

use super::service::TestRunner;
use crate::error::RunnerError;

/// Orchestrates the session runner against the remote service.
///
/// All session mutations go through the single-flight `gate`, so two rapid
/// navigations (or a navigation racing a select) cannot interleave their
/// fetch/save round-trips; the second caller waits for the first to settle.
pub struct RunnerWorkflow {
    api: Arc<dyn ExamApi>,
    store: Arc<dyn SessionRefStore>,
    clock: Clock,
    gate: Mutex<()>,
}

impl RunnerWorkflow {
    #[must_use]
    pub fn new(api: Arc<dyn ExamApi>, store: Arc<dyn SessionRefStore>, clock: Clock) -> Self {
        Self {
            api,
            store,
            clock,
            gate: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Resume the session referenced by the durable store.
    ///
    /// Every question is fetched before the first display, so any letter on
    /// the sheet is always translatable back to option text, and previously
    /// saved answers are adopted into the sheet. Ends with question 0
    /// displayed.
    ///
    /// # Errors
    ///
    /// `NoSession` when the store holds no reference, `AlreadySubmitted`
    /// when the summary reports a finished test (the stale reference is
    /// cleared), `Api` when the summary or a question fetch fails. All are
    /// fatal to this page instance; the caller should redirect.
    pub async fn resume(&self) -> Result<TestRunner, RunnerError> {
        let _guard = self.gate.lock().await;

        let session_id = self.store.load()?.ok_or(RunnerError::NoSession)?;
        let summary = self.api.session_summary(&session_id).await?;

        if summary.submitted {
            // The reference points at a terminal session; drop it so the
            // next visit goes straight to the collector.
            if let Err(e) = self.store.clear() {
                warn!("failed to clear stale session reference: {e}");
            }
            return Err(RunnerError::AlreadySubmitted);
        }

        info!(
            "resuming session {} ({} questions, {} answered)",
            summary.session_id, summary.num_questions, summary.num_answered
        );

        let mut runner = TestRunner::new(&summary, self.clock.now());
        for index in 0..summary.num_questions {
            let fetched = self.api.question(&session_id, index).await?;
            runner.preload(index, fetched.question, fetched.user_answer.as_deref())?;
        }
        runner.display(0)?;
        Ok(runner)
    }

    /// Navigate to `target`: flush the current slot, then display.
    ///
    /// The flush is best-effort; a save failure is logged, the slot stays
    /// dirty, and navigation proceeds (the submit flush is the backstop).
    ///
    /// # Errors
    ///
    /// `OutOfRange` for bad targets, `Inactive` outside the displayed state.
    pub async fn goto(&self, runner: &mut TestRunner, target: usize) -> Result<(), RunnerError> {
        let _guard = self.gate.lock().await;

        let current = runner.current_index();
        if runner.is_dirty(current) {
            self.flush_slot(runner, current).await;
        }

        if !runner.is_cached(target) && target < runner.total_questions() {
            // Unreachable under eager pre-load, but keep the lazy path
            // airtight rather than a silent no-op.
            let fetched = self.api.question(runner.session_id(), target).await?;
            runner.preload(target, fetched.question, fetched.user_answer.as_deref())?;
        }

        runner.display(target)
    }

    /// Record a letter for the displayed question and persist it
    /// immediately. The save is best-effort: on failure the letter stays
    /// recorded locally and the slot stays dirty for the submit flush.
    ///
    /// # Errors
    ///
    /// `Inactive` unless a question is displayed.
    pub async fn select(
        &self,
        runner: &mut TestRunner,
        letter: AnswerLetter,
    ) -> Result<(), RunnerError> {
        let _guard = self.gate.lock().await;

        let (index, text) = runner.select(letter)?;
        match self.api.save_answer(runner.session_id(), index, &text).await {
            Ok(()) => runner.mark_saved(index),
            Err(e) => warn!("failed to save answer for question {index}: {e}"),
        }
        Ok(())
    }

    /// Submit the session: flush every unsaved answer, then grade.
    ///
    /// # Errors
    ///
    /// `NotReady` unless every question is answered. Flush and submit
    /// failures restore the question display and are retryable.
    pub async fn submit(&self, runner: &mut TestRunner) -> Result<TestResults, RunnerError> {
        let _guard = self.gate.lock().await;

        let restore_index = runner.begin_submit()?;

        // Unlike the per-select saves, the pre-submit flush must succeed:
        // the service grades only what it has persisted.
        let dirty = match runner.dirty_answers() {
            Ok(dirty) => dirty,
            Err(e) => {
                runner.abort_submit(restore_index);
                return Err(e);
            }
        };
        for (index, text) in dirty {
            match self.api.save_answer(runner.session_id(), index, &text).await {
                Ok(()) => runner.mark_saved(index),
                Err(e) => {
                    runner.abort_submit(restore_index);
                    return Err(e.into());
                }
            }
        }

        match self.api.submit(runner.session_id()).await {
            Ok(results) => {
                runner.complete();
                if let Err(e) = self.store.clear() {
                    warn!("submit succeeded but clearing session reference failed: {e}");
                }
                info!(
                    "session {} submitted: {}/{} ({}%)",
                    results.session_id, results.score, results.total, results.percentage
                );
                Ok(results)
            }
            Err(e) => {
                runner.abort_submit(restore_index);
                Err(e.into())
            }
        }
    }

    /// Abandon the session without submitting: clear the durable reference
    /// and mark the runner terminal.
    ///
    /// # Errors
    ///
    /// Returns `Store` when the reference cannot be cleared.
    pub async fn exit(&self, runner: &mut TestRunner) -> Result<(), RunnerError> {
        let _guard = self.gate.lock().await;
        self.store.clear()?;
        runner.fail();
        info!("session {} abandoned", runner.session_id());
        Ok(())
    }

    /// Clear the durable reference without a runner, for fatal-init paths
    /// where the caller redirects before a runner exists.
    ///
    /// # Errors
    ///
    /// Returns `Store` when the reference cannot be cleared.
    pub fn clear_reference(&self) -> Result<(), RunnerError> {
        self.store.clear()?;
        Ok(())
    }

    /// Whether an API error is fatal to the page instance (missing or
    /// expired session) rather than retryable.
    #[must_use]
    pub fn is_fatal(error: &RunnerError) -> bool {
        matches!(
            error,
            RunnerError::NoSession
                | RunnerError::AlreadySubmitted
                | RunnerError::Api(ApiError::NotFound)
        )
    }

    async fn flush_slot(&self, runner: &mut TestRunner, index: usize) {
        let text = match runner.answer_text(index) {
            Ok(Some(text)) => text,
            Ok(None) => return,
            Err(e) => {
                warn!("cannot translate answer for question {index}: {e}");
                return;
            }
        };
        match self.api.save_answer(runner.session_id(), index, &text).await {
            Ok(()) => runner.mark_saved(index),
            Err(e) => warn!("failed to flush answer for question {index}: {e}"),
        }
    }
}
