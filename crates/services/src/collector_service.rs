use std::sync::Arc;

use log::info;

use client::remote::{CreatedSession, ExamApi};
use client::session_ref::SessionRefStore;
use exam_core::model::{ConfigOptions, TestConfig};

use crate::error::CollectorError;

/// Configuration collector: validates a test config locally, asks the
/// service to generate the test, and persists the issued session id.
///
/// The session reference is written only on success, so a failed create
/// leaves the previous state untouched and the form usable for a retry.
#[derive(Clone)]
pub struct CollectorService {
    api: Arc<dyn ExamApi>,
    store: Arc<dyn SessionRefStore>,
}

impl CollectorService {
    #[must_use]
    pub fn new(api: Arc<dyn ExamApi>, store: Arc<dyn SessionRefStore>) -> Self {
        Self { api, store }
    }

    /// Dropdown contents for the configuration form.
    ///
    /// # Errors
    ///
    /// Returns `CollectorError::Api` on transport or service failures.
    pub async fn options(&self) -> Result<ConfigOptions, CollectorError> {
        Ok(self.api.config_options().await?)
    }

    /// Validate and submit a test config, persisting the session id.
    ///
    /// Validation runs before any network call; the first violated rule
    /// (topic, domain field, ranges, count) is the error surfaced.
    ///
    /// # Errors
    ///
    /// `Invalid` for local validation failures, `Api` when the service
    /// refuses the config or is unreachable, `Store` when the session id
    /// cannot be persisted.
    pub async fn create_test(&self, config: &TestConfig) -> Result<CreatedSession, CollectorError> {
        config.validate()?;

        let created = self.api.create_session(config).await?;
        self.store.save(&created.session_id)?;
        info!(
            "created session {} with {} questions",
            created.session_id, created.num_questions
        );
        Ok(created)
    }

    /// Whether a session reference is currently stored.
    ///
    /// # Errors
    ///
    /// Returns `CollectorError::Store` on storage failures.
    pub fn has_active_session(&self) -> Result<bool, CollectorError> {
        Ok(self.store.load()?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::remote::InMemoryExamApi;
    use client::session_ref::{InMemorySessionRefStore, SessionRefStore};
    use exam_core::model::{ConfigError, Question};

    fn bank() -> Vec<Question> {
        (0..20)
            .map(|i| {
                Question::new(
                    format!("Q{i}?"),
                    vec![
                        format!("{i}-a"),
                        format!("{i}-b"),
                        format!("{i}-c"),
                        format!("{i}-d"),
                    ],
                    Some(format!("{i}-a")),
                )
                .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn create_persists_session_id() {
        let api = Arc::new(InMemoryExamApi::new(bank()));
        let store = Arc::new(InMemorySessionRefStore::new());
        let collector = CollectorService::new(api, store.clone());

        let config = TestConfig::school(8, "Science", "Photosynthesis", 10);
        let created = collector.create_test(&config).await.unwrap();

        assert_eq!(store.load().unwrap(), Some(created.session_id));
        assert!(collector.has_active_session().unwrap());
    }

    #[tokio::test]
    async fn invalid_config_never_reaches_the_network() {
        let api = Arc::new(InMemoryExamApi::new(Vec::new()));
        let store = Arc::new(InMemorySessionRefStore::new());
        let collector = CollectorService::new(api, store.clone());

        // Empty bank would make any create fail with a service error; the
        // validation error proves we stopped before the call.
        let config = TestConfig::school(8, "Science", "   ", 10);
        let err = collector.create_test(&config).await.unwrap_err();
        assert!(matches!(
            err,
            CollectorError::Invalid(ConfigError::MissingTopic)
        ));
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn service_rejection_leaves_store_untouched() {
        // Bank too small for the requested count: service-side rejection.
        let api = Arc::new(InMemoryExamApi::new(bank().into_iter().take(3).collect()));
        let store = Arc::new(InMemorySessionRefStore::new());
        let collector = CollectorService::new(api, store.clone());

        let config = TestConfig::competitive("JEE", "Optics", 10);
        let err = collector.create_test(&config).await.unwrap_err();
        assert!(matches!(err, CollectorError::Api(_)));
        assert_eq!(store.load().unwrap(), None);
    }
}
