use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use exam_core::model::{
    ConfigOptions, Question, SessionId, SessionSummary, TestConfig, TestResults,
};

use crate::remote::{ApiError, CreatedSession, ExamApi, FetchedQuestion};

/// reqwest-backed client for the exam service's JSON contract.
#[derive(Clone)]
pub struct HttpExamApi {
    client: Client,
    base_url: Url,
}

impl HttpExamApi {
    /// # Errors
    ///
    /// Returns `ApiError::BaseUrl` when `base_url` cannot be parsed.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|_| ApiError::BaseUrl(base_url.to_owned()))?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::BaseUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Error bodies carry a `detail` field; it may be a string or a
        // structured validation report.
        let detail = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("detail").cloned())
            .map_or_else(String::new, |value| match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });

        log::warn!("service returned {status}: {detail}");
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl ExamApi for HttpExamApi {
    async fn create_session(&self, config: &TestConfig) -> Result<CreatedSession, ApiError> {
        let url = self.endpoint(&["generate-test"])?;
        let response = self.client.post(url).json(config).send().await?;
        let body: GenerateTestResponse = Self::check(response).await?.json().await?;
        Ok(CreatedSession {
            session_id: body.session_id,
            num_questions: body.num_questions,
        })
    }

    async fn config_options(&self) -> Result<ConfigOptions, ApiError> {
        let url = self.endpoint(&["config", "options"])?;
        let response = self.client.get(url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn session_summary(&self, id: &SessionId) -> Result<SessionSummary, ApiError> {
        let url = self.endpoint(&["test-summary", id.as_str()])?;
        let response = self.client.get(url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn question(&self, id: &SessionId, index: usize) -> Result<FetchedQuestion, ApiError> {
        let url = self.endpoint(&["question", id.as_str(), &index.to_string()])?;
        let response = self.client.get(url).send().await?;
        let body: QuestionResponse = Self::check(response).await?.json().await?;

        let question = Question::new(body.question, body.options, body.correct_answer)
            .map_err(|e| ApiError::Rejected {
                detail: e.to_string(),
            })?;
        Ok(FetchedQuestion {
            index: body.question_index,
            total_questions: body.total_questions,
            question,
            user_answer: body.user_answer,
        })
    }

    async fn save_answer(
        &self,
        id: &SessionId,
        index: usize,
        answer: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["answer", id.as_str(), &index.to_string()])?;
        let payload = SaveAnswerRequest { answer };
        let response = self.client.post(url).json(&payload).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn submit(&self, id: &SessionId) -> Result<TestResults, ApiError> {
        let url = self.endpoint(&["submit", id.as_str()])?;
        let response = self.client.post(url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateTestResponse {
    session_id: SessionId,
    num_questions: usize,
}

#[derive(Debug, Deserialize)]
struct QuestionResponse {
    question_index: usize,
    total_questions: usize,
    question: String,
    options: Vec<String>,
    user_answer: Option<String>,
    correct_answer: Option<String>,
}

#[derive(Debug, Serialize)]
struct SaveAnswerRequest<'a> {
    answer: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_under_base_url() {
        let api = HttpExamApi::new("http://localhost:8000").unwrap();
        let url = api.endpoint(&["question", "s-1", "3"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/question/s-1/3");

        let api = HttpExamApi::new("http://localhost:8000/api/").unwrap();
        let url = api.endpoint(&["config", "options"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/config/options");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpExamApi::new("not a url"),
            Err(ApiError::BaseUrl(_))
        ));
    }
}
