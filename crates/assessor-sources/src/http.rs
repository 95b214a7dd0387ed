//! Remote question service source.
//!
//! `GET {base_url}/questions?mode=<mode>[&topic=<topic>]` must answer with
//! either a JSON array of questions in the flat wire format or an object
//! with a `questions` array.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use assessor_core::error::SourceError;
use assessor_core::model::{Mode, Question};
use assessor_core::traits::{describe_request, QuestionSource};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP question service client.
pub struct HttpSource {
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let timeout_secs = if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs,
            client,
        })
    }

    fn questions_url(&self, mode: Mode, topic: Option<&str>) -> Result<reqwest::Url, SourceError> {
        let mut url = reqwest::Url::parse(&format!("{}/questions", self.base_url))
            .map_err(|e| SourceError::Unavailable(format!("invalid base URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("mode", &mode.to_string());
            if let Some(topic) = topic {
                query.append_pair("topic", topic);
            }
        }
        Ok(url)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionsPayload {
    List(Vec<Question>),
    Wrapped { questions: Vec<Question> },
}

#[async_trait]
impl QuestionSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch(&self, mode: Mode, topic: Option<&str>) -> Result<Vec<Question>, SourceError> {
        let url = self.questions_url(mode, topic)?;

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                SourceError::Unavailable(format!(
                    "question service not reachable at {}",
                    self.base_url
                ))
            } else {
                SourceError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Http { status, message });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Unavailable(format!("failed to read response: {e}")))?;
        let payload: QuestionsPayload = serde_json::from_str(&body)
            .map_err(|e| SourceError::Malformed(format!("failed to parse response: {e}")))?;

        let questions = match payload {
            QuestionsPayload::List(questions) | QuestionsPayload::Wrapped { questions } => questions,
        };
        tracing::debug!(count = questions.len(), "received questions");

        if questions.is_empty() {
            return Err(SourceError::Empty(describe_request(mode, topic)));
        }
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn questions_json() -> serde_json::Value {
        serde_json::json!([
            {
                "id": "q1",
                "type": "multiple-choice",
                "prompt": "2 + 2?",
                "options": ["3", "4"],
                "correctAnswers": ["4"],
                "topic": "arithmetic"
            },
            {
                "id": "q2",
                "type": "slider",
                "prompt": "Pick 50",
                "min": 0,
                "max": 100,
                "correctAnswers": [50],
                "timeLimitSeconds": 20
            }
        ])
    }

    #[tokio::test]
    async fn successful_fetch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/questions"))
            .and(query_param("mode", "assessment"))
            .and(query_param("topic", "arithmetic"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(questions_json()))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), Some("sk-test".into()), 5).unwrap();
        let questions = source
            .fetch(Mode::Assessment, Some("arithmetic"))
            .await
            .unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].time_limit_seconds, Some(20));
    }

    #[tokio::test]
    async fn wrapped_payload() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/questions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "questions": questions_json() })),
            )
            .mount(&server)
            .await;

        let source = HttpSource::new(&format!("{}/", server.uri()), None, 5).unwrap();
        let questions = source.fetch(Mode::Practice, None).await.unwrap();
        assert_eq!(questions[0].id, "q1");
    }

    #[tokio::test]
    async fn server_error_is_retryable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/questions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), None, 5).unwrap();
        let err = source.fetch(Mode::Practice, None).await.unwrap_err();
        assert_eq!(
            err,
            SourceError::Http {
                status: 503,
                message: "maintenance".into()
            }
        );
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn not_found_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/questions"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), None, 5).unwrap();
        let err = source.fetch(Mode::Practice, None).await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn malformed_payload() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"nope\": true}"))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), None, 5).unwrap();
        let err = source.fetch(Mode::Practice, None).await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[tokio::test]
    async fn empty_list_is_empty_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), None, 5).unwrap();
        let err = source.fetch(Mode::Adaptive, Some("x")).await.unwrap_err();
        assert_eq!(err, SourceError::Empty("adaptive mode, topic 'x'".into()));
    }

    #[tokio::test]
    async fn unreachable_service_is_retryable() {
        // nothing listens on the discard port
        let source = HttpSource::new("http://127.0.0.1:9", None, 2).unwrap();
        let err = source.fetch(Mode::Practice, None).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
