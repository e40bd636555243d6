use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// HTTP client for the ImmoGPT answer service
#[derive(Clone)]
pub struct AnswerClient {
    client: Client,
    base_url: String,
}

impl AnswerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Ask one question; the payload shape is opaque to the caller.
    ///
    /// The question is interpolated into the query string as-is, the same way
    /// the service expects it; no explicit escaping step is applied. The body
    /// is parsed as JSON regardless of the response status.
    pub async fn ask(&self, question: &str) -> Result<Value> {
        let url = format!("{}/immo?question={}", self.base_url, question);
        debug!(%url, "requesting answer");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Answer request failed")?;

        let payload: Value = response
            .json()
            .await
            .context("Answer body was not valid JSON")?;

        Ok(payload)
    }
}

/// Render an opaque answer payload as display text
pub fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn asks_with_question_as_query_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/immo"))
            .and(query_param("question", "What about rent trends?"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("Rents rose 4% YoY.")))
            .mount(&server)
            .await;

        let client = AnswerClient::new(&server.uri());
        let payload = client.ask("What about rent trends?").await.unwrap();

        assert_eq!(payload, json!("Rents rose 4% YoY."));
    }

    #[tokio::test]
    async fn non_string_payloads_come_back_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/immo"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"answer": "Downtown costs less."})),
            )
            .mount(&server)
            .await;

        let client = AnswerClient::new(&server.uri());
        let payload = client.ask("cheapest flat").await.unwrap();

        assert_eq!(payload, json!({"answer": "Downtown costs less."}));
    }

    #[tokio::test]
    async fn non_json_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/immo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = AnswerClient::new(&server.uri());
        assert!(client.ask("anything").await.is_err());
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        // Nothing listens here; the connect error must surface as Err.
        let client = AnswerClient::new("http://127.0.0.1:9");
        assert!(client.ask("anything").await.is_err());
    }

    #[test]
    fn payload_text_unwraps_strings_and_serializes_the_rest() {
        assert_eq!(payload_text(&json!("plain answer")), "plain answer");
        assert_eq!(payload_text(&json!(42)), "42");
        assert_eq!(payload_text(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
