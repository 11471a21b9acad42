use async_trait::async_trait;
use log::{debug, error, trace};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::Error;
use crate::request::ChatRequest;

/// Groq's OpenAI-compatible endpoint
pub const GROQ_API_BASE: &str
  = "https://api.groq.com/openai/v1";

// ===== Response Types =====

#[derive(Debug, Clone, Deserialize)]
pub struct GroqChatResponse
{   pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ResponseMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage
{   #[serde(default)]
    pub content: Option<String>
}

// ===== Groq Client =====

/// HTTP client for the Groq chat-completion API
pub struct GroqClient
{   api_key: String
  , api_base: String
  , http_client: reqwest::Client
}

impl GroqClient
{   /// Build a client. `api_base` defaults to Groq's endpoint;
    /// `timeout` bounds each HTTP exchange.
    pub fn new(
      api_key: String
    , api_base: Option<Url>
    , timeout: Option<Duration>
    ) -> Result<Self, Error>
    {   debug!("Creating GroqClient");
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout
        {   builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| {
          error!("Failed to build HTTP client: {}", e);
          Error::HttpError(e.to_string())
        })?;
        let api_base = api_base
          .as_ref()
          .map_or(GROQ_API_BASE, Url::as_str)
          .trim_end_matches('/')
          .to_string();
        Ok(GroqClient
        {   api_key
          , api_base
          , http_client
        })
    }

    pub fn api_base(&self) -> &str
    {   &self.api_base
    }
}

/// Map a non-success status and body to an error kind
fn classify_failure(
  status: u16
, body: String
, model: &str
) -> Error
{   match status
    {   429 => Error::RateLimitExceeded
      , 404 => Error::ModelUnavailable(model.to_string())
      , _ if body.contains("model_decommissioned")
          || body.contains("model_not_found") => {
          Error::ModelUnavailable(model.to_string())
        }
      , _ => Error::ApiError
        {   status
          , message: body
        }
    }
}

#[async_trait]
impl crate::providers::CompletionApi for GroqClient
{   async fn chat(
      &self
    , request: &ChatRequest
    ) -> Result<String, Error>
    {   debug!("Sending chat request to model: {}", request.model);
        trace!("Groq request: {:?}", request);

        let response = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .header("Authorization", format!("Bearer {}", self.api_key))
          .header("Content-Type", "application/json")
          .json(request)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            if e.is_timeout()
            {   Error::Timeout
            } else
            {   Error::HttpError(e.to_string())
            }
          })?;

        let status = response.status();
        trace!("Groq response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Groq API error: {}", error_text);
            return Err(classify_failure(
              status.as_u16()
            , error_text
            , &request.model
            ));
        }

        let chat_response: GroqChatResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            Error::ParseError(e.to_string())
          })?;

        chat_response.choices.into_iter().next()
          .map(|c| c.message.content.unwrap_or_default())
          .ok_or_else(|| {
            error!("No choices in response");
            Error::NoChoicesInResponse
          })
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::providers::CompletionApi;
    use crate::request::{ChatMessage, ExtraOptions, Role};
    use mockito::Matcher;
    use serde_json::json;

    fn request(model: &str) -> ChatRequest
    {   ChatRequest
        {   model: model.to_string()
          , messages: vec![ChatMessage
            {   role: Role::User
              , content: "Tell me a joke".to_string()
            }]
          , temperature: 0.9
          , max_tokens: 100
          , options: ExtraOptions::default().with_top_p(0.9)
        }
    }

    fn client(url: String) -> GroqClient
    {   let base = Url::parse(&url).unwrap();
        GroqClient::new("test-key".to_string(), Some(base), None)
          .unwrap()
    }

    #[tokio::test]
    async fn chat_returns_first_choice()
    {   let mut server = mockito::Server::new_async().await;
        let mock = server
          .mock("POST", "/chat/completions")
          .match_header("authorization", "Bearer test-key")
          .match_body(Matcher::PartialJson(json!({
            "model": "llama3-8b-8192",
            "max_tokens": 100,
            "messages": [{"role": "user", "content": "Tell me a joke"}]
          })))
          .with_status(200)
          .with_header("content-type", "application/json")
          .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Knock knock"},"finish_reason":"stop"}]}"#)
          .create_async()
          .await;

        let text = client(server.url())
          .chat(&request("llama3-8b-8192"))
          .await
          .unwrap();
        assert_eq!(text, "Knock knock");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limit_maps_to_error_kind()
    {   let mut server = mockito::Server::new_async().await;
        let _m = server
          .mock("POST", "/chat/completions")
          .with_status(429)
          .with_body("slow down")
          .create_async()
          .await;

        let err = client(server.url())
          .chat(&request("m"))
          .await
          .unwrap_err();
        assert_eq!(err, Error::RateLimitExceeded);
    }

    #[tokio::test]
    async fn decommissioned_model_is_unavailable()
    {   let mut server = mockito::Server::new_async().await;
        let _m = server
          .mock("POST", "/chat/completions")
          .with_status(400)
          .with_body(r#"{"error":{"code":"model_decommissioned"}}"#)
          .create_async()
          .await;

        let err = client(server.url())
          .chat(&request("mixtral-8x7b-32768"))
          .await
          .unwrap_err();
        assert_eq!(
          err
        , Error::ModelUnavailable("mixtral-8x7b-32768".to_string())
        );
    }

    #[tokio::test]
    async fn empty_choices_is_an_error()
    {   let mut server = mockito::Server::new_async().await;
        let _m = server
          .mock("POST", "/chat/completions")
          .with_status(200)
          .with_header("content-type", "application/json")
          .with_body(r#"{"choices":[]}"#)
          .create_async()
          .await;

        let err = client(server.url())
          .chat(&request("m"))
          .await
          .unwrap_err();
        assert_eq!(err, Error::NoChoicesInResponse);
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body()
    {   let mut server = mockito::Server::new_async().await;
        let _m = server
          .mock("POST", "/chat/completions")
          .with_status(503)
          .with_body("overloaded")
          .create_async()
          .await;

        let err = client(server.url())
          .chat(&request("m"))
          .await
          .unwrap_err();
        assert_eq!(
          err
        , Error::ApiError
          {   status: 503
            , message: "overloaded".to_string()
          }
        );
    }

    #[test]
    fn trailing_slash_is_trimmed()
    {   let c = client("http://localhost:1/v1/".to_string());
        assert_eq!(c.api_base(), "http://localhost:1/v1");
        // a bare host serializes with a root slash
        let c = client("http://localhost:1".to_string());
        assert_eq!(c.api_base(), "http://localhost:1");
    }

    #[test]
    fn default_base_is_groq()
    {   let c = GroqClient::new("k".to_string(), None, None).unwrap();
        assert_eq!(c.api_base(), GROQ_API_BASE);
    }
}
