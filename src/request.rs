//! Request and response types shared by the gateway and providers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

/// Message as handed to the gateway. Content may be any JSON value;
/// it is coerced to text before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessage
{   pub role: Role
  , pub content: serde_json::Value
}

impl PromptMessage
{   pub fn new(
      role: Role
    , content: impl Into<serde_json::Value>
    ) -> Self
    {   PromptMessage
        {   role
          , content: content.into()
        }
    }

    pub fn system(content: impl Into<String>) -> Self
    {   PromptMessage::new(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self
    {   PromptMessage::new(Role::User, content.into())
    }

    /// Coerce the content to text: strings pass through, every
    /// other value becomes its compact JSON rendering.
    pub fn into_chat_message(self) -> ChatMessage
    {   let content = match self.content
        {   serde_json::Value::String(s) => s
          , other => other.to_string()
        };
        ChatMessage
        {   role: self.role
          , content
        }
    }
}

/// Normalize a conversation for transmission
pub fn normalize_messages(
  messages: Vec<PromptMessage>
) -> Vec<ChatMessage>
{   messages
      .into_iter()
      .map(PromptMessage::into_chat_message)
      .collect()
}

/// Wire-level chat message, content always text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: Role
  , pub content: String
}

/// Structured output selector (`{"type": "json_object"}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat
{   #[serde(rename = "type")]
    pub kind: String
}

impl ResponseFormat
{   pub fn json_object() -> Self
    {   ResponseFormat
        {   kind: "json_object".to_string()
        }
    }
}

/// Options passed through to the provider untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraOptions
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>
  , /// Any further provider fields, serialized flat
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>
}

impl ExtraOptions
{   pub fn with_top_p(mut self, top_p: f32) -> Self
    {   self.top_p = Some(top_p);
        self
    }

    pub fn with_json_output(mut self) -> Self
    {   self.response_format = Some(ResponseFormat::json_object());
        self
    }
}

/// One chat-completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f32
  , pub max_tokens: u32
  , #[serde(flatten)]
    pub options: ExtraOptions
}

/// A fallback model stood in for the requested one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution
{   pub requested: String
  , pub used: String
}

impl fmt::Display for Substitution
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   write!(f,
          "Primary model {} unavailable. Using fallback model {}.",
          self.requested, self.used
        )
    }
}

/// Result of one gateway call
#[derive(Debug, Clone, PartialEq)]
pub struct Completion
{   /// Generated text
    pub text: String
  , /// Model that produced the text
    pub model: String
  , /// Set when the fallback model answered
    pub substitution: Option<Substitution>
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn non_text_content_is_stringified()
    {   let msgs = normalize_messages(vec![
          PromptMessage::new(Role::User, json!(42))
        , PromptMessage::new(Role::User, json!({"a": [1, true]}))
        , PromptMessage::new(Role::System, json!(null))
        , PromptMessage::user("plain")
        ]);
        assert_eq!(msgs[0].content, "42");
        assert_eq!(msgs[1].content, r#"{"a":[1,true]}"#);
        assert_eq!(msgs[2].content, "null");
        assert_eq!(msgs[3].content, "plain");
    }

    #[test]
    fn request_serializes_options_flat()
    {   let mut options = ExtraOptions::default()
          .with_top_p(0.9)
          .with_json_output();
        options.extra.insert("seed".into(), json!(7));
        let req = ChatRequest
        {   model: "m".into()
          , messages: vec![ChatMessage
            {   role: Role::System
              , content: "hi".into()
            }]
          , temperature: 0.5
          , max_tokens: 100
          , options
        };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["top_p"], json!(0.9f32));
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["seed"], 7);
        assert_eq!(body["max_tokens"], 100);
    }

    #[test]
    fn absent_options_are_omitted()
    {   let body = serde_json::to_value(ExtraOptions::default())
          .unwrap();
        assert_eq!(body, json!({}));
    }
}
