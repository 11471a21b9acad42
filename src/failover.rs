//! Model fallback and the completion gateway

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::providers::CompletionApi;
use crate::request::{
  normalize_messages, ChatRequest, Completion, ExtraOptions,
  PromptMessage, Substitution,
};

/// Primary model -> single fallback model. One level only:
/// a fallback's own entry is never consulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackTable
{   entries: HashMap<String, String>
}

impl FallbackTable
{   pub fn new(entries: HashMap<String, String>) -> Self
    {   FallbackTable { entries }
    }

    /// Register `fallback` for `primary`, replacing any previous entry
    pub fn insert(
      &mut self
    , primary: impl Into<String>
    , fallback: impl Into<String>
    )
    {   self.entries.insert(primary.into(), fallback.into());
    }

    pub fn fallback_for(&self, model: &str) -> Option<&str>
    {   self.entries.get(model).map(String::as_str)
    }

    pub fn len(&self) -> usize
    {   self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.entries.is_empty()
    }
}

/// Single entry point to the remote completion capability.
///
/// Cloning is cheap; clones share the provider handle.
#[derive(Clone)]
pub struct CompletionGateway
{   api: Arc<dyn CompletionApi>
  , fallbacks: FallbackTable
  , timeout: Option<Duration>
}

impl CompletionGateway
{   pub fn new(
      api: Arc<dyn CompletionApi>
    , fallbacks: FallbackTable
    ) -> Self
    {   debug!(
          "Creating gateway with {} fallback entries",
          fallbacks.len()
        );
        CompletionGateway
        {   api
          , fallbacks
          , timeout: None
        }
    }

    /// Bound every remote call by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self
    {   self.timeout = Some(timeout);
        self
    }

    /// Run one completion, falling back once if the primary model
    /// fails and a fallback is registered for it.
    pub async fn complete(
      &self
    , messages: Vec<PromptMessage>
    , model: &str
    , temperature: f32
    , max_tokens: u32
    , options: ExtraOptions
    ) -> Result<Completion, Error>
    {   let mut request = ChatRequest
        {   model: model.to_string()
          , messages: normalize_messages(messages)
          , temperature
          , max_tokens
          , options
        };

        let primary_error = match self.dispatch(&request).await
        {   Ok(text) => {
              return Ok(Completion
              {   text
                , model: request.model
                , substitution: None
              });
            }
          , Err(e) => e
        };

        let Some(fallback) = self.fallbacks.fallback_for(model)
        else
        {   error!("Model {} failed, no fallback: {}", model, primary_error);
            return Err(primary_error);
        };

        let substitution = Substitution
        {   requested: model.to_string()
          , used: fallback.to_string()
        };
        warn!("{}", substitution);
        request.model = fallback.to_string();

        match self.dispatch(&request).await
        {   Ok(text) => Ok(Completion
            {   text
              , model: request.model
              , substitution: Some(substitution)
            })
          , Err(fallback_error) => {
              error!(
                "Fallback model {} also failed: {}",
                fallback, fallback_error
              );
              Err(Error::FallbackExhausted
              {   primary: Box::new(primary_error)
                , fallback: Box::new(fallback_error)
              })
            }
        }
    }

    async fn dispatch(
      &self
    , request: &ChatRequest
    ) -> Result<String, Error>
    {   debug!("Dispatching to model: {}", request.model);
        match self.timeout
        {   Some(limit) => {
              tokio::time::timeout(limit, self.api.chat(request))
                .await
                .map_err(|_| Error::Timeout)?
            }
          , None => self.api.chat(request).await
        }
    }
}
