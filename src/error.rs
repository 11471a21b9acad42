use std::fmt;

/// Error type for every bobbuster operation
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq)]
pub enum Error
{   /// API key is missing from the environment
    MissingApiKey(String)
  , /// HTTP transport error
    HttpError(String)
  , /// API returned a non-success status
    ApiError
    {   status: u16
      , message: String
    }
  , /// Rate limit exceeded (HTTP 429)
    RateLimitExceeded
  , /// Requested model is unknown or decommissioned
    ModelUnavailable(String)
  , /// Failed to parse API response
    ParseError(String)
  , /// No choices in API response
    NoChoicesInResponse
  , /// Remote call did not finish within the configured timeout
    Timeout
  , /// Primary and fallback model both failed
    FallbackExhausted
    {   primary: Box<Error>
      , fallback: Box<Error>
    }
  , /// Model output did not match the expected JSON contract
    ResponseParse(String)
  , /// Meme URL could not be built
    MemeResolution(String)
  , /// A team pipeline stage failed
    TeamPipeline(Box<Error>)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Rejected user input
    InvalidInput(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// True for failures of the remote completion capability,
    /// including an exhausted fallback.
    pub fn is_remote(&self) -> bool
    {   matches!(
          self
        , Error::MissingApiKey(_)
          | Error::HttpError(_)
          | Error::ApiError { .. }
          | Error::RateLimitExceeded
          | Error::ModelUnavailable(_)
          | Error::ParseError(_)
          | Error::NoChoicesInResponse
          | Error::Timeout
          | Error::FallbackExhausted { .. }
        )
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingApiKey(var) => {
              write!(f, "Missing API key: set {}", var)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError { status, message } => {
              write!(f, "API error ({}): {}", status, message)
            }
          , Error::RateLimitExceeded => {
              write!(f, "API rate limit exceeded")
            }
          , Error::ModelUnavailable(model) => {
              write!(f, "Model unavailable: {}", model)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoChoicesInResponse => {
              write!(f, "API response contained no choices")
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::FallbackExhausted { primary, fallback } => {
              write!(f,
                "Primary error: {}. Fallback error: {}",
                primary, fallback
              )
            }
          , Error::ResponseParse(msg) => {
              write!(f, "Failed to parse model output: {}", msg)
            }
          , Error::MemeResolution(msg) => {
              write!(f, "Error generating meme: {}", msg)
            }
          , Error::TeamPipeline(cause) => {
              write!(f,
                "Error in comedy team generation: {}",
                cause
              )
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::InvalidInput(msg) => {
              write!(f, "Invalid input: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::ResponseParse(e.to_string())
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn fallback_exhausted_names_both_causes()
    {   let err = Error::FallbackExhausted
        {   primary: Box::new(Error::RateLimitExceeded)
          , fallback: Box::new(Error::Timeout)
        };
        let msg = err.to_string();
        assert!(msg.contains("API rate limit exceeded"));
        assert!(msg.contains("Request timed out"));
        assert!(err.is_remote());
    }

    #[test]
    fn local_errors_are_not_remote()
    {   assert!(!Error::ResponseParse("x".into()).is_remote());
        assert!(!Error::InvalidInput("x".into()).is_remote());
        assert!(!Error::MemeResolution("x".into()).is_remote());
    }
}
