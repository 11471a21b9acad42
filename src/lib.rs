pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod failover;
pub mod prompts;
pub mod meme;
pub mod team;
pub mod comedian;
pub mod client;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/*

bobbuster: Bob Buster, Hollywood's most ruthless AI comedy agent.

All the comedy comes from hosted chat-completion models; this crate
builds the prompts, talks to the API with a one-level model fallback,
turns meme answers into image URLs and runs the three-model comedy
team.

bobbuster/
├── src/
│   ├── lib.rs          # Re-exports and shared enums
│   ├── error.rs        # Error type
│   ├── config.rs       # Models, fallbacks, comedy settings
│   ├── request.rs      # Messages, request bodies, completions
│   ├── providers/      # CompletionApi trait and the Groq client
│   ├── failover.rs     # Fallback table and completion gateway
│   ├── prompts.rs      # Persona and task templates
│   ├── meme.rs         # Meme templates and image URLs
│   ├── team.rs         # Writer -> roaster -> refiner pipeline
│   ├── comedian.rs     # The five acts
│   ├── client.rs       # Backend task and its handle
│   └── main.rs         # Command line front-end
└── tests/

*/

pub use client::ComedyBackend;
pub use comedian::{Comedian, MemeBatch};
pub use config::{BobConfig, ComedySettings};
pub use error::Error;
pub use failover::{CompletionGateway, FallbackTable};
pub use meme::{MemeImage, MemeService, MemeSpec, MemeTemplate};
pub use request::{Completion, ExtraOptions, PromptMessage, Role};
pub use team::{ModelAssignment, PipelineResult, TeamPipeline};

/// Comedy styles Bob can work in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum ComedyStyle
{   #[default]
    #[serde(rename = "Savage Roast")]
    SavageRoast
  , #[serde(rename = "Witty One-liner")]
    WittyOneLiner
  , #[serde(rename = "Dark Humor")]
    DarkHumor
  , #[serde(rename = "Sarcastic")]
    Sarcastic
  , #[serde(rename = "Improv")]
    Improv
  , #[serde(rename = "Visual Comedy")]
    VisualComedy
}

impl ComedyStyle
{   pub const ALL: [ComedyStyle; 6] = [
      ComedyStyle::SavageRoast
    , ComedyStyle::WittyOneLiner
    , ComedyStyle::DarkHumor
    , ComedyStyle::Sarcastic
    , ComedyStyle::Improv
    , ComedyStyle::VisualComedy
    ];

    /// Label embedded in prompts
    pub fn label(self) -> &'static str
    {   match self
        {   ComedyStyle::SavageRoast => "Savage Roast"
          , ComedyStyle::WittyOneLiner => "Witty One-liner"
          , ComedyStyle::DarkHumor => "Dark Humor"
          , ComedyStyle::Sarcastic => "Sarcastic"
          , ComedyStyle::Improv => "Improv"
          , ComedyStyle::VisualComedy => "Visual Comedy"
        }
    }
}

impl fmt::Display for ComedyStyle
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.label())
    }
}

impl FromStr for ComedyStyle
{   type Err = Error;

    /// Accepts the label or a kebab/snake form, any case
    /// ("dark humor", "dark-humor", "DARK_HUMOR")
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   let wanted = normalize_label(s);
        ComedyStyle::ALL
          .into_iter()
          .find(|style| normalize_label(style.label()) == wanted)
          .ok_or_else(|| {
            let known = ComedyStyle::ALL
              .iter()
              .map(|s| s.label())
              .collect::<Vec<_>>()
              .join(", ");
            Error::InvalidInput(format!(
              "unknown comedy style {:?} (expected one of: {})",
              s, known
            ))
          })
    }
}

fn normalize_label(s: &str) -> String
{   s.trim()
      .chars()
      .map(|c| if c == '-' || c == '_' { ' ' } else { c.to_ascii_lowercase() })
      .collect()
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn style_parses_loosely()
    {   assert_eq!("dark-humor".parse::<ComedyStyle>(), Ok(ComedyStyle::DarkHumor));
        assert_eq!("WITTY_ONE-LINER".parse::<ComedyStyle>(), Ok(ComedyStyle::WittyOneLiner));
        assert_eq!("Savage Roast".parse::<ComedyStyle>(), Ok(ComedyStyle::SavageRoast));
        assert!("slapstick".parse::<ComedyStyle>().is_err());
    }

    #[test]
    fn style_serializes_as_label()
    {   let json = serde_json::to_string(&ComedyStyle::VisualComedy).unwrap();
        assert_eq!(json, r#""Visual Comedy""#);
    }
}
