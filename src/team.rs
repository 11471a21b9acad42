//! Comedy team: writer, roaster and refiner models in series

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::config::{DEFAULT_MODEL, FAST_MODEL};
use crate::error::Error;
use crate::failover::CompletionGateway;
use crate::prompts;
use crate::request::{ExtraOptions, PromptMessage, Substitution};

pub const WRITER_MAX_TOKENS: u32 = 100;
pub const ROASTER_MAX_TOKENS: u32 = 150;
pub const REFINER_MAX_TOKENS: u32 = 200;

/// Model per pipeline role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelAssignment
{   /// Fast, creative setup generation
    pub writer: String
  , /// Punchlines
    pub roaster: String
  , /// Final polish
    pub refiner: String
}

impl Default for ModelAssignment
{   fn default() -> Self
    {   ModelAssignment
        {   writer: FAST_MODEL.to_string()
          , roaster: DEFAULT_MODEL.to_string()
          , refiner: "llama3-70b-8192".to_string()
        }
    }
}

impl ModelAssignment
{   /// `(role, model)` in pipeline order
    pub fn roles(&self) -> [(&'static str, &str); 3]
    {   [ ("writer", self.writer.as_str())
        , ("roaster", self.roaster.as_str())
        , ("refiner", self.refiner.as_str())
        ]
    }
}

/// Output of one team run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult
{   pub setup: String
  , pub raw_joke: String
  , pub final_joke: String
  , pub models_used: ModelAssignment
  , /// Fallbacks that stood in during the run
    pub substitutions: Vec<Substitution>
}

pub struct TeamPipeline
{   gateway: CompletionGateway
  , models: ModelAssignment
}

impl TeamPipeline
{   pub fn new(
      gateway: CompletionGateway
    , models: ModelAssignment
    ) -> Self
    {   TeamPipeline { gateway, models }
    }

    /// Run the three stages in order. The first unrecovered failure
    /// aborts the run; earlier stage output is dropped.
    pub async fn run(
      &self
    , topic: &str
    , style: impl Display
    , intensity: impl Display
    , temperature: f32
    ) -> Result<PipelineResult, Error>
    {   info!("Comedy team working on: {}", topic);
        let personas = prompts::build_team_role_prompts(style, intensity);
        let mut substitutions = Vec::new();

        let stages = self
          .run_stages(topic, personas, temperature, &mut substitutions)
          .await;

        match stages
        {   Ok((setup, raw_joke, final_joke)) => Ok(PipelineResult
            {   setup
              , raw_joke
              , final_joke
              , models_used: self.models.clone()
              , substitutions
            })
          , Err(e) => {
              error!("Comedy team aborted: {}", e);
              Err(Error::TeamPipeline(Box::new(e)))
            }
        }
    }

    async fn run_stages(
      &self
    , topic: &str
    , personas: prompts::TeamRolePrompts
    , temperature: f32
    , substitutions: &mut Vec<Substitution>
    ) -> Result<(String, String, String), Error>
    {   let setup = self.stage(
          personas.writer
        , prompts::writer_request(topic)
        , &self.models.writer
        , WRITER_MAX_TOKENS
        , temperature
        , substitutions
        ).await?;
        let raw_joke = self.stage(
          personas.roaster
        , prompts::roaster_request(&setup)
        , &self.models.roaster
        , ROASTER_MAX_TOKENS
        , temperature
        , substitutions
        ).await?;
        let final_joke = self.stage(
          personas.refiner
        , prompts::refiner_request(&raw_joke)
        , &self.models.refiner
        , REFINER_MAX_TOKENS
        , temperature
        , substitutions
        ).await?;
        Ok((setup, raw_joke, final_joke))
    }

    async fn stage(
      &self
    , persona: String
    , instruction: String
    , model: &str
    , max_tokens: u32
    , temperature: f32
    , substitutions: &mut Vec<Substitution>
    ) -> Result<String, Error>
    {   debug!("Team stage on {}", model);
        let completion = self.gateway
          .complete(
            vec![
              PromptMessage::system(persona)
            , PromptMessage::user(instruction)
            ]
          , model
          , temperature
          , max_tokens
          , ExtraOptions::default()
          )
          .await?;
        substitutions.extend(completion.substitution);
        Ok(completion.text)
    }
}
