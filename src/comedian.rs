//! Bob Buster's acts: the core behind each interactive panel

use log::{debug, info, warn};
use std::sync::Arc;

use crate::config::{validate_meme_count, BobConfig, ComedySettings, ModelCatalog};
use crate::error::Error;
use crate::failover::CompletionGateway;
use crate::meme::{MemeImage, MemeService, MemeSpec, MemeTemplate};
use crate::prompts;
use crate::providers::{CompletionApi, GroqClient};
use crate::request::{Completion, ExtraOptions, PromptMessage, Substitution};
use crate::team::{PipelineResult, TeamPipeline};

/// Nucleus sampling used by the text acts
pub const TEXT_TOP_P: f32 = 0.9;

/// Memes produced for one request, plus anything worth telling
/// the user about how they were produced
#[derive(Debug, Clone, PartialEq)]
pub struct MemeBatch
{   pub images: Vec<MemeImage>
  , /// Human-readable notes on degraded output
    pub notices: Vec<String>
  , pub substitution: Option<Substitution>
}

pub struct Comedian
{   gateway: CompletionGateway
  , team: TeamPipeline
  , memes: MemeService
  , models: ModelCatalog
  , settings: ComedySettings
}

impl Comedian
{   /// Wire a comedian to an existing completion provider
    pub fn new(
      api: Arc<dyn CompletionApi>
    , config: &BobConfig
    ) -> Self
    {   let gateway = CompletionGateway::new(api, config.fallbacks.clone())
          .with_timeout(config.timeout());
        Comedian
        {   team: TeamPipeline::new(gateway.clone(), config.team.clone())
          , gateway
          , memes: MemeService::new(config.meme_base_url.clone())
          , models: config.models.clone()
          , settings: config.settings.clone()
        }
    }

    /// Comedian backed by the Groq HTTP API
    pub fn from_config(
      config: &BobConfig
    , api_key: String
    ) -> Result<Self, Error>
    {   config.validate()?;
        let client = GroqClient::new(
          api_key
        , config.api_base.clone()
        , Some(config.timeout())
        )?;
        Ok(Comedian::new(Arc::new(client), config))
    }

    pub fn settings(&self) -> &ComedySettings
    {   &self.settings
    }

    pub fn set_settings(
      &mut self
    , settings: ComedySettings
    ) -> Result<(), Error>
    {   settings.validate()?;
        debug!("Updating comedy settings: {:?}", settings);
        self.settings = settings;
        Ok(())
    }

    /// Three jokes about `topic`
    pub async fn jokes(&self, topic: &str) -> Result<Completion, Error>
    {   let topic = required("topic", topic)?;
        info!("Generating jokes about: {}", topic);
        self.perform(prompts::jokes_request(topic)).await
    }

    /// A personal roast; `context` may be empty
    pub async fn roast(
      &self
    , name: &str
    , context: &str
    ) -> Result<Completion, Error>
    {   let name = required("name", name)?;
        info!("Roasting: {}", name);
        self.perform(prompts::roast_request(name, context.trim())).await
    }

    /// A five-minute comedy show
    pub async fn show(&self) -> Result<Completion, Error>
    {   info!("Starting comedy show");
        self.perform(prompts::show_request()).await
    }

    /// `count` memes about `topic` (session default when `None`).
    /// `template` forces a layout; `None` lets the model pick.
    ///
    /// Only invalid input is an error. Remote and parse failures
    /// come back as a single fallback meme with a notice.
    pub async fn memes(
      &self
    , topic: &str
    , template: Option<MemeTemplate>
    , count: Option<u8>
    ) -> Result<MemeBatch, Error>
    {   let topic = required("topic", topic)?;
        let count = count.unwrap_or(self.settings.meme_count);
        validate_meme_count(count).map_err(|e| match e
        {   Error::InvalidConfiguration(msg) => Error::InvalidInput(msg)
          , other => other
        })?;
        info!("Generating {} meme(s) about: {}", count, topic);

        let messages = vec![
          PromptMessage::system(self.persona())
        , PromptMessage::user(prompts::build_meme_request_prompt(
            topic
          , self.settings.style
          , self.settings.intensity
          ))
        ];
        let completion = self.gateway
          .complete(
            messages
          , &self.models.default
          , self.settings.temperature
          , self.settings.max_tokens
          , ExtraOptions::default().with_json_output()
          )
          .await;

        let completion = match completion
        {   Ok(c) => c
          , Err(e) => {
              warn!("Meme request failed: {}", e);
              let image = self.fallback_meme(
                MemeTemplate::Drake
              , "When Groq API"
              , "Throws an error"
              , "API Error Fallback"
              );
              return Ok(MemeBatch
              {   images: vec![image]
                , notices: vec![format!("Error with Groq API: {}", e)]
                , substitution: None
              });
            }
        };

        let mut notices = Vec::new();
        if let Some(sub) = &completion.substitution
        {   notices.push(sub.to_string());
        }

        let images = match MemeSpec::from_model_output(&completion.text)
        {   Ok(spec) => {
              let chosen = template.unwrap_or(spec.template);
              let url = self.memes.resolve(
                chosen.name()
              , &spec.top_text
              , &spec.bottom_text
              );
              (0..count)
                .map(|_| MemeImage
                {   url: url.clone()
                  , caption: spec.description.clone()
                })
                .collect()
            }
          , Err(e) => {
              warn!("Meme data unusable: {}", e);
              notices.push(
                "Failed to parse meme data. Using a simplified meme instead."
                  .to_string()
              );
              vec![self.fallback_meme(
                template.unwrap_or_default()
              , "When the meme"
              , "Doesn't generate properly"
              , "Fallback meme"
              )]
            }
        };

        Ok(MemeBatch
        {   images
          , notices
          , substitution: completion.substitution
        })
    }

    /// Writer, roaster and refiner working the same topic
    pub async fn team(&self, topic: &str) -> Result<PipelineResult, Error>
    {   let topic = required("topic", topic)?;
        self.team
          .run(
            topic
          , self.settings.style
          , self.settings.intensity
          , self.settings.temperature
          )
          .await
    }

    fn persona(&self) -> String
    {   prompts::build_persona_prompt(
          self.settings.style
        , self.settings.intensity
        )
    }

    async fn perform(&self, request: String) -> Result<Completion, Error>
    {   self.gateway
          .complete(
            vec![
              PromptMessage::system(self.persona())
            , PromptMessage::user(request)
            ]
          , &self.models.default
          , self.settings.temperature
          , self.settings.max_tokens
          , ExtraOptions::default().with_top_p(TEXT_TOP_P)
          )
          .await
    }

    fn fallback_meme(
      &self
    , template: MemeTemplate
    , top: &str
    , bottom: &str
    , caption: &str
    ) -> MemeImage
    {   MemeImage
        {   url: self.memes.resolve(template.name(), top, bottom)
          , caption: caption.to_string()
        }
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, Error>
{   let value = value.trim();
    if value.is_empty()
    {   Err(Error::InvalidInput(format!("please enter a {}", field)))
    } else
    {   Ok(value)
    }
}
