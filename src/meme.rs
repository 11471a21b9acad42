//! Meme templates, caption sanitization and image URLs
//!
//! URLs follow the memegen path scheme
//! `{base}/images/{slug}/{top}/{bottom}`. Nothing here is fetched.

use log::{debug, error};
use serde::Deserialize;
use std::fmt;
use url::Url;

use crate::config::check_service_url;
use crate::error::Error;

/// Caption length limit, in characters, after sanitization
pub const MAX_CAPTION_CHARS: usize = 50;

/// Public memegen host
pub const MEMEGEN_BASE: &str = "https://api.memegen.link";

const QUOTES: [char; 6] = ['\'', '"', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

/// The meme layouts Bob knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemeTemplate
{   #[default]
    Drake
  , Distracted
  , ChangeMyMind
  , TwoButtons
  , ExpandingBrain
  , ThisIsFine
  , Stonks
  , SurprisedPikachu
}

impl MemeTemplate
{   pub const ALL: [MemeTemplate; 8] = [
      MemeTemplate::Drake
    , MemeTemplate::Distracted
    , MemeTemplate::ChangeMyMind
    , MemeTemplate::TwoButtons
    , MemeTemplate::ExpandingBrain
    , MemeTemplate::ThisIsFine
    , MemeTemplate::Stonks
    , MemeTemplate::SurprisedPikachu
    ];

    /// Name used in prompts and on the command line
    pub fn name(self) -> &'static str
    {   match self
        {   MemeTemplate::Drake => "drake"
          , MemeTemplate::Distracted => "distracted"
          , MemeTemplate::ChangeMyMind => "change_my_mind"
          , MemeTemplate::TwoButtons => "two_buttons"
          , MemeTemplate::ExpandingBrain => "expanding_brain"
          , MemeTemplate::ThisIsFine => "this_is_fine"
          , MemeTemplate::Stonks => "stonks"
          , MemeTemplate::SurprisedPikachu => "surprised_pikachu"
        }
    }

    /// Path segment on the image service
    pub fn slug(self) -> &'static str
    {   match self
        {   MemeTemplate::Drake => "drake"
          , MemeTemplate::Distracted => "distracted"
          , MemeTemplate::ChangeMyMind => "changemy"
          , MemeTemplate::TwoButtons => "buttons"
          , MemeTemplate::ExpandingBrain => "brain"
          , MemeTemplate::ThisIsFine => "fine"
          , MemeTemplate::Stonks => "stonks"
          , MemeTemplate::SurprisedPikachu => "pikachu"
        }
    }

    /// Exact (case-insensitive) lookup
    pub fn parse(name: &str) -> Option<Self>
    {   let wanted = name.trim().to_lowercase();
        MemeTemplate::ALL
          .into_iter()
          .find(|t| t.name() == wanted)
    }

    /// Lookup that falls back to the default template
    pub fn from_name(name: &str) -> Self
    {   MemeTemplate::parse(name).unwrap_or_else(|| {
          debug!("Unknown meme template {:?}, using default", name);
          MemeTemplate::default()
        })
    }
}

impl fmt::Display for MemeTemplate
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.name())
    }
}

/// Prepare caption text for a URL path segment.
///
/// Idempotent: the output contains none of the characters the
/// substitutions act on.
pub fn sanitize_caption(text: &str) -> String
{   let stripped: String = text
      .chars()
      .filter(|c| !QUOTES.contains(c))
      .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
      .collect();
    let collapsed = stripped
      .split_whitespace()
      .collect::<Vec<_>>()
      .join(" ");

    let mut out = String::with_capacity(collapsed.len());
    for c in collapsed.chars()
    {   match c
        {   ' ' => out.push('-')
          , '?' => out.push_str("~q")
          , '/' => out.push_str("~s")
          , '#' => out.push_str("~h")
          , '&' => out.push_str("~a")
          , other => out.push(other)
        }
    }
    out
}

/// Sanitize, then cut to `MAX_CAPTION_CHARS` characters
pub fn caption_segment(text: &str) -> String
{   sanitize_caption(text)
      .chars()
      .take(MAX_CAPTION_CHARS)
      .collect()
}

/// URL of the placeholder shown when resolution fails
pub fn error_meme_url() -> String
{   format!(
      "{}/images/{}/Error/generating-meme",
      MEMEGEN_BASE,
      MemeTemplate::default().slug()
    )
}

/// The public memegen host as a parsed URL
pub fn memegen_base_url() -> Url
{   Url::parse(MEMEGEN_BASE).expect("memegen base URL must be valid")
}

/// Builds image URLs against one meme service host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemeService
{   base_url: Url
}

impl Default for MemeService
{   fn default() -> Self
    {   MemeService::new(memegen_base_url())
    }
}

impl MemeService
{   pub fn new(base_url: Url) -> Self
    {   MemeService { base_url }
    }

    /// Parse `base_url` and check it can host image paths
    pub fn parse(base_url: &str) -> Result<Self, Error>
    {   let url = Url::parse(base_url).map_err(|e| {
          Error::MemeResolution(format!(
            "invalid meme service URL {:?}: {}",
            base_url, e
          ))
        })?;
        check_service_url(&url).map_err(Error::MemeResolution)?;
        Ok(MemeService::new(url))
    }

    /// Resolve a template name and captions to an image URL.
    /// Never fails: errors degrade to `error_meme_url()`.
    pub fn resolve(
      &self
    , template_name: &str
    , top_text: &str
    , bottom_text: &str
    ) -> String
    {   self.try_resolve(
          MemeTemplate::from_name(template_name)
        , top_text
        , bottom_text
        )
        .unwrap_or_else(|e| {
          error!("{}", e);
          error_meme_url()
        })
    }

    pub fn try_resolve(
      &self
    , template: MemeTemplate
    , top_text: &str
    , bottom_text: &str
    ) -> Result<String, Error>
    {   check_service_url(&self.base_url).map_err(Error::MemeResolution)?;
        let top = blank_as_underscore(caption_segment(top_text));
        let bottom = blank_as_underscore(caption_segment(bottom_text));

        let mut url = self.base_url.clone();
        url.path_segments_mut()
          .map_err(|_| Error::MemeResolution(format!(
            "meme service URL cannot carry a path: {}",
            self.base_url
          )))?
          .pop_if_empty()
          .extend(["images", template.slug(), top.as_str(), bottom.as_str()]);
        Ok(url.into())
    }
}

/// memegen reads `_` as an empty line
fn blank_as_underscore(segment: String) -> String
{   if segment.is_empty()
    {   "_".to_string()
    } else
    {   segment
    }
}

/// Resolve against the public memegen host
pub fn resolve_meme_image_url(
  template_name: &str
, top_text: &str
, bottom_text: &str
) -> String
{   MemeService::default().resolve(template_name, top_text, bottom_text)
}

// ===== Model output =====

/// A meme as described by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemeSpec
{   pub top_text: String
  , pub bottom_text: String
  , pub template: MemeTemplate
  , pub description: String
}

#[derive(Deserialize)]
struct RawMemeSpec
{   top_text: String
  , bottom_text: String
  , meme_template: String
  , description: String
}

impl MemeSpec
{   /// Strictly decode the model's JSON answer. Surrounding
    /// whitespace and a Markdown code fence are tolerated; missing or
    /// non-string fields are not.
    pub fn from_model_output(text: &str) -> Result<Self, Error>
    {   let raw: RawMemeSpec
          = serde_json::from_str(strip_code_fence(text))?;
        Ok(MemeSpec
        {   top_text: raw.top_text
          , bottom_text: raw.bottom_text
          , template: MemeTemplate::from_name(&raw.meme_template)
          , description: raw.description
        })
    }
}

fn strip_code_fence(text: &str) -> &str
{   let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```")
    else
    {   return trimmed;
    };
    // drop the info string ("json") on the opening line; a fence
    // closed on the same line has none
    let body = match rest.split_once('\n')
    {   Some((_, body)) => body
      , None => rest
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// One rendered meme for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemeImage
{   pub url: String
  , pub caption: String
}
