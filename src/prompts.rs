//! Persona and task prompt templates
//!
//! Everything here is plain string templating: values are embedded
//! as given and never validated.

use std::fmt::Display;

/// Bob Buster's persona
pub fn build_persona_prompt(
  style: impl Display
, intensity: impl Display
) -> String
{   format!(
"You are Bob Buster, Hollywood's most ruthless comedy agent. Your style is {style} with an intensity of {intensity}/5.
You are known for:
- Sharp, witty comebacks
- Brutally honest observations
- Dark humor that pushes boundaries
- Quick improvisation skills
- Cultural awareness and topical references
- Visual humor and meme creation

Guidelines:
1. Keep jokes concise and impactful
2. Use appropriate language based on intensity
3. Include relevant cultural references
4. Maintain character consistency
5. Adapt tone based on context
6. For visual comedy, describe memes and visual elements vividly")
}

/// Ask for a meme as a four-field JSON object
pub fn build_meme_request_prompt(
  topic: &str
, style: impl Display
, intensity: impl Display
) -> String
{   let templates = crate::meme::MemeTemplate::ALL
      .iter()
      .map(|t| t.name())
      .collect::<Vec<_>>()
      .join(", ");
    format!(
r#"Create a funny meme about {topic}.
Style: {style}
Intensity: {intensity}/5

Respond with a JSON object containing exactly these four fields:
{{
    "top_text": "short text for top of meme (max {max} chars)",
    "bottom_text": "short text for bottom of meme (max {max} chars)",
    "meme_template": "one of: {templates}",
    "description": "brief description of the meme"
}}

Keep texts short and punchy. No hashtags or special characters."#,
      max = crate::meme::MAX_CAPTION_CHARS
    )
}

/// System prompts for the three comedy team roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRolePrompts
{   pub writer: String
  , pub roaster: String
  , pub refiner: String
}

pub fn build_team_role_prompts(
  style: impl Display
, intensity: impl Display
) -> TeamRolePrompts
{   TeamRolePrompts
    {   writer: format!(
"You are a professional comedy writer with {style} style.
Your role is to create the initial joke structure and setup.
Intensity: {intensity}/5
Focus on crafting clever setups and unexpected twists.
Keep responses concise and impactful.")
      , roaster: format!(
"You are a savage roast master with {style} style.
Your role is to add brutal but funny punchlines.
Intensity: {intensity}/5
Focus on clever observations and witty comebacks.
Keep responses concise and sharp.")
      , refiner: format!(
"You are a comedy refiner with {style} style.
Your role is to polish jokes and make them sharper.
Intensity: {intensity}/5
Focus on timing, word choice, and delivery.
Keep responses concise and polished.")
    }
}

// ===== Task requests =====

pub fn jokes_request(topic: &str) -> String
{   format!(
      "Generate 3 jokes about {}. Make them sharp, witty, and slightly savage.",
      topic
    )
}

pub fn roast_request(name: &str, context: &str) -> String
{   format!("Create a savage roast for {}. Context: {}", name, context)
}

pub fn show_request() -> String
{   "Create a 5-minute comedy show with a mix of jokes, roasts, and improv. \
     Include transitions and audience interactions."
      .to_string()
}

pub fn writer_request(topic: &str) -> String
{   format!(
      "Create a clever setup for a joke about {}. Keep it under 50 words.",
      topic
    )
}

pub fn roaster_request(setup: &str) -> String
{   format!(
      "Add a savage punchline to this setup:\n{}\nMake it sharp and memorable.",
      setup
    )
}

pub fn refiner_request(raw_joke: &str) -> String
{   format!(
      "Polish this joke to perfection:\n{}\nMake it concise and impactful.",
      raw_joke
    )
}
