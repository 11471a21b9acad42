use bobbuster::config::{api_key_from_env, BobConfig};
use bobbuster::{
  ComedyBackend, ComedyStyle, Comedian, Completion, Error, MemeTemplate,
};
use clap::{Parser, Subcommand};
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "bobbuster")]
#[command(version)]
#[command(
  about = "Bob Buster - Hollywood's most ruthless AI comedy agent"
, long_about = None
)]
struct Cli
{   /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>
  , /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8
  , /// Comedy style, e.g. "Dark Humor" or dark-humor
    #[arg(long, global = true)]
    style: Option<ComedyStyle>
  , /// Roast intensity (1-5)
    #[arg(long, global = true)]
    intensity: Option<u8>
  , /// Creativity level (0.0-1.0)
    #[arg(long, global = true)]
    temperature: Option<f32>
  , /// Response length in tokens (100-1000)
    #[arg(long, global = true)]
    max_tokens: Option<u32>
  , #[command(subcommand)]
    command: Commands
}

#[derive(Subcommand)]
enum Commands
{   /// Three jokes about a topic
    Jokes
    {   topic: String
    }
  , /// Roast somebody
    Roast
    {   name: String
      , /// Something Bob should know about them
        #[arg(long, default_value = "")]
        context: String
    }
  , /// A five-minute comedy show
    Show
  , /// Meme image URLs about a topic
    Memes
    {   topic: String
      , /// Meme template (omit to let Bob pick)
        #[arg(short, long, value_parser = parse_template)]
        template: Option<MemeTemplate>
      , /// Number of memes (1-5)
        #[arg(short = 'n', long)]
        count: Option<u8>
    }
  , /// Writer, roaster and refiner models working one joke
    Team
    {   topic: String
      , /// Print the setup and raw joke as well
        #[arg(long)]
        show_process: bool
      , /// Print the model behind each role
        #[arg(long)]
        show_models: bool
    }
}

fn parse_template(s: &str) -> Result<MemeTemplate, String>
{   MemeTemplate::parse(s).ok_or_else(|| {
      let known: Vec<_> = MemeTemplate::ALL
        .iter()
        .map(|t| t.name())
        .collect();
      format!(
        "unknown template {:?} (expected one of: {})",
        s, known.join(", ")
      )
    })
}

fn init_logging(verbose: u8)
{   let level = match verbose
    {   0 => "warn"
      , 1 => "debug"
      , _ => "trace"
    };
    env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or(level)
    ).init();
}

/// Config file (or defaults) with command-line overrides applied
fn load_config(cli: &Cli) -> Result<BobConfig, Error>
{   let mut config = match &cli.config
    {   Some(path) => BobConfig::from_file(path)?
      , None => BobConfig::default()
    };
    let settings = &mut config.settings;
    if let Some(style) = cli.style
    {   settings.style = style;
    }
    if let Some(intensity) = cli.intensity
    {   settings.intensity = intensity;
    }
    if let Some(temperature) = cli.temperature
    {   settings.temperature = temperature;
    }
    if let Some(max_tokens) = cli.max_tokens
    {   settings.max_tokens = max_tokens;
    }
    config.validate()?;
    Ok(config)
}

fn warn_user(message: impl std::fmt::Display)
{   eprintln!("warning: {}", message);
}

async fn recv<T>(
  mut rx: mpsc::UnboundedReceiver<Result<T, Error>>
) -> Result<T, Error>
{   rx.recv().await.unwrap_or_else(|| {
      Err(Error::Other("Backend disconnected".to_string()))
    })
}

async fn run(cli: Cli) -> Result<(), Error>
{   let config = load_config(&cli)?;
    let api_key = api_key_from_env()?;
    let backend = ComedyBackend::new(
      Comedian::from_config(&config, api_key)?
    );
    debug!("Backend ready");

    let outcome = dispatch(&backend, cli.command).await;
    backend.shutdown().await?;
    outcome
}

async fn dispatch(
  backend: &ComedyBackend
, command: Commands
) -> Result<(), Error>
{   match command
    {   Commands::Jokes { topic } => {
          print_completion(recv(backend.jokes(topic).await?).await?);
        }
      , Commands::Roast { name, context } => {
          print_completion(
            recv(backend.roast(name, context).await?).await?
          );
        }
      , Commands::Show => {
          print_completion(recv(backend.show().await?).await?);
        }
      , Commands::Memes { topic, template, count } => {
          let batch = recv(
            backend.memes(topic, template, count).await?
          ).await?;
          for notice in &batch.notices
          {   warn_user(notice);
          }
          for image in &batch.images
          {   println!("{}", image.url);
              if !image.caption.is_empty()
              {   println!("  {}", image.caption);
              }
          }
        }
      , Commands::Team { topic, show_process, show_models } => {
          let result = recv(backend.team(topic).await?).await?;
          for sub in &result.substitutions
          {   warn_user(sub);
          }
          if show_process
          {   println!("### Initial Setup ({})", result.models_used.writer);
              println!("{}\n", result.setup);
              println!("### Raw Joke ({})", result.models_used.roaster);
              println!("{}\n", result.raw_joke);
              println!(
                "### Final Polished Version ({})",
                result.models_used.refiner
              );
          } else
          {   println!("### Final Joke");
          }
          println!("{}", result.final_joke);
          if show_models
          {   println!("\n### Models Used");
              for (role, model) in result.models_used.roles()
              {   println!("{}: {}", role, model);
              }
          }
        }
    }
    Ok(())
}

fn print_completion(completion: Completion)
{   if let Some(sub) = &completion.substitution
    {   warn_user(sub);
    }
    println!("{}", completion.text);
}

#[tokio::main]
async fn main() -> ExitCode
{   let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await
    {   Ok(()) => ExitCode::SUCCESS
      , Err(e) => {
          eprintln!("{}", e);
          ExitCode::FAILURE
        }
    }
}
