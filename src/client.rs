use tokio::sync::mpsc;
use log::{debug, error, info};

use crate::comedian::{Comedian, MemeBatch};
use crate::config::ComedySettings;
use crate::error::Error;
use crate::meme::MemeTemplate;
use crate::request::Completion;
use crate::team::PipelineResult;

pub type TextReply = Result<Completion, Error>;
pub type MemesReply = Result<MemeBatch, Error>;
pub type TeamReply = Result<PipelineResult, Error>;
pub type UnitReply = Result<(), Error>;

/// Commands served by the backend task
pub enum BackendCommand
{   Jokes
    {   topic: String
      , reply: mpsc::UnboundedSender<TextReply>
    }
  , Roast
    {   name: String
      , context: String
      , reply: mpsc::UnboundedSender<TextReply>
    }
  , Show
    {   reply: mpsc::UnboundedSender<TextReply>
    }
  , Memes
    {   topic: String
      , template: Option<MemeTemplate>
      , count: Option<u8>
      , reply: mpsc::UnboundedSender<MemesReply>
    }
  , Team
    {   topic: String
      , reply: mpsc::UnboundedSender<TeamReply>
    }
  , UpdateSettings
    {   settings: ComedySettings
      , reply: mpsc::UnboundedSender<UnitReply>
    }
  , Shutdown
    {   reply: mpsc::UnboundedSender<UnitReply>
    }
}

/// Handle to the comedy backend - owns the task.
///
/// Built once at startup and handed to whatever front-end drives it.
/// Commands are served one at a time, each to completion.
pub struct ComedyBackend
{   tx: mpsc::UnboundedSender<BackendCommand>
  , _task_handle: tokio::task::JoinHandle<()>
}

impl ComedyBackend
{   /// Spawn the backend task around `comedian`.
    /// Returns immediately.
    pub fn new(comedian: Comedian) -> Self
    {   debug!("Creating ComedyBackend with task ownership");
        let (tx, rx) = mpsc::unbounded_channel();
        let _task_handle = tokio::spawn(async move {
          run_backend_loop(rx, comedian).await
        });
        ComedyBackend
        {   tx
          , _task_handle
        }
    }

    fn queue(&self, cmd: BackendCommand) -> Result<(), Error>
    {   self.tx.send(cmd).map_err(|_| {
          error!("Backend channel closed");
          Error::Other("Backend disconnected".to_string())
        })
    }

    /// Queue a jokes request - returns almost immediately
    pub async fn jokes(
      &self
    , topic: String
    ) -> Result<mpsc::UnboundedReceiver<TextReply>, Error>
    {   debug!("jokes queuing command");
        let (reply, reply_rx) = mpsc::unbounded_channel();
        self.queue(BackendCommand::Jokes { topic, reply })?;
        Ok(reply_rx)
    }

    /// Queue a roast request
    pub async fn roast(
      &self
    , name: String
    , context: String
    ) -> Result<mpsc::UnboundedReceiver<TextReply>, Error>
    {   debug!("roast queuing command");
        let (reply, reply_rx) = mpsc::unbounded_channel();
        self.queue(BackendCommand::Roast { name, context, reply })?;
        Ok(reply_rx)
    }

    /// Queue a comedy show request
    pub async fn show(
      &self
    ) -> Result<mpsc::UnboundedReceiver<TextReply>, Error>
    {   debug!("show queuing command");
        let (reply, reply_rx) = mpsc::unbounded_channel();
        self.queue(BackendCommand::Show { reply })?;
        Ok(reply_rx)
    }

    /// Queue a meme request
    pub async fn memes(
      &self
    , topic: String
    , template: Option<MemeTemplate>
    , count: Option<u8>
    ) -> Result<mpsc::UnboundedReceiver<MemesReply>, Error>
    {   debug!("memes queuing command");
        let (reply, reply_rx) = mpsc::unbounded_channel();
        self.queue(BackendCommand::Memes
        {   topic
          , template
          , count
          , reply
        })?;
        Ok(reply_rx)
    }

    /// Queue a comedy team run
    pub async fn team(
      &self
    , topic: String
    ) -> Result<mpsc::UnboundedReceiver<TeamReply>, Error>
    {   debug!("team queuing command");
        let (reply, reply_rx) = mpsc::unbounded_channel();
        self.queue(BackendCommand::Team { topic, reply })?;
        Ok(reply_rx)
    }

    /// Replace the session settings for later commands
    pub async fn update_settings(
      &self
    , settings: ComedySettings
    ) -> Result<mpsc::UnboundedReceiver<UnitReply>, Error>
    {   debug!("update_settings queuing command");
        let (reply, reply_rx) = mpsc::unbounded_channel();
        self.queue(BackendCommand::UpdateSettings { settings, reply })?;
        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self) -> Result<(), Error>
    {   debug!("Shutting down ComedyBackend");
        let (reply, mut reply_rx) = mpsc::unbounded_channel();
        self.tx
          .send(BackendCommand::Shutdown { reply })
          .map_err(|_| {
            error!("Backend channel already closed");
            Error::Other("Backend already shutdown".to_string())
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend shutdown timeout");
            Err(Error::Timeout)
        }
    }
}

/// Main backend event loop
async fn run_backend_loop(
  mut rx: mpsc::UnboundedReceiver<BackendCommand>
, mut comedian: Comedian
)
{   debug!("Starting ComedyBackend event loop");
    loop
    { match rx.recv().await
      {   Some(BackendCommand::Jokes { topic, reply }) => {
            debug!("Processing Jokes");
            let _ = reply.send(comedian.jokes(&topic).await);
          }
        , Some(BackendCommand::Roast { name, context, reply }) => {
            debug!("Processing Roast");
            let _ = reply.send(comedian.roast(&name, &context).await);
          }
        , Some(BackendCommand::Show { reply }) => {
            debug!("Processing Show");
            let _ = reply.send(comedian.show().await);
          }
        , Some(BackendCommand::Memes {
            topic, template, count, reply
          }) => {
            debug!("Processing Memes");
            let result = comedian
              .memes(&topic, template, count)
              .await;
            let _ = reply.send(result);
          }
        , Some(BackendCommand::Team { topic, reply }) => {
            debug!("Processing Team");
            let _ = reply.send(comedian.team(&topic).await);
          }
        , Some(BackendCommand::UpdateSettings { settings, reply }) => {
            debug!("Processing UpdateSettings");
            let _ = reply.send(comedian.set_settings(settings));
          }
        , Some(BackendCommand::Shutdown { reply }) => {
            let _ = reply.send(Ok(()));
            info!("ComedyBackend shutting down");
            break;
          }
        , None => {
            debug!("Command channel closed");
            break;
          }
      }
    }
}
