//! Where guidance text goes.

use async_trait::async_trait;
use tokio::io::{self, AsyncWriteExt};
use tokio::sync::mpsc;

/// The contract every output channel implements.
///
/// `emit` carries guidance for the driver; `notice` carries operator feedback such as
/// rejected commands.
#[async_trait]
pub trait GuidanceSink: Send {
    async fn emit(&mut self, line: &str) -> io::Result<()>;

    async fn notice(&mut self, line: &str) -> io::Result<()>;
}

/// Guidance on stdout, mirrored to stderr; notices on stderr only.
#[derive(Debug, Default)]
pub struct StdioSink;

#[async_trait]
impl GuidanceSink for StdioSink {
    async fn emit(&mut self, line: &str) -> io::Result<()> {
        let text = format!("{line}\n");
        let mut stderr = io::stderr();
        stderr.write_all(text.as_bytes()).await?;
        stderr.flush().await?;

        let mut stdout = io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await
    }

    async fn notice(&mut self, line: &str) -> io::Result<()> {
        let mut stderr = io::stderr();
        stderr.write_all(format!("{line}\n").as_bytes()).await?;
        stderr.flush().await
    }
}

/// A line delivered through a [`ChannelSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Guidance(String),
    Notice(String),
}

/// Forwards every line into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Output>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Output>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, output: Output) -> io::Result<()> {
        self.tx
            .send(output)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "guidance receiver dropped"))
    }
}

#[async_trait]
impl GuidanceSink for ChannelSink {
    async fn emit(&mut self, line: &str) -> io::Result<()> {
        self.send(Output::Guidance(line.to_string()))
    }

    async fn notice(&mut self, line: &str) -> io::Result<()> {
        self.send(Output::Notice(line.to_string()))
    }
}
