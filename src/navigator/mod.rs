//! The navigation scheduler.
//!
//! A single task multiplexes everything: the background action cycle, operator
//! commands, and the highway timer. Each loop iteration waits on whichever comes
//! first, the next command line or the current phase's deadline, and all state is
//! mutated only between those waits.
//!
//! ```text
//! Idle -> Starting -> Settling -> Polling -> Settling -> ...
//!                         \          |
//!                          +---> Highway ---> (new target) ---> Settling
//! ```

mod command;
mod cycle;

pub use command::{forward_lines, Command};
pub use cycle::{ActionCycle, CycleEnd};

use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::action::{Action, ALL_ACTIONS, IMMEDIATE_ACTIONS};
use crate::config::NavigatorConfig;
use crate::error::Result;
use crate::fusion::HeadingReader;
use crate::messages;
use crate::output::GuidanceSink;
use crate::selector::{choose_action, helpfulness, quality};
use crate::target::TargetStore;

/// Where the scheduler currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Waiting for the first heading.
    Idle,
    /// Start announced; the first action follows at `until`.
    Starting { until: Instant },
    /// `action` announced; polling begins at `until`.
    Settling { action: Action, until: Instant },
    Polling(ActionCycle),
    /// Background cycling suspended.
    Highway(Highway),
}

/// Highway mode state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highway {
    /// End of the current segment; `None` once the driver has been told to exit.
    pub until: Option<Instant>,
}

pub struct Navigator<S> {
    config: NavigatorConfig,
    headings: HeadingReader,
    target: TargetStore,
    sink: S,
    rng: StdRng,
    phase: Phase,
}

impl<S: GuidanceSink> Navigator<S> {
    pub fn new(
        config: NavigatorConfig,
        headings: HeadingReader,
        target: TargetStore,
        sink: S,
        rng: StdRng,
    ) -> Self {
        Self {
            config,
            headings,
            target,
            sink,
            rng,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target(&self) -> &TargetStore {
        &self.target
    }

    /// Runs until the command channel closes.
    ///
    /// Commands are only read once sensor fusion has produced a heading; lines sent
    /// earlier wait in the channel.
    pub async fn run(mut self, mut commands: mpsc::Receiver<String>) -> Result<()> {
        tracing::info!("Directions started");
        self.headings.wait_ready().await?;
        self.start().await?;

        loop {
            let wake = self.next_wake();
            tokio::select! {
                line = commands.recv() => match line {
                    Some(line) => self.handle_line(&line).await?,
                    None => {
                        tracing::info!("Command input closed");
                        return Ok(());
                    }
                },
                () = sleep_until_opt(wake) => self.on_timer().await?,
            }
        }
    }

    /// Announces the start and arms the initial delay.
    pub async fn start(&mut self) -> Result<()> {
        for line in messages::START {
            self.sink.emit(line).await?;
        }
        let delay = self.config.start_delay.sample(&mut self.rng);
        self.phase = Phase::Starting {
            until: Instant::now() + self.config.scaled(delay),
        };
        Ok(())
    }

    /// When the current phase next needs attention; `None` means only a command can
    /// move it forward.
    pub fn next_wake(&self) -> Option<Instant> {
        match self.phase {
            Phase::Idle => None,
            Phase::Starting { until } | Phase::Settling { until, .. } => Some(until),
            Phase::Polling(cycle) => Some(cycle.next_poll()),
            Phase::Highway(highway) => highway.until,
        }
    }

    /// Advances whatever phase is due.
    pub async fn on_timer(&mut self) -> Result<()> {
        let now = Instant::now();
        match self.phase {
            Phase::Starting { until } if now >= until => self.begin_action().await?,
            Phase::Settling { action, until } if now >= until => {
                let timeout = self.config.action_timeout.sample(&mut self.rng);
                tracing::debug!(%action, timeout, "polling started");
                self.phase = Phase::Polling(ActionCycle::new(
                    action,
                    now,
                    self.config.scaled(timeout),
                    self.config.scaled(self.config.poll_interval),
                ));
            }
            Phase::Polling(mut cycle) if now >= cycle.next_poll() => {
                let target = self.target.current();
                let ended = match self.headings.current() {
                    Some(heading) => cycle.tick(quality(&target, heading.as_vector()), now),
                    None => {
                        cycle.skip(now);
                        None
                    }
                };
                match ended {
                    Some(end) => {
                        tracing::info!(
                            action = %cycle.action(),
                            ?end,
                            polls = cycle.polls(),
                            "Action over"
                        );
                        self.begin_action().await?;
                    }
                    None => {
                        tracing::trace!(score = cycle.score(), "poll");
                        self.phase = Phase::Polling(cycle);
                    }
                }
            }
            Phase::Highway(Highway { until: Some(until) }) if now >= until => {
                self.sink.emit(messages::HIGHWAY_EXIT_PROMPT).await?;
                self.phase = Phase::Highway(Highway { until: None });
            }
            _ => {}
        }
        Ok(())
    }

    /// Dispatches one line from the operator.
    pub async fn handle_line(&mut self, line: &str) -> Result<()> {
        let command = Command::parse(line);
        if let Phase::Highway(highway) = self.phase {
            return self.handle_highway_command(highway, command).await;
        }
        match command {
            Command::Immediate => self.emit_immediate().await,
            Command::Change => {
                self.change_target();
                Ok(())
            }
            Command::Highway => self.enter_highway().await,
            other => self.reject(&other).await,
        }
    }

    async fn handle_highway_command(&mut self, highway: Highway, command: Command) -> Result<()> {
        match command {
            Command::Immediate => self.emit_immediate().await,
            Command::New if highway.until.is_some() => {
                tracing::info!("New highway");
                self.phase = Phase::Highway(Highway {
                    until: Some(self.highway_deadline()),
                });
                Ok(())
            }
            Command::New | Command::Exit => self.leave_highway().await,
            other => self.reject(&other).await,
        }
    }

    /// Chooses and announces the next background action.
    async fn begin_action(&mut self) -> Result<()> {
        let now = Instant::now();
        let target = self.target.current();
        let choice = match self.headings.current() {
            Some(heading) => choose_action(&mut self.rng, &ALL_ACTIONS, &heading, &target)
                .map(|action| (action, helpfulness(action, &heading, &target))),
            None => None,
        };
        let Some((action, gain)) = choice else {
            tracing::debug!("no heading, retrying after one poll interval");
            self.phase = Phase::Starting {
                until: now + self.config.scaled(self.config.poll_interval),
            };
            return Ok(());
        };

        tracing::info!(%action, helpfulness = gain, "Next action");
        let text = messages::render(&mut self.rng, action);
        self.sink.emit(text).await?;

        let delay = self.config.action_initial_delay.sample(&mut self.rng);
        self.phase = Phase::Settling {
            action,
            until: now + self.config.scaled(delay),
        };
        Ok(())
    }

    /// Picks left or right for the operator; the background cycle is left alone.
    async fn emit_immediate(&mut self) -> Result<()> {
        let Some(heading) = self.headings.current() else {
            tracing::warn!("immediate direction requested before any heading");
            return Ok(());
        };
        let target = self.target.current();
        if let Some(action) = choose_action(&mut self.rng, &IMMEDIATE_ACTIONS, &heading, &target) {
            tracing::info!(%action, "Immediate action");
            self.sink.emit(messages::render_immediate(action)).await?;
        }
        Ok(())
    }

    fn change_target(&mut self) {
        if let Err(e) = self.target.change() {
            tracing::warn!(error = %e, "Could not persist new target, keeping the current one");
        }
    }

    async fn enter_highway(&mut self) -> Result<()> {
        match self.phase {
            Phase::Settling { action, .. } => tracing::info!(%action, "Action cancelled."),
            Phase::Polling(cycle) => {
                tracing::info!(action = %cycle.action(), score = cycle.score(), "Action cancelled.")
            }
            _ => {}
        }
        self.phase = Phase::Highway(Highway {
            until: Some(self.highway_deadline()),
        });

        for line in messages::HIGHWAY_STARTED {
            self.sink.emit(line).await?;
        }
        Ok(())
    }

    async fn leave_highway(&mut self) -> Result<()> {
        self.sink.emit(messages::HIGHWAY_STOPPED).await?;
        self.change_target();
        self.begin_action().await
    }

    async fn reject(&mut self, command: &Command) -> Result<()> {
        tracing::debug!(%command, "unknown command");
        self.sink.notice(messages::UNKNOWN_COMMAND).await?;
        Ok(())
    }

    fn highway_deadline(&mut self) -> Instant {
        let duration = self.config.highway_duration.sample(&mut self.rng);
        Instant::now() + self.config.scaled(duration)
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
