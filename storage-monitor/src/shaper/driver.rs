// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use storage_types::FileEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ChangeEventShaper, ShaperConfig};
use crate::error::{MonitorError, Result};

#[derive(Debug)]
enum Command {
    Feed(FileEvent),
    SetRateLimit(Duration),
}

/// Handle to a shaper running on its own tokio task.
///
/// Raw events go in through [`feed`](Self::feed); shaped events come out of
/// the receiver returned by [`spawn`](Self::spawn). Dropping the handle
/// cancels the task together with any armed timer.
#[derive(Debug)]
pub struct FileMonitor {
    commands: mpsc::UnboundedSender<Command>,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl FileMonitor {
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: ShaperConfig) -> (Self, mpsc::UnboundedReceiver<FileEvent>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (events, event_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        let task = tokio::spawn(run(
            ChangeEventShaper::new(config),
            command_rx,
            events,
            cancel_token.clone(),
        ));

        (
            Self {
                commands,
                cancel_token,
                task,
            },
            event_rx,
        )
    }

    pub fn feed(&self, event: FileEvent) -> Result<()> {
        self.send(Command::Feed(event))
    }

    pub fn set_rate_limit(&self, rate_limit: Duration) -> Result<()> {
        self.send(Command::SetRateLimit(rate_limit))
    }

    fn send(&self, command: Command) -> Result<()> {
        // the task may not have seen the cancellation yet
        if self.cancel_token.is_cancelled() {
            return Err(MonitorError::Cancelled);
        }
        self.commands
            .send(command)
            .map_err(|_| MonitorError::Cancelled)
    }

    /// Stop the task. Nothing is emitted afterwards, including armed timers.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for FileMonitor {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        self.task.abort();
    }
}

async fn run(
    mut shaper: ChangeEventShaper,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<FileEvent>,
    cancel_token: CancellationToken,
) {
    loop {
        let deadline = shaper.next_deadline();
        let wake = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(Instant::from_std(at)).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => break,

            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                match command {
                    Command::Feed(event) => shaper.feed(event, Instant::now().into_std()),
                    Command::SetRateLimit(limit) => shaper.set_rate_limit(limit),
                }
            }

            _ = wake => shaper.fire_due(Instant::now().into_std()),
        }

        for event in shaper.drain_events() {
            if events.send(event).is_err() {
                debug!("Shaped event receiver dropped, stopping file monitor");
                return;
            }
        }
    }

    shaper.cancel();
}
