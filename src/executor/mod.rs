// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! One-shot execution driver.
//!
//! [`Executor`] owns the lifecycle of a single job: validate, connect,
//! authenticate, run the command while streaming its output, tear down. Jobs
//! are independent; running another job means calling the executor again
//! with a fresh [`Job`], never reusing a session.

mod outcome;
mod phase;

pub use outcome::Outcome;
pub use phase::Phase;

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc::{self, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::job::Job;
use crate::ssh::client::Client;
use crate::ssh::stream::{self, CommandOutput, ExitStatus};

/// Default connection readiness timeout, covering transport establishment
/// and authentication together.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 20;

/// Capacity of the streaming output channel.
pub const STREAM_CHANNEL_CAPACITY: usize = 1000;

/// Drives single jobs through their full lifecycle.
///
/// The executor itself is reusable and cheap to clone; all per-job state
/// lives inside one call to [`run`](Self::run) or
/// [`run_streaming`](Self::run_streaming).
#[derive(Debug, Clone)]
pub struct Executor {
    connect_timeout: Duration,
    command_timeout: Option<Duration>,
    cancel_token: CancellationToken,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            command_timeout: None,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Set the execution deadline in seconds.
    ///
    /// `None` or `Some(0)` leave the command unlimited; the deadline starts
    /// at command dispatch, not at connection time.
    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.command_timeout = match timeout {
            Some(secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => None,
        };
        self
    }

    /// Set the connection readiness timeout in seconds. The window covers
    /// connect and authentication together. `None` or `Some(0)` keep the
    /// default of [`DEFAULT_CONNECT_TIMEOUT_SECS`].
    pub fn with_connect_timeout(mut self, connect_timeout: Option<u64>) -> Self {
        if let Some(secs) = connect_timeout {
            if secs > 0 {
                self.connect_timeout = Duration::from_secs(secs);
            }
        }
        self
    }

    /// Attach an external cancellation token. Cancelling it aborts the job
    /// at whatever phase it is in, after transport teardown.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Token that cancels jobs run by this executor.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Run one job, streaming output events into `sender` as they arrive.
    ///
    /// Returns the remote exit status. The final [`CommandOutput::Exit`]
    /// event is also sent through `sender` before this returns, and the
    /// sender is dropped so the receiver observes end of stream. A dropped
    /// receiver never aborts the command.
    ///
    /// Output delivered before a failure is not retracted: partial output
    /// plus an error is a valid combined result for the caller.
    pub async fn run_streaming(
        &self,
        job: Job,
        sender: Sender<CommandOutput>,
    ) -> Result<ExitStatus> {
        job.validate()?;
        if self.cancel_token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        info!(target = %job, "starting execution");

        let client = tokio::select! {
            _ = self.cancel_token.cancelled() => {
                info!(host = %job.host, "cancelled during connection setup");
                return Err(Error::Cancelled);
            }
            ready = tokio::time::timeout(self.connect_timeout, self.establish(&job)) => {
                match ready {
                    Ok(Ok(client)) => client,
                    Ok(Err(e)) => return Err(e),
                    Err(_) => {
                        return Err(Error::ConnectTimedOut {
                            host: job.host.clone(),
                            port: job.port,
                            timeout: self.connect_timeout,
                        })
                    }
                }
            }
        };

        debug!(phase = %Phase::Streaming, host = %job.host, "executing command");
        let status = tokio::select! {
            _ = self.cancel_token.cancelled() => {
                info!(host = %job.host, "cancelled while command was running");
                Err(Error::Cancelled)
            }
            res = with_deadline(
                self.command_timeout,
                client.execute_streaming(&job.command, &sender),
            ) => res,
        };

        // Teardown runs exactly once, on success and failure alike.
        debug!(phase = %Phase::Closing, host = %job.host, "closing connection");
        if let Err(e) = client.disconnect().await {
            warn!(host = %job.host, error = %e, "connection teardown reported an error");
        }
        debug!(phase = %Phase::Done, host = %job.host, "session finished");

        if let Ok(status) = &status {
            info!(host = %job.host, status = %status, "command completed");
        }
        status
    }

    /// Run one job and capture its full output in memory.
    ///
    /// Streaming callers should prefer [`run_streaming`](Self::run_streaming);
    /// this buffers everything and only returns once the command finished.
    pub async fn run(&self, job: Job) -> Result<Outcome> {
        let host = job.host.clone();
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        // Drain concurrently so a command larger than the channel capacity
        // cannot deadlock against its own collector.
        let collector = tokio::spawn(stream::collect_output(rx));

        let status = self.run_streaming(job, tx).await;
        let (stdout, stderr) = collector.await.unwrap_or_default();
        let status = status?;

        Ok(Outcome {
            host,
            stdout,
            stderr,
            status,
        })
    }

    async fn establish(&self, job: &Job) -> Result<Client> {
        debug!(phase = %Phase::Connecting, address = %job.address(), "establishing transport");
        let mut client = Client::connect(&job.host, job.dial_host(), job.port, &job.username).await?;
        debug!(phase = %Phase::Authenticating, username = %job.username, "authenticating");
        client.authenticate(&job.password).await?;
        Ok(client)
    }
}

async fn with_deadline<F>(limit: Option<Duration>, fut: F) -> Result<ExitStatus>
where
    F: Future<Output = Result<ExitStatus>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(res) => res,
            Err(_) => Err(Error::DeadlineExceeded(limit)),
        },
        None => fut.await,
    }
}
