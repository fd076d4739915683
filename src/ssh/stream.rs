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

//! Channel message pump: drives one exec channel to completion and turns
//! transport messages into [`CommandOutput`] events.

use std::fmt;

use russh::client::Msg;
use russh::{Channel, ChannelMsg, CryptoVec, Sig};
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::debug;

use crate::error::{Error, Result};

/// Terminal status the remote side reported for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    /// Command exited normally with this code (`$?` in a shell)
    Exited(u32),
    /// Command was terminated by a signal before it could exit
    Signaled {
        /// Signal name without the `SIG` prefix, e.g. `TERM`
        signal: String,
        core_dumped: bool,
    },
}

impl ExitStatus {
    /// Numeric exit code, when the command exited normally.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Exited(code) => Some(*code),
            Self::Signaled { .. } => None,
        }
    }

    /// Terminating signal name, when the command was signaled.
    pub fn signal_name(&self) -> Option<&str> {
        match self {
            Self::Exited(_) => None,
            Self::Signaled { signal, .. } => Some(signal),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exit code {code}"),
            Self::Signaled {
                signal,
                core_dumped: true,
            } => write!(f, "signal {signal} (core dumped)"),
            Self::Signaled { signal, .. } => write!(f, "signal {signal}"),
        }
    }
}

/// One streamed event from a running remote command.
///
/// Stdout and stderr chunks preserve per-stream order. Ordering across the
/// two streams follows transport arrival and may differ from the remote
/// interleaving.
pub enum CommandOutput {
    /// Chunk of the remote command's stdout
    StdOut(CryptoVec),
    /// Chunk of the remote command's stderr
    StdErr(CryptoVec),
    /// Final event: the command's reported exit status
    Exit(ExitStatus),
}

impl fmt::Debug for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StdOut(data) => write!(f, "StdOut({} bytes)", data.len()),
            Self::StdErr(data) => write!(f, "StdErr({} bytes)", data.len()),
            Self::Exit(status) => f.debug_tuple("Exit").field(status).finish(),
        }
    }
}

/// Pump an exec channel until the remote side closes it.
///
/// Output events are sent best-effort: when the receiver is dropped the
/// channel keeps draining so the command still runs to completion and its
/// exit status is still returned. The final [`CommandOutput::Exit`] event is
/// sent before this function returns.
pub(crate) async fn pump_channel(
    mut channel: Channel<Msg>,
    sender: &Sender<CommandOutput>,
) -> Result<ExitStatus> {
    let mut status: Option<ExitStatus> = None;
    let mut receiver_open = true;

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => {
                forward(sender, &mut receiver_open, CommandOutput::StdOut(data)).await;
            }
            // ext 1 is the stderr stream (RFC 4254 section 5.2); other
            // extended streams are not defined for exec and are dropped.
            ChannelMsg::ExtendedData { data, ext } => {
                if ext == 1 {
                    forward(sender, &mut receiver_open, CommandOutput::StdErr(data)).await;
                }
            }
            // Store the exit code but keep reading: this message does not
            // mean end of communications, output may still be in flight.
            ChannelMsg::ExitStatus { exit_status } => {
                status.get_or_insert(ExitStatus::Exited(exit_status));
            }
            ChannelMsg::ExitSignal {
                signal_name,
                core_dumped,
                error_message,
                ..
            } => {
                if !error_message.is_empty() {
                    debug!("remote signal message: {error_message}");
                }
                status = Some(ExitStatus::Signaled {
                    signal: sig_name(signal_name),
                    core_dumped,
                });
            }
            // EOF is not reliable here: RFC 4254 section 5.3 permits the
            // channel to close without it, so only wait() returning None
            // ends the loop.
            _ => {}
        }
    }

    let status = status.ok_or(Error::ExitStatusMissing)?;
    if receiver_open {
        let _ = sender.send(CommandOutput::Exit(status.clone())).await;
    }
    Ok(status)
}

async fn forward(sender: &Sender<CommandOutput>, receiver_open: &mut bool, event: CommandOutput) {
    if *receiver_open && sender.send(event).await.is_err() {
        debug!("output receiver dropped, draining remaining channel messages");
        *receiver_open = false;
    }
}

/// Drain an event stream to completion, accumulating output per stream.
///
/// Chunks stay in arrival order within each stream. Returns once the sender
/// side is dropped; [`CommandOutput::Exit`] events are ignored here because
/// the status travels through the executor's return value.
pub async fn collect_output(mut receiver: Receiver<CommandOutput>) -> (Vec<u8>, Vec<u8>) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while let Some(event) = receiver.recv().await {
        match event {
            CommandOutput::StdOut(data) => stdout.extend_from_slice(&data),
            CommandOutput::StdErr(data) => stderr.extend_from_slice(&data),
            CommandOutput::Exit(_) => {}
        }
    }
    (stdout, stderr)
}

/// Signal name as reported in outcomes, without the `SIG` prefix.
///
/// Signals outside the RFC 4254 list (USR2 included) arrive as
/// [`Sig::Custom`] and keep the name the server sent.
fn sig_name(sig: Sig) -> String {
    match sig {
        Sig::ABRT => "ABRT".to_string(),
        Sig::ALRM => "ALRM".to_string(),
        Sig::FPE => "FPE".to_string(),
        Sig::HUP => "HUP".to_string(),
        Sig::ILL => "ILL".to_string(),
        Sig::INT => "INT".to_string(),
        Sig::KILL => "KILL".to_string(),
        Sig::PIPE => "PIPE".to_string(),
        Sig::QUIT => "QUIT".to_string(),
        Sig::SEGV => "SEGV".to_string(),
        Sig::TERM => "TERM".to_string(),
        Sig::USR1 => "USR1".to_string(),
        Sig::Custom(name) => name,
    }
}
