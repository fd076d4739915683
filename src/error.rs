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

//! Error taxonomy for a single execution attempt.
//!
//! Every variant is terminal for the invocation: there is no retry at any
//! stage, and the transport is torn down (when one exists) before the error
//! reaches the caller. Output already streamed before a failure is not
//! retracted; partial output plus an error is a valid combined outcome.

use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::executor::Phase;

/// Errors surfaced by one job invocation.
///
/// Password material never appears in any variant or its `Display` output.
#[derive(Debug, Error)]
pub enum Error {
    /// The job failed validation; no network I/O was attempted
    #[error("malformed job: {0}")]
    MalformedJob(String),

    /// The input payload exceeded the size bound before it was parsed
    #[error("payload too large: stopped after {read} bytes (max {max})")]
    PayloadTooLarge { read: usize, max: usize },

    /// Reading the input payload failed before any network activity
    #[error("failed to read payload: {0}")]
    PayloadRead(#[source] io::Error),

    /// `host:port` did not resolve to any usable socket address
    #[error("invalid address: {0}")]
    AddressInvalid(#[source] io::Error),

    /// The transport connection could not be established
    #[error("connection to {host}:{port} failed: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: russh::Error,
    },

    /// Session establishment plus authentication exceeded the readiness timeout
    #[error("connection to {host}:{port} timed out after {timeout:?}")]
    ConnectTimedOut {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// The server rejected the password for this user
    #[error("authentication failed for {username}@{host}")]
    AuthFailed { username: String, host: String },

    /// The session authenticated but no execution channel could be opened
    #[error("failed to open execution channel: {0}")]
    ChannelOpenFailed(#[source] russh::Error),

    /// Reading the output streams failed after the channel opened
    #[error("remote stream failed: {0}")]
    StreamFailed(#[source] russh::Error),

    /// The channel closed without reporting an exit code or signal
    #[error("channel closed without an exit status")]
    ExitStatusMissing,

    /// The caller cancelled the invocation
    #[error("execution cancelled")]
    Cancelled,

    /// The caller-supplied execution deadline elapsed
    #[error("command did not complete within {0:?}")]
    DeadlineExceeded(Duration),

    /// SSH protocol error outside a classified stage
    #[error("ssh error: {0}")]
    Ssh(#[from] russh::Error),
}

/// Result type for execution operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedJob(msg.into())
    }

    /// The latest state-machine phase in which this error can arise.
    pub fn phase(&self) -> Phase {
        match self {
            Self::MalformedJob(_) | Self::PayloadTooLarge { .. } | Self::PayloadRead(_) => {
                Phase::Idle
            }
            Self::AddressInvalid(_) | Self::ConnectFailed { .. } => Phase::Connecting,
            Self::ConnectTimedOut { .. } | Self::AuthFailed { .. } => Phase::Authenticating,
            Self::ChannelOpenFailed(_) => Phase::ChannelOpen,
            Self::StreamFailed(_)
            | Self::ExitStatusMissing
            | Self::Cancelled
            | Self::DeadlineExceeded(_)
            | Self::Ssh(_) => Phase::Streaming,
        }
    }

    /// Whether this error is one of the two time-based outcomes.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimedOut { .. } | Self::DeadlineExceeded(_)
        )
    }
}
