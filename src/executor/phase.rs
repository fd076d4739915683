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

use std::fmt;

/// Position of one invocation in its lifecycle.
///
/// An invocation moves strictly forward:
/// `Idle -> Connecting -> Authenticating -> ChannelOpen -> Streaming ->
/// Closing -> Done`. A failure in any phase skips ahead to teardown and the
/// error surfaces after the transport is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Job accepted but no network activity yet
    Idle,
    /// TCP + SSH transport establishment in progress
    Connecting,
    /// Password exchange in progress
    Authenticating,
    /// Session channel open, command not yet dispatched
    ChannelOpen,
    /// Command dispatched, output flowing
    Streaming,
    /// Transport teardown in progress
    Closing,
    /// Terminal state, transport released
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Connecting => "connecting",
            Phase::Authenticating => "authenticating",
            Phase::ChannelOpen => "channel-open",
            Phase::Streaming => "streaming",
            Phase::Closing => "closing",
            Phase::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_ordering_is_lifecycle_order() {
        assert!(Phase::Idle < Phase::Connecting);
        assert!(Phase::Connecting < Phase::Authenticating);
        assert!(Phase::Authenticating < Phase::ChannelOpen);
        assert!(Phase::ChannelOpen < Phase::Streaming);
        assert!(Phase::Streaming < Phase::Closing);
        assert!(Phase::Closing < Phase::Done);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::ChannelOpen.to_string(), "channel-open");
        assert_eq!(Phase::Done.to_string(), "done");
    }
}
