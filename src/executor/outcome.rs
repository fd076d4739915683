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

use crate::ssh::stream::ExitStatus;

/// Captured result of one completed command.
///
/// Produced by [`Executor::run`](crate::executor::Executor::run); callers who
/// need output as it arrives use the streaming path instead and never build
/// one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Host the command ran on
    pub host: String,
    /// Raw stdout bytes
    pub stdout: Vec<u8>,
    /// Raw stderr bytes
    pub stderr: Vec<u8>,
    /// Exit code or terminating signal reported by the remote side
    pub status: ExitStatus,
}

impl Outcome {
    /// Stdout as a string, with invalid UTF-8 replaced.
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Stderr as a string, with invalid UTF-8 replaced.
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
