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

//! SSH transport layer, powered by russh.
//!
//! The heart of this module is [`Client`]: one client per job, covering
//! connection, password authentication, command dispatch and teardown. The
//! channel pump in [`stream`] turns transport messages into the
//! [`CommandOutput`] events consumers receive.

pub mod client;
pub mod handler;
pub mod stream;

pub use client::Client;
pub use handler::ClientHandler;
pub use stream::{collect_output, CommandOutput, ExitStatus};
