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

//! SSH session client for one-shot command execution.
//!
//! One [`Client`] serves exactly one job: connect, authenticate once with a
//! password, run one command, disconnect. There is no pooling and no session
//! reuse; dropping the client after [`Client::disconnect`] releases all
//! transport state.

use std::io;
use std::sync::Arc;

use russh::client::{self, Config, Handle};
use tokio::sync::mpsc::Sender;
use tracing::debug;

use super::handler::ClientHandler;
use super::stream::{self, CommandOutput, ExitStatus};
use crate::error::{Error, Result};

/// An established SSH transport connection, not yet authenticated.
pub struct Client {
    handle: Handle<ClientHandler>,
    host: String,
    port: u16,
    username: String,
}

impl Client {
    /// Open the transport connection to `host:port`.
    ///
    /// When the host resolves to multiple addresses each one is attempted in
    /// order and the first successful connection wins, the same way
    /// `std::net::TcpStream::connect` walks its address list. No
    /// authentication happens here.
    pub async fn connect(host: &str, dial_host: &str, port: u16, username: &str) -> Result<Self> {
        let config = Arc::new(Config::default());

        let socket_addrs = tokio::net::lookup_host((dial_host, port))
            .await
            .map_err(Error::AddressInvalid)?;

        let mut connect_res: Result<Handle<ClientHandler>> =
            Err(Error::AddressInvalid(io::Error::new(
                io::ErrorKind::InvalidInput,
                "could not resolve to any addresses",
            )));
        for socket_addr in socket_addrs {
            debug!(host, %socket_addr, "attempting connection");
            let handler = ClientHandler::new(host);
            match client::connect(config.clone(), socket_addr, handler).await {
                Ok(handle) => {
                    connect_res = Ok(handle);
                    break;
                }
                Err(e) => connect_res = Err(e),
            }
        }

        let handle = connect_res.map_err(|e| match e {
            Error::Ssh(source) => Error::ConnectFailed {
                host: host.to_string(),
                port,
                source,
            },
            other => other,
        })?;

        Ok(Self {
            handle,
            host: host.to_string(),
            port,
            username: username.to_string(),
        })
    }

    /// Authenticate with the password, consuming it from the caller's buffer.
    ///
    /// On rejection the transport is torn down before the error is returned;
    /// the rejected password never appears in the error or in any log line.
    pub async fn authenticate(&mut self, password: &str) -> Result<()> {
        let auth_result = self
            .handle
            .authenticate_password(self.username.as_str(), password)
            .await?;
        if !auth_result.success() {
            let _ = self
                .handle
                .disconnect(russh::Disconnect::ByApplication, "", "")
                .await;
            return Err(Error::AuthFailed {
                username: self.username.clone(),
                host: self.host.clone(),
            });
        }
        debug!(username = %self.username, host = %self.host, "authenticated");
        Ok(())
    }

    /// Run `command` on the remote host, streaming output events to `sender`.
    ///
    /// Returns the remote exit status once the channel closes. Each client
    /// executes at most one command.
    pub async fn execute_streaming(
        &self,
        command: &str,
        sender: &Sender<CommandOutput>,
    ) -> Result<ExitStatus> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(Error::ChannelOpenFailed)?;
        channel
            .exec(true, command)
            .await
            .map_err(Error::ChannelOpenFailed)?;
        debug!(host = %self.host, "command dispatched");

        stream::pump_channel(channel, sender).await
    }

    /// Close the transport. Consumes the client so a session cannot be torn
    /// down twice or used after teardown.
    pub async fn disconnect(self) -> Result<()> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await?;
        Ok(())
    }

    /// Whether the underlying session has shut down.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("handle", &"Handle<ClientHandler>")
            .finish()
    }
}
