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

//! Job descriptor: one command, one host, one user.

use std::fmt;

use serde::{Deserialize, Deserializer};
use tracing::warn;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Maximum hostname length per RFC 1035.
pub const MAX_HOST_LEN: usize = 253;

/// Maximum accepted username length.
pub const MAX_USERNAME_LEN: usize = 64;

/// Maximum accepted command length (64 KiB).
pub const MAX_COMMAND_LEN: usize = 64 * 1024;

/// Command substrings that are legal but worth flagging before dispatch.
const DANGEROUS_PATTERNS: &[&str] = &["rm -rf /", "mkfs.", "dd if=/dev/"];

fn deserialize_password<'de, D>(deserializer: D) -> std::result::Result<Zeroizing<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Zeroizing::new)
}

/// A single remote command execution request.
///
/// Deserialized from the one-shot JSON payload. The password lives in a
/// [`Zeroizing`] buffer that is wiped on drop, and it is excluded from both
/// `Debug` and `Display` output.
#[derive(Deserialize)]
pub struct Job {
    /// Hostname or IP address of the target
    pub host: String,
    /// SSH port
    pub port: u16,
    /// User to authenticate as
    pub username: String,
    /// Password for `username`
    #[serde(deserialize_with = "deserialize_password")]
    pub password: Zeroizing<String>,
    /// Shell command line to hand to the remote default shell
    pub command: String,
}

impl Job {
    /// Create a job from its parts. Used by library callers; the worker
    /// binary deserializes jobs from the stdin payload instead.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: Zeroizing::new(password.into()),
            command: command.into(),
        }
    }

    /// Check every field before any network I/O happens.
    ///
    /// A job that fails here is rejected with [`Error::MalformedJob`] and the
    /// executor guarantees no connection attempt was made for it.
    pub fn validate(&self) -> Result<()> {
        validate_host(&self.host)?;
        if self.port == 0 {
            return Err(Error::malformed("port must be non-zero"));
        }
        validate_username(&self.username)?;
        if self.password.is_empty() {
            return Err(Error::malformed("password must not be empty"));
        }
        validate_command(&self.command)?;
        Ok(())
    }

    /// Host form suitable for socket address resolution.
    ///
    /// `ToSocketAddrs` on a `(host, port)` pair rejects bracketed IPv6
    /// literals, so brackets from the payload are stripped here.
    pub fn dial_host(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host)
    }

    /// `host:port` for log output, bracketing bare IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.address())
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("command", &self.command)
            .finish()
    }
}

fn validate_host(host: &str) -> Result<()> {
    if host.is_empty() {
        return Err(Error::malformed("host must not be empty"));
    }
    if host.len() > MAX_HOST_LEN {
        return Err(Error::malformed(format!(
            "host exceeds maximum length of {MAX_HOST_LEN} characters"
        )));
    }

    // Bracketed IPv6 literal, e.g. [::1]
    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.')
        {
            return Err(Error::malformed(format!("invalid IPv6 address: {host}")));
        }
        return Ok(());
    }

    // Bare IPv6 literals keep their colons; hostnames get the DNS rules.
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == ':')
    {
        return Err(Error::malformed(format!(
            "host contains invalid characters: {host}"
        )));
    }
    if host.contains("..") {
        return Err(Error::malformed(format!(
            "host contains consecutive dots: {host}"
        )));
    }
    for segment in host.split('.') {
        if segment.starts_with('-') || segment.ends_with('-') {
            return Err(Error::malformed(format!(
                "host segment starts or ends with a hyphen: {host}"
            )));
        }
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::malformed("username must not be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(Error::malformed(format!(
            "username exceeds maximum length of {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.chars().any(|c| c.is_control()) {
        return Err(Error::malformed("username contains control characters"));
    }
    Ok(())
}

fn validate_command(command: &str) -> Result<()> {
    if command.is_empty() {
        return Err(Error::malformed("command must not be empty"));
    }
    if command.len() > MAX_COMMAND_LEN {
        return Err(Error::malformed(format!(
            "command exceeds maximum length of {MAX_COMMAND_LEN} bytes"
        )));
    }
    if command.contains('\0') {
        return Err(Error::malformed("command contains null bytes"));
    }
    // The command is the caller's business; flag the obviously destructive
    // ones without rejecting them.
    for pattern in DANGEROUS_PATTERNS {
        if command.contains(pattern) {
            warn!("potentially destructive command pattern detected: {pattern}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job::new("example.com", 22, "deploy", "secret", "uptime")
    }

    #[test]
    fn test_job_display_and_address() {
        let job = sample_job();
        assert_eq!(job.to_string(), "deploy@example.com:22");
        assert_eq!(job.address(), "example.com:22");

        let v6 = Job::new("::1", 2222, "root", "pw", "true");
        assert_eq!(v6.address(), "[::1]:2222");
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", sample_job());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_dial_host_strips_brackets() {
        let job = Job::new("[::1]", 22, "root", "pw", "true");
        assert_eq!(job.dial_host(), "::1");
        assert_eq!(sample_job().dial_host(), "example.com");
    }

    #[test]
    fn test_validate_accepts_reasonable_jobs() {
        assert!(sample_job().validate().is_ok());
        assert!(Job::new("10.0.0.7", 2222, "root", "pw", "ls -la").validate().is_ok());
        assert!(Job::new("::1", 22, "root", "pw", "true").validate().is_ok());
        assert!(Job::new("[fe80::1]", 22, "root", "pw", "true").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_hosts() {
        assert!(Job::new("", 22, "u", "p", "c").validate().is_err());
        assert!(Job::new("a".repeat(254), 22, "u", "p", "c").validate().is_err());
        assert!(Job::new("host with spaces", 22, "u", "p", "c").validate().is_err());
        assert!(Job::new("host..double", 22, "u", "p", "c").validate().is_err());
        assert!(Job::new("-leading.hyphen", 22, "u", "p", "c").validate().is_err());
        assert!(Job::new("[not-an-address]", 22, "u", "p", "c").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_usernames() {
        assert!(Job::new("h", 22, "", "p", "c").validate().is_err());
        assert!(Job::new("h", 22, "u".repeat(65), "p", "c").validate().is_err());
        assert!(Job::new("h", 22, "user\x07", "p", "c").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_password() {
        assert!(Job::new("h", 22, "u", "", "c").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_commands() {
        assert!(Job::new("h", 22, "u", "p", "").validate().is_err());
        assert!(Job::new("h", 22, "u", "p", "echo \0").validate().is_err());
        let oversized = "x".repeat(MAX_COMMAND_LEN + 1);
        assert!(Job::new("h", 22, "u", "p", oversized).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        assert!(Job::new("h", 0, "u", "p", "c").validate().is_err());
    }

    #[test]
    fn test_deserialize_full_payload() {
        let job: Job = serde_json::from_str(
            r#"{"host":"example.com","port":2222,"username":"u","password":"p","command":"uptime"}"#,
        )
        .unwrap();
        assert_eq!(job.port, 2222);
        assert_eq!(&*job.password, "p");
    }

    #[test]
    fn test_deserialize_rejects_missing_port() {
        // All five fields are required; port does not default to 22.
        let result: std::result::Result<Job, _> = serde_json::from_str(
            r#"{"host":"example.com","username":"u","password":"p","command":"uptime"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rejects_missing_field() {
        let result: std::result::Result<Job, _> =
            serde_json::from_str(r#"{"host":"example.com","username":"u","password":"p"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_port() {
        let result: std::result::Result<Job, _> = serde_json::from_str(
            r#"{"host":"h","port":70000,"username":"u","password":"p","command":"c"}"#,
        );
        assert!(result.is_err());
    }
}
