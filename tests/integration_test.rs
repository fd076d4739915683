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

//! End-to-end tests against a real SSH server.
//!
//! These run only when a target accepting password authentication is
//! provided through the environment:
//!
//! ```sh
//! REXEC_TEST_HOST=127.0.0.1 REXEC_TEST_USER=dev REXEC_TEST_PASSWORD=dev \
//!     cargo test --test integration_test
//! ```
//!
//! `REXEC_TEST_PORT` is optional and defaults to 22. Without the variables
//! every test skips itself.

use std::time::{Duration, Instant};

use rexec::ssh::Client;
use rexec::{Error, Executor, ExitStatus, Job};

struct TestTarget {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl TestTarget {
    fn job(&self, command: &str) -> Job {
        Job::new(
            self.host.clone(),
            self.port,
            self.username.clone(),
            self.password.clone(),
            command,
        )
    }
}

fn test_target() -> Option<TestTarget> {
    let host = std::env::var("REXEC_TEST_HOST").ok()?;
    let username = std::env::var("REXEC_TEST_USER").ok()?;
    let password = std::env::var("REXEC_TEST_PASSWORD").ok()?;
    let port = std::env::var("REXEC_TEST_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(22);
    Some(TestTarget {
        host,
        port,
        username,
        password,
    })
}

macro_rules! require_target {
    ($name:expr) => {
        match test_target() {
            Some(target) => target,
            None => {
                eprintln!(
                    "Skipping {}: REXEC_TEST_HOST/USER/PASSWORD not set",
                    $name
                );
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_exit_code_zero_on_success() {
    let target = require_target!("exit code test");
    let outcome = Executor::new().run(target.job("true")).await.unwrap();
    assert_eq!(outcome.status, ExitStatus::Exited(0));
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_exit_code_of_failing_command() {
    let target = require_target!("failing command test");
    let outcome = Executor::new().run(target.job("false")).await.unwrap();
    assert_eq!(outcome.status.code(), Some(1));
}

#[tokio::test]
async fn test_exit_code_127_for_unknown_command() {
    let target = require_target!("unknown command test");
    let outcome = Executor::new()
        .run(target.job("this-command-does-not-exist-anywhere"))
        .await
        .unwrap();
    assert_eq!(outcome.status.code(), Some(127));
}

#[tokio::test]
async fn test_stdout_and_stderr_are_separated_in_order() {
    let target = require_target!("stream separation test");
    let command = r#"for i in $(seq 1 50); do echo "OUT $i"; echo "ERR $i" >&2; done"#;
    let outcome = Executor::new().run(target.job(command)).await.unwrap();

    let expected_out: String = (1..=50).map(|i| format!("OUT {i}\n")).collect();
    let expected_err: String = (1..=50).map(|i| format!("ERR {i}\n")).collect();
    assert_eq!(outcome.stdout_string(), expected_out);
    assert_eq!(outcome.stderr_string(), expected_err);
}

#[tokio::test]
async fn test_wrong_password_is_auth_failed() {
    let target = require_target!("auth failure test");
    let job = Job::new(
        target.host.clone(),
        target.port,
        target.username.clone(),
        format!("{}-definitely-wrong", target.password),
        // Must never run; a marker file would prove it did.
        "touch /tmp/rexec-auth-test-leak",
    );
    let err = Executor::new().run(job).await.unwrap_err();
    assert!(matches!(err, Error::AuthFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_failed_auth_tears_the_transport_down() {
    let target = require_target!("auth teardown test");
    let mut client = Client::connect(&target.host, &target.host, target.port, &target.username)
        .await
        .expect("transport should come up");
    assert!(!client.is_closed());

    let err = client
        .authenticate(&format!("{}-definitely-wrong", target.password))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthFailed { .. }), "got {err:?}");

    // The session task finishes winding down asynchronously, so poll
    // briefly instead of asserting the very first observation.
    let deadline = Instant::now() + Duration::from_secs(5);
    while !client.is_closed() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(client.is_closed());
}

#[tokio::test]
async fn test_deadline_interrupts_long_command() {
    let target = require_target!("deadline test");
    let executor = Executor::new().with_timeout(Some(1));
    let started = Instant::now();
    let err = executor.run(target.job("sleep 30")).await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_signal_terminated_command_is_reported() {
    let target = require_target!("signal outcome test");
    let outcome = Executor::new()
        .run(target.job("kill -TERM $$"))
        .await
        .unwrap();
    // Servers differ here: some report the exit signal, others a shell
    // exit code of 128+15.
    match &outcome.status {
        ExitStatus::Signaled { signal, .. } => assert_eq!(signal, "TERM"),
        ExitStatus::Exited(code) => assert_eq!(*code, 143),
    }
}

#[tokio::test]
async fn test_consecutive_jobs_use_fresh_sessions() {
    let target = require_target!("session independence test");
    let executor = Executor::new();

    // Shell state must not leak between jobs.
    let first = executor
        .run(target.job("REXEC_MARKER=set; export REXEC_MARKER; true"))
        .await
        .unwrap();
    assert!(first.is_success());

    let second = executor
        .run(target.job("echo \"marker=${REXEC_MARKER:-unset}\""))
        .await
        .unwrap();
    assert_eq!(second.stdout_string(), "marker=unset\n");
}
