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

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::io::{self, AsyncWriteExt};
use tokio::sync::mpsc::{self, Receiver};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rexec::{
    cli::Cli,
    executor::{Executor, Outcome, STREAM_CHANNEL_CAPACITY},
    logging::init_logging,
    payload,
    ssh::CommandOutput,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let job = {
        let mut stdin = io::stdin();
        payload::read_job(&mut stdin)
            .await
            .context("failed to read job from stdin")?
    };

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling execution");
            signal_token.cancel();
        }
    });

    let executor = Executor::new()
        .with_connect_timeout(Some(cli.connect_timeout))
        .with_timeout(Some(cli.timeout))
        .with_cancellation(cancel_token);

    // The process exit code reports the worker itself. The remote command's
    // exit code is logged and, in capture mode, part of the JSON report.
    if cli.capture {
        let outcome = executor.run(job).await?;
        print_report(&outcome)?;
    } else {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let writer = tokio::spawn(passthrough_output(rx));

        let status = executor.run_streaming(job, tx).await;

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "local output write failed, remaining output dropped"),
            Err(e) => warn!(error = %e, "output writer task failed"),
        }
        status?;
    }

    Ok(())
}

/// Forward streamed events to the matching local streams as raw bytes.
///
/// Flushes after every chunk so output is visible as it arrives. A local
/// write failure stops forwarding; dropping the receiver tells the executor
/// to drain the rest without delivery while the command runs to completion.
async fn passthrough_output(mut rx: Receiver<CommandOutput>) -> std::io::Result<()> {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    while let Some(event) = rx.recv().await {
        match event {
            CommandOutput::StdOut(data) => {
                stdout.write_all(&data).await?;
                stdout.flush().await?;
            }
            CommandOutput::StdErr(data) => {
                stderr.write_all(&data).await?;
                stderr.flush().await?;
            }
            // The executor reports the status through its return value.
            CommandOutput::Exit(_) => {}
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct CaptureReport<'a> {
    host: &'a str,
    stdout: String,
    stderr: String,
    exit_code: Option<u32>,
    signal: Option<&'a str>,
}

/// Print the buffered outcome as a single JSON object on stdout.
fn print_report(outcome: &Outcome) -> Result<()> {
    let report = CaptureReport {
        host: &outcome.host,
        stdout: outcome.stdout_string(),
        stderr: outcome.stderr_string(),
        exit_code: outcome.status.code(),
        signal: outcome.status.signal_name(),
    };
    let rendered = serde_json::to_string(&report).context("failed to serialize capture report")?;
    println!("{rendered}");
    Ok(())
}
