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

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "rexec",
    version,
    about = "rexec - One-shot remote command execution over SSH",
    long_about = "rexec runs a single command on a single remote host over SSH with password authentication.\nIt reads exactly one JSON job from stdin, streams the remote stdout and stderr to the matching\nlocal streams as output arrives, and exits once the command finished and the connection was torn down.\nEvery invocation is independent: one process, one connection, one command.",
    after_help = "EXAMPLES:\n  Run a command:          echo '{\"host\":\"10.0.0.7\",\"port\":22,\"username\":\"root\",\"password\":\"pw\",\"command\":\"uptime\"}' | rexec\n  Job file with capture:  rexec --capture < job.json\n  Bounded execution:      rexec --timeout 30 < job.json\n  Verbose diagnostics:    rexec -vv < job.json\n\nJOB FORMAT (single JSON object on stdin):\n  {\"host\": \"...\", \"port\": 22, \"username\": \"...\", \"password\": \"...\", \"command\": \"...\"}\n  All five fields are required.\n\nThe process exit code reports the worker itself: 0 when the command ran to completion\n(whatever its remote exit code), 1 when connection, authentication or execution failed.\nThe remote exit code is reported in the logs and in --capture output."
)]
pub struct Cli {
    #[arg(
        long,
        default_value = "20",
        help = "Connection readiness timeout in seconds, covering connect and authentication"
    )]
    pub connect_timeout: u64,

    #[arg(
        short = 't',
        long,
        default_value = "0",
        help = "Command timeout in seconds (0 for unlimited)"
    )]
    pub timeout: u64,

    #[arg(
        long,
        help = "Buffer all output and print one JSON result to stdout instead of streaming"
    )]
    pub capture: bool,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv); diagnostics go to stderr"
    )]
    pub verbose: u8,
}
