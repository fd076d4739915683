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

//! Logging initialization.
//!
//! `RUST_LOG` always wins; otherwise the `-v` count picks the filter. All
//! diagnostics go to stderr because stdout carries the remote command's
//! output and must stay byte-clean.

use tracing_subscriber::EnvFilter;

fn verbosity_filter(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::new("rexec=warn"),
        1 => EnvFilter::new("rexec=info"),
        2 => EnvFilter::new("rexec=debug,russh=debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Build the log filter: `RUST_LOG` when set, the verbosity mapping otherwise.
pub fn create_env_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| verbosity_filter(verbose))
}

/// Install the global subscriber. Call once, before any job work starts.
pub fn init_logging(verbose: u8) {
    let filter = create_env_filter(verbose);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_by_default() {
        let filter = verbosity_filter(0).to_string();
        assert!(filter.contains("rexec"));
        assert!(filter.contains("warn"));
    }

    #[test]
    fn test_single_v_enables_info() {
        assert!(verbosity_filter(1).to_string().contains("info"));
    }

    #[test]
    fn test_double_v_includes_transport_debug() {
        let filter = verbosity_filter(2).to_string();
        assert!(filter.contains("russh=debug"));
    }

    #[test]
    fn test_triple_v_enables_trace() {
        assert!(verbosity_filter(3).to_string().contains("trace"));
    }
}
