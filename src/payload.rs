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

//! One-shot job payload ingestion.
//!
//! The worker receives exactly one JSON job on stdin and treats EOF as the
//! end of the payload. The read is bounded: input is abandoned the moment it
//! crosses [`MAX_PAYLOAD_BYTES`], before any parsing happens, so a runaway
//! producer cannot balloon the worker's memory.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};
use crate::job::Job;

/// Upper bound on the accepted payload size (128 KiB).
///
/// Leaves headroom above the 64 KiB command bound for JSON escaping and the
/// remaining fields.
pub const MAX_PAYLOAD_BYTES: usize = 128 * 1024;

const READ_CHUNK_SIZE: usize = 8192;

/// Read one job payload from `reader` until EOF and parse it.
pub async fn read_job<R>(reader: &mut R) -> Result<Job>
where
    R: AsyncRead + Unpin,
{
    let mut payload = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await.map_err(Error::PayloadRead)?;
        if n == 0 {
            break;
        }
        if payload.len() + n > MAX_PAYLOAD_BYTES {
            return Err(Error::PayloadTooLarge {
                read: payload.len() + n,
                max: MAX_PAYLOAD_BYTES,
            });
        }
        payload.extend_from_slice(&chunk[..n]);
    }
    parse_job(&payload)
}

/// Parse a JSON job payload that has already been read in full.
pub fn parse_job(payload: &[u8]) -> Result<Job> {
    if payload.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(Error::malformed("empty payload"));
    }
    serde_json::from_slice(payload)
        .map_err(|e| Error::malformed(format!("invalid job payload: {e}")))
}
