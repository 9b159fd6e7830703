// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Decompress request bodies into pooled buffers.

use std::{fmt, io::Read, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    config::DecompressConfig,
    error::{Error, InnerError, Result},
    pool::{BufferPool, PooledBuffer},
};

/// Compression of a remote write body, as announced by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Snappy block format, the encoding mandated by remote write.
    Snappy,
    Zstd,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Snappy => "snappy",
            Encoding::Zstd => "zstd",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "snappy" => Ok(Encoding::Snappy),
            "zstd" => Ok(Encoding::Zstd),
            _ => Err(InnerError::UnsupportedEncoding {
                encoding: s.to_string(),
            }
            .into()),
        }
    }
}

pub struct Decompressor {
    buffers: Arc<BufferPool>,
    max_decompressed_size: u64,
}

impl Decompressor {
    pub fn new(buffers: Arc<BufferPool>, max_decompressed_size: u64) -> Self {
        Self {
            buffers,
            max_decompressed_size,
        }
    }

    pub fn from_config(buffers: Arc<BufferPool>, config: &DecompressConfig) -> Self {
        Self::new(buffers, config.max_decompressed_size.as_u64())
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffers
    }

    /// Decompress `body` according to the `encoding` indicator.
    ///
    /// An unknown indicator is rejected before any buffer is taken from the
    /// pool. The returned buffer goes back to the pool once released.
    pub fn decompress(&self, encoding: &str, body: &[u8]) -> Result<PooledBuffer> {
        let encoding = Encoding::from_str(encoding)?;
        self.decompress_with(encoding, body)
    }

    pub fn decompress_with(&self, encoding: Encoding, body: &[u8]) -> Result<PooledBuffer> {
        let mut buf = self.buffers.acquire();
        match encoding {
            Encoding::Snappy => decode_snappy(body, &mut buf, self.max_decompressed_size)?,
            Encoding::Zstd => decode_zstd(body, &mut buf, self.max_decompressed_size)?,
        }
        trace!(
            %encoding,
            compressed = body.len(),
            decompressed = buf.len(),
            "Payload decompressed"
        );
        Ok(buf)
    }
}

fn decompression_error(encoding: Encoding, source: impl Into<anyhow::Error>) -> Error {
    InnerError::Decompression {
        encoding,
        source: source.into(),
    }
    .into()
}

fn decode_snappy(body: &[u8], buf: &mut Vec<u8>, max: u64) -> Result<()> {
    let len = snap::raw::decompress_len(body)
        .map_err(|e| decompression_error(Encoding::Snappy, e))?;
    if len as u64 > max {
        return Err(InnerError::DecompressedTooLarge {
            encoding: Encoding::Snappy,
            current: len as u64,
            max,
        }
        .into());
    }

    buf.resize(len, 0);
    let written = snap::raw::Decoder::new()
        .decompress(body, buf)
        .map_err(|e| decompression_error(Encoding::Snappy, e))?;
    buf.truncate(written);
    Ok(())
}

fn decode_zstd(body: &[u8], buf: &mut Vec<u8>, max: u64) -> Result<()> {
    let decoder = zstd::stream::read::Decoder::with_buffer(body)
        .map_err(|e| decompression_error(Encoding::Zstd, e))?;
    // Read one byte past the limit to tell "exactly max" from "too large".
    let read = decoder
        .take(max.saturating_add(1))
        .read_to_end(buf)
        .map_err(|e| decompression_error(Encoding::Zstd, e))?;
    if read as u64 > max {
        return Err(InnerError::DecompressedTooLarge {
            encoding: Encoding::Zstd,
            current: read as u64,
            max,
        }
        .into());
    }
    Ok(())
}
