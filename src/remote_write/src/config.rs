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

use std::{fs, path::Path};

use anyhow::Context;
use bytesize::ByteSize;
use serde::{Deserialize, Serialize};

use crate::error::{InnerError, Result};

pub const DEFAULT_TENANT_LABEL: &str = "service_id";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the label whose value identifies the tenant of a request.
    pub tenant_label: String,
    pub buffer_pool: BufferPoolConfig,
    pub series_pool: SeriesPoolConfig,
    pub decompress: DecompressConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tenant_label: DEFAULT_TENANT_LABEL.to_string(),
            buffer_pool: BufferPoolConfig::default(),
            series_pool: SeriesPoolConfig::default(),
            decompress: DecompressConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config = toml::from_str(s)
            .context("parse toml")
            .map_err(|source| InnerError::Config { source })?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))
            .map_err(|source| InnerError::Config { source })?;
        Self::from_toml_str(&body)
    }
}

/// Pool of decompression destination buffers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferPoolConfig {
    pub max_idle: usize,
    /// Buffers grown beyond this are dropped on release.
    pub max_retained_capacity: ByteSize,
    pub preallocate: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            max_idle: 64,
            max_retained_capacity: ByteSize::mib(16),
            preallocate: 0,
        }
    }
}

/// Pool of decoded time series.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeriesPoolConfig {
    pub max_idle: usize,
    /// Series keeping more heap bytes than this (label and sample slots
    /// plus label name and value buffers) are dropped on release.
    pub max_retained_capacity: ByteSize,
    pub preallocate: usize,
}

impl Default for SeriesPoolConfig {
    fn default() -> Self {
        Self {
            max_idle: 8192,
            max_retained_capacity: ByteSize::kib(64),
            preallocate: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecompressConfig {
    pub max_decompressed_size: ByteSize,
}

impl Default for DecompressConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: ByteSize::mib(64),
        }
    }
}
