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

//! Per-request pipeline: decompress, decode, extract the tenant, forward and
//! release.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    config::Config,
    decompress::Decompressor,
    error::{Error, InnerError, Result},
    pool::{BufferPool, PoolStats, SeriesPool},
    pooled_parser::PooledParser,
    pooled_types::SeriesBatch,
};

/// Downstream stage receiving the decoded series of a request.
///
/// The batch is only borrowed: it goes back to the pool as soon as
/// [`Forwarder::forward`] returns, so implementations must copy whatever they
/// keep.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, tenant: Option<&str>, series: &SeriesBatch) -> anyhow::Result<()>;
}

#[async_trait]
impl<F: Forwarder + ?Sized> Forwarder for Arc<F> {
    async fn forward(&self, tenant: Option<&str>, series: &SeriesBatch) -> anyhow::Result<()> {
        (**self).forward(tenant, series).await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub compressed_bytes: usize,
    pub decompressed_bytes: usize,
    pub num_series: usize,
    pub num_samples: usize,
    pub tenant_found: bool,
}

pub struct Dispatcher<F> {
    decompressor: Decompressor,
    parser: PooledParser,
    tenant_label: String,
    forwarder: F,
}

impl<F: Forwarder> Dispatcher<F> {
    pub fn new(
        decompressor: Decompressor,
        parser: PooledParser,
        tenant_label: impl Into<String>,
        forwarder: F,
    ) -> Self {
        Self {
            decompressor,
            parser,
            tenant_label: tenant_label.into(),
            forwarder,
        }
    }

    /// Build the dispatcher and its pools from `config`.
    pub fn from_config(config: &Config, forwarder: F) -> Self {
        let buffers = Arc::new(BufferPool::from_config(&config.buffer_pool));
        let series = Arc::new(SeriesPool::from_config(&config.series_pool));
        Self::new(
            Decompressor::from_config(buffers, &config.decompress),
            PooledParser::new(series),
            config.tenant_label.clone(),
            forwarder,
        )
    }

    pub fn tenant_label(&self) -> &str {
        &self.tenant_label
    }

    pub fn buffer_pool_stats(&self) -> PoolStats {
        self.decompressor.buffer_pool().stats()
    }

    pub fn series_pool_stats(&self) -> PoolStats {
        self.parser.pool().stats()
    }

    /// Run one request through the pipeline.
    ///
    /// Every pooled buffer and series taken for the request is back in its
    /// pool when this returns, whatever the outcome.
    pub async fn dispatch(&self, encoding: &str, body: &[u8]) -> Result<DispatchStats> {
        let buf = self.decompressor.decompress(encoding, body)?;
        let mut batch = SeriesBatch::new();
        self.parser.decode_into(&buf, &mut batch)?;

        let tenant = extract_tenant(&batch, &self.tenant_label)?;
        let stats = DispatchStats {
            compressed_bytes: body.len(),
            decompressed_bytes: buf.len(),
            num_series: batch.len(),
            num_samples: batch.num_samples(),
            tenant_found: tenant.is_some(),
        };

        self.forwarder
            .forward(tenant, &batch)
            .await
            .map_err(|source| Error::from(InnerError::Forward { source }))?;

        batch.release();
        buf.release();
        debug!(
            encoding,
            compressed = stats.compressed_bytes,
            decompressed = stats.decompressed_bytes,
            series = stats.num_series,
            samples = stats.num_samples,
            tenant_found = stats.tenant_found,
            "Remote write request dispatched"
        );

        Ok(stats)
    }
}

/// Value of the first `tenant_label` label in wire order.
pub fn extract_tenant<'a>(batch: &'a SeriesBatch, tenant_label: &str) -> Result<Option<&'a str>> {
    match batch.find_label_value(tenant_label.as_bytes()) {
        Some(value) => std::str::from_utf8(value).map(Some).map_err(|e| {
            Error::malformed(format!("tenant label {tenant_label} is not valid utf8, err:{e}"))
        }),
        None => Ok(None),
    }
}
