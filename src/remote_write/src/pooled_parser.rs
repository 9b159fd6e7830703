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

//! Pooled parser for Prometheus remote write requests.
//!
//! Decoded series are borrowed from a [`SeriesPool`] and label bytes are
//! copied into buffers those series keep across uses, so a warmed-up parser
//! decodes without allocating. Label bytes are **not** UTF-8 validated; it is
//! up to the caller to decide whether to validate them.

use std::sync::Arc;

use crate::{
    error::Result,
    pb_reader::read_write_request,
    pool::SeriesPool,
    pooled_types::SeriesBatch,
};

#[derive(Debug, Clone)]
pub struct PooledParser {
    pool: Arc<SeriesPool>,
}

impl PooledParser {
    pub fn new(pool: Arc<SeriesPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<SeriesPool> {
        &self.pool
    }

    /// Decode a `WriteRequest` from the buffer into `batch`.
    ///
    /// When decoding fails the series decoded before the failure are left in
    /// `batch`; dropping or releasing it gives them back to the pool.
    pub fn decode_into(&self, buf: &[u8], batch: &mut SeriesBatch) -> Result<()> {
        read_write_request(buf, &self.pool, batch)
    }

    /// Decode a `WriteRequest` from the buffer and return its series.
    pub fn decode(&self, buf: &[u8]) -> Result<SeriesBatch> {
        let mut batch = SeriesBatch::new();
        self.decode_into(buf, &mut batch)?;
        Ok(batch)
    }
}
