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

//! Low-allocation decoding of Prometheus remote write requests.
//!
//! A request goes through [`dispatch::Dispatcher`]: its body is decompressed
//! into a pooled buffer, decoded into pooled time series, the tenant is taken
//! from a configured label, and the series are handed to a
//! [`dispatch::Forwarder`] before every pooled object is released.

pub mod config;
pub mod decompress;
pub mod dispatch;
pub mod error;
pub mod pb_reader;
pub mod pool;
pub mod pooled_parser;
pub mod pooled_types;
pub mod repeated_field;
#[cfg(test)]
mod test_util;

pub use config::Config;
pub use decompress::{Decompressor, Encoding};
pub use dispatch::{DispatchStats, Dispatcher, Forwarder};
pub use error::{Error, ErrorKind, Result};
pub use pool::{BufferPool, PoolStats, Pooled, PooledBuffer, SeriesPool};
pub use pooled_parser::PooledParser;
pub use pooled_types::{Label, Sample, SeriesBatch, TimeSeries};
