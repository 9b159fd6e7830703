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

use prost::Message;

use crate::pooled_types::SeriesBatch;

/// Reference remote write messages encoded with prost.
pub mod pb {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct WriteRequest {
        #[prost(message, repeated, tag = "1")]
        pub timeseries: Vec<TimeSeries>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct TimeSeries {
        #[prost(message, repeated, tag = "1")]
        pub labels: Vec<Label>,
        #[prost(message, repeated, tag = "2")]
        pub samples: Vec<Sample>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Label {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub value: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Sample {
        #[prost(double, tag = "1")]
        pub value: f64,
        #[prost(int64, tag = "2")]
        pub timestamp: i64,
    }

    pub fn label(name: &str, value: &str) -> Label {
        Label {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

pub fn encode(request: &pb::WriteRequest) -> Vec<u8> {
    request.encode_to_vec()
}

pub fn snappy_compress(data: &[u8]) -> Vec<u8> {
    snap::raw::Encoder::new().compress_vec(data).unwrap()
}

pub fn zstd_compress(data: &[u8]) -> Vec<u8> {
    zstd::encode_all(data, 3).unwrap()
}

/// A request with `num_series` series of `num_labels` labels and
/// `num_samples` samples each; every value is distinct.
pub fn build_request(num_series: usize, num_labels: usize, num_samples: usize) -> pb::WriteRequest {
    let timeseries = (0..num_series)
        .map(|i| pb::TimeSeries {
            labels: (0..num_labels)
                .map(|j| pb::label(&format!("label_{j}"), &format!("value_{i}_{j}")))
                .collect(),
            samples: (0..num_samples)
                .map(|k| pb::Sample {
                    value: i as f64 + k as f64 / 10.0,
                    timestamp: 1_700_000_000_000 + (i * num_samples + k) as i64,
                })
                .collect(),
        })
        .collect();
    pb::WriteRequest { timeseries }
}

/// Copy a decoded batch into the reference messages for comparison.
pub fn to_pb(batch: &SeriesBatch) -> pb::WriteRequest {
    let timeseries = batch
        .iter()
        .map(|series| pb::TimeSeries {
            labels: series
                .labels
                .iter()
                .map(|label| pb::Label {
                    name: String::from_utf8_lossy(&label.name).to_string(),
                    value: String::from_utf8_lossy(&label.value).to_string(),
                })
                .collect(),
            samples: series
                .samples
                .iter()
                .map(|sample| pb::Sample {
                    value: sample.value,
                    timestamp: sample.timestamp,
                })
                .collect(),
        })
        .collect();
    pb::WriteRequest { timeseries }
}
