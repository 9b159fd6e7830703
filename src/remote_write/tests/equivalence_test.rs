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

//! This test verifies the correctness of the pooled parser by comparing its
//! results with the prost parser on randomly generated requests, from one
//! thread and from many threads sharing one pool.

use std::{sync::Arc, thread};

use prost::Message;
use rand::{rngs::StdRng, Rng, SeedableRng};
use remote_write::{PooledParser, SeriesBatch, SeriesPool};

const ITERATIONS: usize = 50;

#[derive(Clone, PartialEq, prost::Message)]
struct WriteRequest {
    #[prost(message, repeated, tag = "1")]
    timeseries: Vec<TimeSeries>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct TimeSeries {
    #[prost(message, repeated, tag = "1")]
    labels: Vec<Label>,
    #[prost(message, repeated, tag = "2")]
    samples: Vec<Sample>,
    // Decoded by neither side's consumers; the pooled parser must skip it.
    #[prost(message, repeated, tag = "3")]
    exemplars: Vec<Exemplar>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct Label {
    #[prost(string, tag = "1")]
    name: String,
    #[prost(string, tag = "2")]
    value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
struct Sample {
    #[prost(double, tag = "1")]
    value: f64,
    #[prost(int64, tag = "2")]
    timestamp: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
struct Exemplar {
    #[prost(message, repeated, tag = "1")]
    labels: Vec<Label>,
    #[prost(double, tag = "2")]
    value: f64,
    #[prost(int64, tag = "3")]
    timestamp: i64,
}

fn random_string(rng: &mut StdRng) -> String {
    let len = rng.gen_range(0..24);
    (0..len)
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect()
}

fn random_request(rng: &mut StdRng) -> WriteRequest {
    let timeseries = (0..rng.gen_range(0..64))
        .map(|_| TimeSeries {
            labels: (0..rng.gen_range(0..12))
                .map(|_| Label {
                    name: random_string(rng),
                    value: random_string(rng),
                })
                .collect(),
            samples: (0..rng.gen_range(0..8))
                .map(|_| Sample {
                    value: rng.gen_range(-1e9..1e9),
                    timestamp: rng.gen_range(-1_000_000_000_000..2_000_000_000_000),
                })
                .collect(),
            exemplars: (0..rng.gen_range(0..2))
                .map(|_| Exemplar {
                    labels: vec![Label {
                        name: "trace_id".to_string(),
                        value: random_string(rng),
                    }],
                    value: rng.gen(),
                    timestamp: rng.gen_range(0..2_000_000_000_000),
                })
                .collect(),
        })
        .collect();
    WriteRequest { timeseries }
}

/// Expected output of the pooled parser: what prost decodes, minus the
/// fields the pooled parser skips.
fn parse_with_prost(data: &[u8]) -> WriteRequest {
    let mut request = WriteRequest::decode(data).expect("prost decode failed");
    for series in &mut request.timeseries {
        series.exemplars.clear();
    }
    request
}

fn to_prost(batch: &SeriesBatch) -> WriteRequest {
    let timeseries = batch
        .iter()
        .map(|series| TimeSeries {
            labels: series
                .labels
                .iter()
                .map(|label| Label {
                    name: String::from_utf8(label.name.clone()).unwrap(),
                    value: String::from_utf8(label.value.clone()).unwrap(),
                })
                .collect(),
            samples: series
                .samples
                .iter()
                .map(|sample| Sample {
                    value: sample.value,
                    timestamp: sample.timestamp,
                })
                .collect(),
            exemplars: Vec::new(),
        })
        .collect();
    WriteRequest { timeseries }
}

fn new_parser() -> PooledParser {
    PooledParser::new(Arc::new(SeriesPool::new(256, 1 << 16, 0)))
}

#[test]
fn test_sequential_correctness() {
    let mut rng = StdRng::seed_from_u64(42);
    let parser = new_parser();

    for iteration in 0..ITERATIONS {
        let data = random_request(&mut rng).encode_to_vec();
        let batch = parser.decode(&data).expect("pooled decode failed");
        assert_eq!(
            parse_with_prost(&data),
            to_prost(&batch),
            "iteration {iteration} mismatch"
        );
    }

    let stats = parser.pool().stats();
    assert!(stats.reused > 0);
    assert_eq!(stats.created + stats.reused, stats.recycled + stats.discarded);
}

#[test]
fn test_concurrent_correctness() {
    let parser = new_parser();
    let handles: Vec<_> = (0..ITERATIONS)
        .map(|iteration| {
            let parser = parser.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(iteration as u64);
                for _ in 0..5 {
                    let data = random_request(&mut rng).encode_to_vec();
                    let batch = parser.decode(&data).expect("pooled decode failed");
                    assert_eq!(parse_with_prost(&data), to_prost(&batch));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let stats = parser.pool().stats();
    assert_eq!(stats.created + stats.reused, stats.recycled + stats.discarded);
}
