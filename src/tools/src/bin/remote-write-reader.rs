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

//! A cli to decode a captured remote write payload

use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use clap::Parser;
use remote_write::{Config, DispatchStats, Dispatcher, Forwarder, PoolStats, SeriesBatch};
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Parser, Debug)]
#[clap(author, version, about = "A command line tool to decode and summarize a Prometheus remote write payload", long_about = None)]
struct Args {
    /// Compressed request body
    payload: PathBuf,

    /// Content encoding of the payload
    #[clap(short, long, default_value = "snappy")]
    encoding: String,

    /// Label used to resolve the tenant, overrides the config
    #[clap(short, long, default_value = None)]
    tenant_label: Option<String>,

    /// Config file path
    #[clap(short, long, default_value = None)]
    config: Option<PathBuf>,

    /// Number of series to print
    #[clap(short, long, default_value_t = 10)]
    show_series: usize,
}

#[derive(Tabled)]
struct SeriesInfo {
    index: usize,
    labels: String,
    samples: usize,
    first_timestamp: String,
}

impl SeriesInfo {
    fn load(batch: &SeriesBatch, limit: usize) -> Vec<SeriesInfo> {
        batch
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, series)| {
                let labels = series
                    .labels
                    .iter()
                    .map(|label| {
                        format!(
                            "{}={}",
                            String::from_utf8_lossy(&label.name),
                            String::from_utf8_lossy(&label.value)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                SeriesInfo {
                    index,
                    labels,
                    samples: series.samples.len(),
                    first_timestamp: series
                        .samples
                        .first()
                        .map(|s| s.timestamp.to_string())
                        .unwrap_or_default(),
                }
            })
            .collect()
    }
}

#[derive(Tabled)]
struct RequestInfo {
    tenant_label: String,
    tenant: String,
    compressed_bytes: usize,
    decompressed_bytes: usize,
    num_series: usize,
    num_samples: usize,
}

#[derive(Tabled)]
struct PoolInfo {
    pool: &'static str,
    idle: usize,
    created: u64,
    reused: u64,
    recycled: u64,
    discarded: u64,
}

impl PoolInfo {
    fn load(pool: &'static str, stats: PoolStats) -> Self {
        Self {
            pool,
            idle: stats.idle,
            created: stats.created,
            reused: stats.reused,
            recycled: stats.recycled,
            discarded: stats.discarded,
        }
    }
}

/// Prints the decoded series instead of sending them anywhere.
struct PrintForwarder {
    show_series: usize,
    tenant: Mutex<Option<String>>,
}

#[async_trait]
impl Forwarder for PrintForwarder {
    async fn forward(&self, tenant: Option<&str>, series: &SeriesBatch) -> anyhow::Result<()> {
        info!(tenant, series = series.len(), "Forward decoded series");
        if let Ok(mut last) = self.tenant.lock() {
            *last = tenant.map(str::to_string);
        }
        if self.show_series > 0 && !series.is_empty() {
            println!("{}", Table::new(SeriesInfo::load(series, self.show_series)));
        }
        Ok(())
    }
}

fn pretty_error_then_exit(err_msg: &str) -> ! {
    eprintln!("\x1b[31m{}\x1b[0m", err_msg);
    std::process::exit(1);
}

fn load_config(args: &Args) -> Config {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .unwrap_or_else(|e| pretty_error_then_exit(&format!("Error: {e}"))),
        None => Config::default(),
    };
    if let Some(tenant_label) = &args.tenant_label {
        config.tenant_label = tenant_label.clone();
    }
    config
}

fn print_request(tenant_label: &str, tenant: Option<String>, stats: &DispatchStats) {
    let info = RequestInfo {
        tenant_label: tenant_label.to_string(),
        tenant: tenant.unwrap_or_else(|| "-".to_string()),
        compressed_bytes: stats.compressed_bytes,
        decompressed_bytes: stats.decompressed_bytes,
        num_series: stats.num_series,
        num_samples: stats.num_samples,
    };
    println!("{}", Table::new([info]));
}

fn main() {
    tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .init();

    let args = Args::parse();
    let config = load_config(&args);
    println!("Payload: {}", args.payload.display());

    let body = fs::read(&args.payload).unwrap_or_else(|e| {
        pretty_error_then_exit(&format!(
            "Error: failed to read payload '{}', err:{e}",
            args.payload.display()
        ))
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| pretty_error_then_exit(&format!("Error: {e}")));

    let forwarder = Arc::new(PrintForwarder {
        show_series: args.show_series,
        tenant: Mutex::new(None),
    });
    let dispatcher = Dispatcher::from_config(&config, forwarder.clone());
    let stats = runtime
        .block_on(dispatcher.dispatch(&args.encoding, &body))
        .unwrap_or_else(|e| {
            pretty_error_then_exit(&format!("Error({:?}): {e}", e.kind()))
        });

    let tenant = forwarder.tenant.lock().ok().and_then(|mut t| t.take());
    print_request(dispatcher.tenant_label(), tenant, &stats);

    println!(
        "{}",
        Table::new([
            PoolInfo::load("buffer", dispatcher.buffer_pool_stats()),
            PoolInfo::load("series", dispatcher.series_pool_stats()),
        ])
    );
}
