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

//! Hand-written protobuf reader for the remote write `WriteRequest`.
//!
//! Only time series, their labels and their samples are decoded. Unknown
//! fields inside a series, a label or a sample are skipped by wire type, while
//! any top-level field other than `timeseries` is rejected.

use std::sync::Arc;

use bytes::Buf;

use crate::{
    error::{Error, Result},
    pool::SeriesPool,
    pooled_types::{Label, Sample, SeriesBatch, TimeSeries},
    repeated_field::Clear,
};

pub(crate) const WIRE_TYPE_VARINT: u8 = 0;
pub(crate) const WIRE_TYPE_64BIT: u8 = 1;
pub(crate) const WIRE_TYPE_LENGTH_DELIMITED: u8 = 2;
pub(crate) const WIRE_TYPE_32BIT: u8 = 5;

const FIELD_NUM_TIMESERIES: u32 = 1;
const FIELD_NUM_LABELS: u32 = 1;
const FIELD_NUM_SAMPLES: u32 = 2;
const FIELD_NUM_LABEL_NAME: u32 = 1;
const FIELD_NUM_LABEL_VALUE: u32 = 2;
const FIELD_NUM_SAMPLE_VALUE: u32 = 1;
const FIELD_NUM_SAMPLE_TIMESTAMP: u32 = 2;

/// Longest valid varint encoding of a u64.
const MAX_VARINT_LEN: usize = 10;

pub struct ProtobufReader<'a> {
    data: &'a [u8],
}

impl<'a> ProtobufReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }

    /// Read a varint from the buffer.
    #[inline(always)]
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            if !self.data.has_remaining() {
                return Err(Error::malformed("not enough bytes for varint"));
            }
            let b = self.data.get_u8();
            if i == MAX_VARINT_LEN - 1 && b > 1 {
                return Err(Error::malformed("varint overflow"));
            }
            value |= ((b & 0x7f) as u64) << (7 * i);
            if b < 0x80 {
                return Ok(value);
            }
        }
        Err(Error::malformed("varint overflow"))
    }

    /// Read a double from the buffer.
    #[inline(always)]
    pub fn read_double(&mut self) -> Result<f64> {
        if self.data.remaining() < 8 {
            return Err(Error::malformed("not enough bytes for double"));
        }
        // In Protobuf, double is encoded as little-endian 64-bit.
        Ok(f64::from_bits(self.data.get_u64_le()))
    }

    /// Read a 64-bit integer from the buffer.
    #[inline(always)]
    pub fn read_int64(&mut self) -> Result<i64> {
        // In Protobuf, int64 is encoded as varint.
        self.read_varint().map(|v| v as i64)
    }

    /// Read a length-delimited field and return its bytes without copying.
    #[inline(always)]
    pub fn read_length_delimited(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.read_varint()?;
        if len > self.data.remaining() as u64 {
            return Err(Error::malformed(format!(
                "{what} length {len} exceeds remaining {} bytes",
                self.data.remaining()
            )));
        }
        let (field, rest) = self.data.split_at(len as usize);
        self.data = rest;
        Ok(field)
    }

    /// Read a tag from the buffer.
    #[inline(always)]
    pub fn read_tag(&mut self) -> Result<(u32, u8)> {
        // In Protobuf, tag is encoded as varint.
        // tag = (field_number << 3) | wire_type.
        let tag = self.read_varint()?;
        let field_number = tag >> 3;
        if field_number > u32::MAX as u64 {
            return Err(Error::malformed(format!("field number {field_number} out of range")));
        }
        Ok((field_number as u32, (tag & 0x07) as u8))
    }

    /// Skip the value of a field this reader does not decode.
    pub fn skip_field(&mut self, wire_type: u8) -> Result<()> {
        match wire_type {
            WIRE_TYPE_VARINT => {
                self.read_varint()?;
            }
            WIRE_TYPE_64BIT => self.skip_fixed(8)?,
            WIRE_TYPE_LENGTH_DELIMITED => {
                self.read_length_delimited("unknown field")?;
            }
            WIRE_TYPE_32BIT => self.skip_fixed(4)?,
            _ => return Err(Error::unsupported_wire_type(wire_type)),
        }
        Ok(())
    }

    #[inline]
    fn skip_fixed(&mut self, len: usize) -> Result<()> {
        if self.data.remaining() < len {
            return Err(Error::malformed(format!(
                "not enough bytes for {len}-byte fixed field"
            )));
        }
        self.data.advance(len);
        Ok(())
    }

    /// Fill `timeseries` from a `TimeSeries` message spanning the rest of the
    /// buffer. Previous labels and samples are cleared first.
    pub fn read_timeseries(&mut self, timeseries: &mut TimeSeries) -> Result<()> {
        timeseries.clear();
        while self.remaining() > 0 {
            let (field_number, wire_type) = self.read_tag()?;
            match field_number {
                FIELD_NUM_LABELS => {
                    validate_wire_type(wire_type, WIRE_TYPE_LENGTH_DELIMITED, "labels")?;
                    let data = self.read_length_delimited("label")?;
                    ProtobufReader::new(data).read_label(timeseries.labels.push_default())?;
                }
                FIELD_NUM_SAMPLES => {
                    validate_wire_type(wire_type, WIRE_TYPE_LENGTH_DELIMITED, "samples")?;
                    let data = self.read_length_delimited("sample")?;
                    ProtobufReader::new(data).read_sample(timeseries.samples.push_default())?;
                }
                _ => self.skip_field(wire_type)?,
            }
        }
        Ok(())
    }

    /// Fill `label` from a `Label` message spanning the rest of the buffer.
    pub fn read_label(&mut self, label: &mut Label) -> Result<()> {
        label.clear();
        while self.remaining() > 0 {
            let (field_number, wire_type) = self.read_tag()?;
            match field_number {
                FIELD_NUM_LABEL_NAME => {
                    validate_wire_type(wire_type, WIRE_TYPE_LENGTH_DELIMITED, "label name")?;
                    let name = self.read_length_delimited("label name")?;
                    label.name.clear();
                    label.name.extend_from_slice(name);
                }
                FIELD_NUM_LABEL_VALUE => {
                    validate_wire_type(wire_type, WIRE_TYPE_LENGTH_DELIMITED, "label value")?;
                    let value = self.read_length_delimited("label value")?;
                    label.value.clear();
                    label.value.extend_from_slice(value);
                }
                _ => self.skip_field(wire_type)?,
            }
        }
        Ok(())
    }

    /// Fill `sample` from a `Sample` message spanning the rest of the buffer.
    pub fn read_sample(&mut self, sample: &mut Sample) -> Result<()> {
        sample.clear();
        while self.remaining() > 0 {
            let (field_number, wire_type) = self.read_tag()?;
            match field_number {
                FIELD_NUM_SAMPLE_VALUE => {
                    validate_wire_type(wire_type, WIRE_TYPE_64BIT, "sample value")?;
                    sample.value = self.read_double()?;
                }
                FIELD_NUM_SAMPLE_TIMESTAMP => {
                    validate_wire_type(wire_type, WIRE_TYPE_VARINT, "sample timestamp")?;
                    sample.timestamp = self.read_int64()?;
                }
                _ => self.skip_field(wire_type)?,
            }
        }
        Ok(())
    }
}

#[inline(always)]
fn validate_wire_type(actual: u8, expected: u8, field_name: &str) -> Result<()> {
    if actual != expected {
        return Err(Error::malformed(format!(
            "expected wire type {expected} for {field_name}, but found wire type {actual}"
        )));
    }
    Ok(())
}

/// Decode every time series of a `WriteRequest` into `batch`.
///
/// Each series is taken from `pool` and appended in wire order. On error the
/// series decoded so far stay in `batch`, so the caller still owns (and
/// releases) them.
pub fn read_write_request(
    data: &[u8],
    pool: &Arc<SeriesPool>,
    batch: &mut SeriesBatch,
) -> Result<()> {
    let mut reader = ProtobufReader::new(data);
    while reader.remaining() > 0 {
        let (field_number, wire_type) = reader.read_tag()?;
        if field_number != FIELD_NUM_TIMESERIES {
            return Err(Error::malformed(format!(
                "unexpected field number: {field_number}"
            )));
        }
        validate_wire_type(wire_type, WIRE_TYPE_LENGTH_DELIMITED, "timeseries")?;
        let series_data = reader.read_length_delimited("timeseries")?;

        let mut series = pool.acquire();
        ProtobufReader::new(series_data).read_timeseries(&mut series)?;
        batch.push(series);
    }
    Ok(())
}
