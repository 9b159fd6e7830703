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

use std::{mem, slice, str::Utf8Error};

use crate::{
    pool::{Pooled, Recycle},
    repeated_field::{Clear, RepeatedField},
};

/// A label of a time series.
///
/// Name and value are copied out of the decompressed buffer into byte
/// buffers owned by the label. Pooled labels keep those buffers, so steady
/// state decoding does not allocate, and a label stays valid after the
/// decompressed buffer is released.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Label {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl Label {
    pub fn name_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.name)
    }

    pub fn value_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.value)
    }
}

impl Clear for Label {
    fn clear(&mut self) {
        self.name.clear();
        self.value.clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub value: f64,
    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
}

impl Clear for Sample {
    fn clear(&mut self) {
        self.value = 0.0;
        self.timestamp = 0;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    pub labels: RepeatedField<Label>,
    pub samples: RepeatedField<Sample>,
}

impl TimeSeries {
    /// Value of the first label called `name`.
    pub fn label_value(&self, name: &[u8]) -> Option<&[u8]> {
        self.labels
            .iter()
            .find(|label| label.name == name)
            .map(|label| label.value.as_slice())
    }
}

impl Clear for TimeSeries {
    fn clear(&mut self) {
        self.labels.clear();
        self.samples.clear();
    }
}

impl Recycle for TimeSeries {
    fn retained_capacity(&self) -> usize {
        let label_bytes: usize = self
            .labels
            .iter()
            .chain(self.labels.spare())
            .map(|label| label.name.capacity() + label.value.capacity())
            .sum();
        self.labels.capacity() * mem::size_of::<Label>()
            + self.samples.capacity() * mem::size_of::<Sample>()
            + label_bytes
    }
}

/// Time series decoded from one write request, in wire order.
///
/// Every series is borrowed from a series pool; releasing (or dropping) the
/// batch gives all of them back.
#[derive(Debug, Default)]
pub struct SeriesBatch {
    series: Vec<Pooled<TimeSeries>>,
}

impl SeriesBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, series: Pooled<TimeSeries>) {
        self.series.push(series);
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&TimeSeries> {
        self.series.get(idx).map(|series| &**series)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.series.iter(),
        }
    }

    pub fn num_samples(&self) -> usize {
        self.iter().map(|series| series.samples.len()).sum()
    }

    /// Value of the first label called `name`, scanning series in wire order.
    pub fn find_label_value(&self, name: &[u8]) -> Option<&[u8]> {
        self.iter().find_map(|series| series.label_value(name))
    }

    /// Give every series back to its pool.
    pub fn release(self) {
        drop(self);
    }
}

pub struct Iter<'a> {
    inner: slice::Iter<'a, Pooled<TimeSeries>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TimeSeries;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|series| &**series)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a SeriesBatch {
    type IntoIter = Iter<'a>;
    type Item = &'a TimeSeries;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
