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

//! Bounded object pools shared by concurrent decode pipelines.
//!
//! An [`ObjectPool`] hands out [`Pooled`] handles. A handle owns its object
//! exclusively and gives it back to the pool when it is released or dropped,
//! so an object can never be observed after it went back to the pool.
//! Objects are cleared on acquisition, and objects that grew beyond the
//! pool's capacity ceiling are dropped instead of being pooled again.

use std::{
    fmt,
    mem,
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tracing::debug;

use crate::{
    config::{BufferPoolConfig, SeriesPoolConfig},
    pooled_types::TimeSeries,
    repeated_field::Clear,
};

/// An object that can be reused through an [`ObjectPool`].
pub trait Recycle: Clear + Default + Send {
    /// Heap bytes the object keeps after [`Clear::clear`].
    fn retained_capacity(&self) -> usize;
}

impl Recycle for Vec<u8> {
    fn retained_capacity(&self) -> usize {
        self.capacity()
    }
}

/// Pool of decompression destination buffers.
pub type BufferPool = ObjectPool<Vec<u8>>;
/// Pool of decoded time series.
pub type SeriesPool = ObjectPool<TimeSeries>;
/// A decompression buffer borrowed from a [`BufferPool`].
pub type PooledBuffer = Pooled<Vec<u8>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Objects currently waiting in the pool.
    pub idle: usize,
    /// Acquisitions that found the pool empty.
    pub created: u64,
    /// Acquisitions served by a pooled object.
    pub reused: u64,
    /// Releases that put the object back.
    pub recycled: u64,
    /// Releases that dropped the object.
    pub discarded: u64,
}

#[derive(Default)]
struct Counters {
    created: AtomicU64,
    reused: AtomicU64,
    recycled: AtomicU64,
    discarded: AtomicU64,
}

pub struct ObjectPool<T> {
    objects: object_pool::Pool<T>,
    max_idle: usize,
    max_retained_capacity: usize,
    counters: Counters,
}

impl<T: Recycle> ObjectPool<T> {
    pub fn new(max_idle: usize, max_retained_capacity: usize, preallocate: usize) -> Self {
        Self {
            objects: object_pool::Pool::new(preallocate.min(max_idle), T::default),
            max_idle,
            max_retained_capacity,
            counters: Counters::default(),
        }
    }

    /// Take an object out of the pool, or create one if the pool is empty.
    ///
    /// The object is always empty, but may carry capacity from an earlier
    /// use.
    pub fn acquire(self: &Arc<Self>) -> Pooled<T> {
        let value = match self.objects.try_pull() {
            Some(reusable) => {
                let (_, mut value) = reusable.detach();
                value.clear();
                self.counters.reused.fetch_add(1, Ordering::Relaxed);
                value
            }
            None => {
                self.counters.created.fetch_add(1, Ordering::Relaxed);
                T::default()
            }
        };

        Pooled {
            value,
            pool: Arc::clone(self),
        }
    }

    fn recycle(&self, value: T) {
        let retained = value.retained_capacity();
        if retained > self.max_retained_capacity {
            self.counters.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(
                retained,
                max = self.max_retained_capacity,
                "Drop oversized pooled object"
            );
            return;
        }
        // The bound is approximate under concurrent releases.
        if self.objects.len() >= self.max_idle {
            self.counters.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.objects.attach(value);
        self.counters.recycled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn max_retained_capacity(&self) -> usize {
        self.max_retained_capacity
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.objects.len(),
            created: self.counters.created.load(Ordering::Relaxed),
            reused: self.counters.reused.load(Ordering::Relaxed),
            recycled: self.counters.recycled.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
        }
    }
}

impl BufferPool {
    pub fn from_config(config: &BufferPoolConfig) -> Self {
        Self::new(
            config.max_idle,
            config.max_retained_capacity.as_u64() as usize,
            config.preallocate,
        )
    }
}

impl SeriesPool {
    pub fn from_config(config: &SeriesPoolConfig) -> Self {
        Self::new(
            config.max_idle,
            config.max_retained_capacity.as_u64() as usize,
            config.preallocate,
        )
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("idle", &self.objects.len())
            .field("max_idle", &self.max_idle)
            .field("max_retained_capacity", &self.max_retained_capacity)
            .finish()
    }
}

/// Exclusive handle to a pooled object.
///
/// Releasing the handle, explicitly with [`Pooled::release`] or by dropping
/// it, hands the object back to its pool.
pub struct Pooled<T: Recycle> {
    value: T,
    pool: Arc<ObjectPool<T>>,
}

impl<T: Recycle> Pooled<T> {
    /// Give the object back to its pool.
    pub fn release(self) {
        drop(self);
    }
}

impl<T: Recycle> Drop for Pooled<T> {
    fn drop(&mut self) {
        // An empty default is left behind and dropped with the handle.
        let value = mem::take(&mut self.value);
        self.pool.recycle(value);
    }
}

impl<T: Recycle> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Recycle> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Recycle + fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}
