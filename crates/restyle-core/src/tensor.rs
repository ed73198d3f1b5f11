// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tracked numeric tensors.
//!
//! Every [`Tensor`] holds a lease on the [`TensorPool`] that created it. The
//! lease is returned when the tensor is dropped or explicitly released, so
//! scoped ownership is the release discipline: a tensor that goes out of scope
//! on an error path is released exactly like one that completed its cycle.
//! The pool's counters make leaks observable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

use crate::error::ShapeError;

#[derive(Debug, Default)]
struct PoolCounters {
    live: AtomicUsize,
    peak: AtomicUsize,
    allocated: AtomicUsize,
}

/// The allocator every tensor in a session is accounted against.
///
/// Cloning a pool yields a handle to the same counters.
#[derive(Debug, Clone, Default)]
pub struct TensorPool {
    counters: Arc<PoolCounters>,
}

impl TensorPool {
    /// Creates a pool with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of an array and starts tracking it.
    pub fn adopt(&self, data: ArrayD<f32>) -> Tensor {
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(live, Ordering::SeqCst);
        self.counters.allocated.fetch_add(1, Ordering::SeqCst);
        Tensor {
            data,
            _lease: Lease {
                counters: Arc::clone(&self.counters),
            },
        }
    }

    /// Allocates a zero-filled tensor of the given shape.
    pub fn zeros(&self, shape: &[usize]) -> Tensor {
        self.adopt(ArrayD::zeros(IxDyn(shape)))
    }

    /// Tensors currently alive.
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// The highest number of simultaneously live tensors seen so far.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    /// Total tensors ever created through this pool.
    pub fn allocated(&self) -> usize {
        self.counters.allocated.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct Lease {
    counters: Arc<PoolCounters>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A dense `f32` tensor whose lifetime is tracked by a [`TensorPool`].
#[derive(Debug)]
pub struct Tensor {
    data: ArrayD<f32>,
    _lease: Lease,
}

impl Tensor {
    /// The tensor's shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// A read-only view of the values.
    #[inline]
    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    /// Explicitly returns the tensor to its pool.
    ///
    /// Equivalent to dropping it; spelled out at call sites where the release
    /// point matters.
    #[inline]
    pub fn release(self) {
        drop(self);
    }

    /// Removes the leading batch axis of size 1.
    pub fn squeeze_batch(self) -> Result<Tensor, ShapeError> {
        if self.ndim() == 0 || self.shape()[0] != 1 {
            return Err(ShapeError::MissingBatch {
                shape: self.shape().to_vec(),
            });
        }
        let Tensor { data, _lease } = self;
        Ok(Tensor {
            data: data.index_axis_move(Axis(0), 0),
            _lease,
        })
    }

    /// Copies the values out, leaving the tensor (and its lease) untouched.
    pub fn to_array(&self) -> ArrayD<f32> {
        self.data.clone()
    }

    /// Compares shape and the exact bit patterns of every value.
    pub fn bitwise_eq(&self, other: &Tensor) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_returns_lease() {
        let pool = TensorPool::new();
        let a = pool.zeros(&[1, 2, 2, 3]);
        let b = pool.zeros(&[4]);
        assert_eq!(pool.live(), 2);
        a.release();
        assert_eq!(pool.live(), 1);
        drop(b);
        assert_eq!(pool.live(), 0);
        assert_eq!(pool.peak(), 2);
        assert_eq!(pool.allocated(), 2);
    }

    #[test]
    fn test_squeeze_batch_keeps_single_lease() {
        let pool = TensorPool::new();
        let t = pool.zeros(&[1, 5, 7, 3]);
        let squeezed = t.squeeze_batch().unwrap();
        assert_eq!(squeezed.shape(), &[5, 7, 3]);
        assert_eq!(pool.live(), 1);
        drop(squeezed);
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn test_squeeze_batch_rejects_non_unit_batch() {
        let pool = TensorPool::new();
        let err = pool.zeros(&[2, 4, 4, 3]).squeeze_batch().unwrap_err();
        assert_eq!(
            err,
            ShapeError::MissingBatch {
                shape: vec![2, 4, 4, 3]
            }
        );
        // The rejected tensor was consumed and released.
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn test_bitwise_eq() {
        let pool = TensorPool::new();
        let a = pool.adopt(ArrayD::from_elem(IxDyn(&[2, 2]), 0.5));
        let b = pool.adopt(ArrayD::from_elem(IxDyn(&[2, 2]), 0.5));
        let c = pool.adopt(ArrayD::from_elem(IxDyn(&[4]), 0.5));
        assert!(a.bitwise_eq(&b));
        assert!(!a.bitwise_eq(&c));
    }
}
