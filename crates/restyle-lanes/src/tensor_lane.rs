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

//! Conversion between pixel buffers and normalized tensors.
//!
//! The model contract is channels-last float32 in `[0, 1]`: the bridge encodes
//! an RGB(A) buffer to `[1, H, W, 3]` (alpha dropped) and decodes a `[H, W, C]`
//! tensor, with an optional leading batch axis of 1, back to RGBA8.

use ndarray::{ArrayD, Axis, IxDyn};
use restyle_core::{
    lane::{Lane, LaneKind},
    PixelBuffer, PixelFormat, ShapeError, Tensor, TensorPool,
};

/// Normalized channel values per encoded pixel.
const MODEL_CHANNELS: usize = 3;

/// A lane that moves images in and out of tensor space.
#[derive(Debug, Clone)]
pub struct TensorBridge {
    pool: TensorPool,
}

impl TensorBridge {
    /// Creates a bridge that allocates from `pool`.
    pub fn new(pool: TensorPool) -> Self {
        Self { pool }
    }

    /// The pool encoded tensors are accounted against.
    pub fn pool(&self) -> &TensorPool {
        &self.pool
    }

    /// Encodes a pixel buffer as a `[1, H, W, 3]` tensor in `[0, 1]`.
    pub fn encode(&self, pixels: &PixelBuffer) -> Result<Tensor, ShapeError> {
        let stride = pixels.format().bytes_per_pixel();
        let (width, height) = (pixels.width() as usize, pixels.height() as usize);

        let mut values = Vec::with_capacity(width * height * MODEL_CHANNELS);
        for px in pixels.data().chunks_exact(stride) {
            values.extend(px[..MODEL_CHANNELS].iter().map(|&c| f32::from(c) / 255.0));
        }

        let shape = [1, height, width, MODEL_CHANNELS];
        let array = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|_| {
            ShapeError::BufferLength {
                expected: width * height * stride,
                actual: pixels.data().len(),
            }
        })?;
        Ok(self.pool.adopt(array))
    }

    /// Decodes a `[H, W, C]` or `[1, H, W, C]` tensor into an RGBA8 buffer.
    ///
    /// `C` may be 1 (grayscale, replicated), 3 (alpha set opaque) or 4. Values
    /// are scaled by 255, rounded and clamped to `[0, 255]`. The tensor is only
    /// read; its release is the caller's.
    pub fn decode(&self, tensor: &Tensor) -> Result<PixelBuffer, ShapeError> {
        let mut view = tensor.view();
        if view.ndim() == 4 {
            if view.shape()[0] != 1 {
                return Err(ShapeError::MissingBatch {
                    shape: tensor.shape().to_vec(),
                });
            }
            view = view.index_axis_move(Axis(0), 0);
        }
        if view.ndim() != 3 {
            return Err(ShapeError::Rank {
                expected: 3,
                shape: tensor.shape().to_vec(),
            });
        }

        let (height, width, channels) = (view.shape()[0], view.shape()[1], view.shape()[2]);
        if !matches!(channels, 1 | 3 | 4) {
            return Err(ShapeError::Channels {
                shape: tensor.shape().to_vec(),
            });
        }

        let mut data = Vec::with_capacity(width * height * 4);
        for px in view.lanes(Axis(2)) {
            match channels {
                1 => {
                    let v = quantize(px[0]);
                    data.extend_from_slice(&[v, v, v, u8::MAX]);
                }
                3 => data.extend_from_slice(&[
                    quantize(px[0]),
                    quantize(px[1]),
                    quantize(px[2]),
                    u8::MAX,
                ]),
                _ => data.extend_from_slice(&[
                    quantize(px[0]),
                    quantize(px[1]),
                    quantize(px[2]),
                    quantize(px[3]),
                ]),
            }
        }

        PixelBuffer::new(data, width as u32, height as u32, PixelFormat::Rgba8)
    }
}

impl Lane for TensorBridge {
    fn strategy_name(&self) -> &'static str {
        "ChannelsLastF32"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Tensor
    }
}

#[inline]
fn quantize(value: f32) -> u8 {
    // NaN saturates to 0 through the cast.
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
