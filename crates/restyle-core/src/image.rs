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

//! CPU-side pixel data flowing through the loop.
//!
//! A [`PixelBuffer`] is the common currency between readback, the tensor
//! bridge, and texture upload. The named wrappers ([`CapturedFrame`],
//! [`StylizedFrame`], [`StyleReference`]) exist so that each stage's signature
//! says which end of the loop a buffer came from.

use std::time::Instant;

use crate::error::ShapeError;
use crate::math::Extent2D;

/// Byte layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit red, green, blue, alpha. Four bytes per pixel.
    Rgba8,
    /// 8-bit red, green, blue. Three bytes per pixel.
    Rgb8,
}

impl PixelFormat {
    /// Number of bytes (and channels) per pixel.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// A tightly packed, row-major image in CPU memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    extent: Extent2D,
    format: PixelFormat,
}

impl PixelBuffer {
    /// Wraps raw pixel bytes, checking that the length matches the extent.
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self, ShapeError> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(ShapeError::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            extent: Extent2D::new(width, height),
            format,
        })
    }

    /// An RGBA buffer filled with a single color.
    pub fn solid_rgba(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            data,
            extent: Extent2D::new(width, height),
            format: PixelFormat::Rgba8,
        }
    }

    /// The raw bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns its bytes.
    #[inline]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    /// Width and height together.
    #[inline]
    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// The byte layout.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the buffer as RGBA8, expanding RGB with an opaque alpha channel.
    pub fn to_rgba8(&self) -> PixelBuffer {
        match self.format {
            PixelFormat::Rgba8 => self.clone(),
            PixelFormat::Rgb8 => {
                let mut data = Vec::with_capacity(self.extent.area() * 4);
                for px in self.data.chunks_exact(3) {
                    data.extend_from_slice(px);
                    data.push(u8::MAX);
                }
                PixelBuffer {
                    data,
                    extent: self.extent,
                    format: PixelFormat::Rgba8,
                }
            }
        }
    }
}

/// One rendered frame read back from the GPU.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// The frame's pixels.
    pub pixels: PixelBuffer,
    /// When the readback completed.
    pub captured_at: Instant,
}

impl CapturedFrame {
    /// Stamps a freshly read buffer with the current time.
    pub fn new(pixels: PixelBuffer) -> Self {
        Self {
            pixels,
            captured_at: Instant::now(),
        }
    }
}

/// The decoded output of one inference call.
///
/// Its extent is whatever the transform network emitted and may differ from
/// the captured frame it was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylizedFrame {
    /// The stylized pixels, always RGBA8.
    pub pixels: PixelBuffer,
}

/// The fixed image whose style is applied to every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleReference {
    /// The decoded reference image.
    pub pixels: PixelBuffer,
}
