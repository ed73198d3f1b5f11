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

//! Layout helpers for texture-to-buffer copies.
//!
//! GPU copies pad every row to a fixed alignment; the CPU side wants tightly
//! packed RGBA. These functions are backend agnostic so they can be tested
//! without a device.

/// Bytes per pixel of the 8-bit four-channel formats read back.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Row alignment required by buffer copies (wgpu's `COPY_BYTES_PER_ROW_ALIGNMENT`).
pub const ROW_ALIGNMENT: u32 = 256;

/// The padded stride of one row of `width` pixels.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    (width * BYTES_PER_PIXEL).div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT
}

/// Copies `height` rows out of a padded staging buffer into a packed buffer.
pub fn strip_row_padding(padded: &[u8], width: u32, height: u32, padded_stride: u32) -> Vec<u8> {
    let row = (width * BYTES_PER_PIXEL) as usize;
    let mut packed = Vec::with_capacity(row * height as usize);
    for chunk in padded.chunks(padded_stride as usize).take(height as usize) {
        packed.extend_from_slice(&chunk[..row]);
    }
    packed
}

/// Reorders BGRA pixels to RGBA in place.
pub fn swizzle_bgra_to_rgba(data: &mut [u8]) {
    for px in data.chunks_exact_mut(BYTES_PER_PIXEL as usize) {
        px.swap(0, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_bytes_per_row() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(256), 1024);
    }

    #[test]
    fn test_strip_row_padding() {
        let stride = padded_bytes_per_row(2);
        let mut padded = vec![0xAA; (stride * 2) as usize];
        padded[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        padded[stride as usize..stride as usize + 8].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);

        let packed = strip_row_padding(&padded, 2, 2, stride);

        assert_eq!(packed, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_swizzle() {
        let mut data = vec![3, 2, 1, 255, 30, 20, 10, 128];
        swizzle_bgra_to_rgba(&mut data);
        assert_eq!(data, vec![1, 2, 3, 255, 10, 20, 30, 128]);
    }
}
