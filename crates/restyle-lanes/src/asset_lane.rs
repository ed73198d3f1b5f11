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

//! Image decoding for the style reference and the initial surface picture.

use restyle_core::{AssetLoadError, PixelBuffer, PixelFormat};

/// Decodes any format the `image` crate recognizes into an RGBA8 pixel buffer.
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer, AssetLoadError> {
    let img = image::load_from_memory(bytes).map_err(|e| AssetLoadError::ImageDecode { reason: e.to_string() })?;

    let rgba_img = img.to_rgba8();
    let (width, height) = rgba_img.dimensions();

    PixelBuffer::new(rgba_img.into_raw(), width, height, PixelFormat::Rgba8)
        .map_err(|e| AssetLoadError::ImageDecode { reason: e.to_string() })
}
