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

//! Backend traits the loop is written against.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::image::PixelBuffer;
use crate::math::Extent2D;
use crate::renderer::{ReadbackError, ResourceError, SamplingMode, TextureId};

/// A drawable surface whose backing pixels can be read back to the CPU.
#[async_trait]
pub trait RenderTarget: Send + Sync + Debug {
    /// The current size of the target.
    fn extent(&self) -> Extent2D;

    /// Waits for the GPU to finish the frame being read, then copies its
    /// pixels into CPU memory as RGBA8.
    async fn read_pixels(&self) -> Result<PixelBuffer, ReadbackError>;
}

/// Creates and destroys the textures bound into the scene.
pub trait TextureBackend: Send + Sync + Debug {
    /// Uploads `pixels` into a new sampled texture.
    /// ## Errors
    /// * `ResourceError` - If the backend cannot allocate or upload the texture.
    fn create_texture(
        &self,
        pixels: &PixelBuffer,
        sampling: SamplingMode,
        label: Option<&str>,
    ) -> Result<TextureId, ResourceError>;

    /// Releases the texture associated with the given ID.
    /// ## Errors
    /// * `ResourceError::NotFound` - If the ID is unknown or already destroyed.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;
}
