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

//! Creates, uploads and destroys the surface textures bound by the loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use restyle_core::{
    renderer::{SamplingMode, TextureId},
    PixelBuffer, ResourceError, TextureBackend,
};

use super::context::WgpuContext;

#[derive(Debug)]
struct WgpuTextureEntry {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampling: SamplingMode,
    size: u64,
}

/// A [`TextureBackend`] that keeps its textures in a wgpu device.
///
/// Pixel data is treated as sRGB, like any decoded image. One sampler per
/// [`SamplingMode`] is created up front and shared by all textures.
#[derive(Debug)]
pub struct WgpuTextureBackend {
    context: Arc<WgpuContext>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    nearest: wgpu::Sampler,
    linear: wgpu::Sampler,
    next_texture_id: AtomicUsize,
    allocated_bytes: AtomicUsize,
}

impl WgpuTextureBackend {
    /// Creates an empty backend on `context`.
    pub fn new(context: Arc<WgpuContext>) -> Self {
        let nearest = Self::create_sampler(&context.device, wgpu::FilterMode::Nearest, "restyle-sampler-nearest");
        let linear = Self::create_sampler(&context.device, wgpu::FilterMode::Linear, "restyle-sampler-linear");
        Self {
            context,
            textures: Mutex::new(HashMap::new()),
            nearest,
            linear,
            next_texture_id: AtomicUsize::new(0),
            allocated_bytes: AtomicUsize::new(0),
        }
    }

    fn create_sampler(device: &wgpu::Device, filter: wgpu::FilterMode, label: &str) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        })
    }

    /// The sampler matching `mode`.
    pub fn sampler(&self, mode: SamplingMode) -> &wgpu::Sampler {
        match mode {
            SamplingMode::Nearest => &self.nearest,
            SamplingMode::Linear => &self.linear,
        }
    }

    /// The view and sampler a renderer binds for texture `id`.
    pub fn binding(&self, id: TextureId) -> Option<(wgpu::TextureView, wgpu::Sampler)> {
        let textures = self.textures.lock().unwrap_or_else(PoisonError::into_inner);
        textures
            .get(&id)
            .map(|entry| (entry.view.clone(), self.sampler(entry.sampling).clone()))
    }

    /// Textures currently alive in this backend.
    pub fn live_textures(&self) -> usize {
        self.textures.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Bytes of texture memory currently allocated.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes.load(Ordering::Relaxed)
    }
}

impl TextureBackend for WgpuTextureBackend {
    fn create_texture(
        &self,
        pixels: &PixelBuffer,
        sampling: SamplingMode,
        label: Option<&str>,
    ) -> Result<TextureId, ResourceError> {
        if pixels.extent().is_empty() {
            return Err(ResourceError::InvalidData(format!(
                "cannot create a {} texture",
                pixels.extent()
            )));
        }
        let rgba = pixels.to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let id = TextureId(self.next_texture_id.fetch_add(1, Ordering::Relaxed));
        let size_in_bytes = rgba.data().len() as u64;
        self.allocated_bytes
            .fetch_add(size_in_bytes as usize, Ordering::Relaxed);
        self.textures.lock().unwrap_or_else(PoisonError::into_inner).insert(
            id,
            WgpuTextureEntry {
                texture,
                view,
                sampling,
                size: size_in_bytes,
            },
        );

        log::debug!(
            "WgpuTextureBackend: Created texture '{}' with ID: {:?}, {}x{}, {:?} sampling",
            label.unwrap_or_default(),
            id,
            width,
            height,
            sampling
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut textures = self.textures.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = textures.remove(&id).ok_or(ResourceError::NotFound)?;
        entry.texture.destroy();
        self.allocated_bytes
            .fetch_sub(entry.size as usize, Ordering::Relaxed);
        log::debug!("WgpuTextureBackend: Destroyed texture with ID: {id:?}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_destroy_or_skip() {
        // This test requires a physical device, so it might be skipped on CI without one.
        let Ok(context) = WgpuContext::new_headless_blocking() else {
            println!("Skipping texture backend test: could not create test device.");
            return;
        };
        let backend = WgpuTextureBackend::new(Arc::new(context));

        let a = backend
            .create_texture(&PixelBuffer::solid_rgba(4, 4, [1, 2, 3, 4]), SamplingMode::Nearest, Some("a"))
            .unwrap();
        let b = backend
            .create_texture(&PixelBuffer::solid_rgba(2, 2, [0; 4]), SamplingMode::Linear, None)
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.live_textures(), 2);
        assert_eq!(backend.allocated_bytes(), 64 + 16);
        assert!(backend.binding(a).is_some());

        backend.destroy_texture(a).unwrap();
        assert_eq!(backend.live_textures(), 1);
        assert_eq!(backend.destroy_texture(a), Err(ResourceError::NotFound));
        assert!(backend.binding(a).is_none());
    }

    #[test]
    fn test_rejects_empty_pixels_or_skip() {
        let Ok(context) = WgpuContext::new_headless_blocking() else {
            return;
        };
        let backend = WgpuTextureBackend::new(Arc::new(context));
        let empty = PixelBuffer::new(Vec::new(), 0, 0, restyle_core::PixelFormat::Rgba8).unwrap();
        assert!(matches!(
            backend.create_texture(&empty, SamplingMode::Nearest, None),
            Err(ResourceError::InvalidData(_))
        ));
    }
}
