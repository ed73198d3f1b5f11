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

//! An offscreen color target whose pixels can be read back to the CPU.

use std::sync::Arc;

use async_trait::async_trait;
use restyle_core::{
    math::{Extent2D, LinearRgba},
    PixelBuffer, PixelFormat, ReadbackError, RenderTarget,
};
use tokio::sync::oneshot::{self, error::TryRecvError};

use super::context::WgpuContext;
use crate::graphics::readback::{padded_bytes_per_row, strip_row_padding, swizzle_bgra_to_rgba, ROW_ALIGNMENT};

/// A render target backed by an offscreen wgpu texture.
///
/// The host renders into [`view`](Self::view); [`read_pixels`](RenderTarget::read_pixels)
/// copies the texture into a row-aligned staging buffer, polls the device
/// without blocking until the copy is mapped, and returns tightly packed RGBA8.
#[derive(Debug)]
pub struct WgpuRenderTarget {
    context: Arc<WgpuContext>,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    extent: Extent2D,
}

impl WgpuRenderTarget {
    /// Creates a `width` x `height` target in `format`.
    ///
    /// Only 8-bit RGBA and BGRA formats can be read back.
    pub fn new(
        context: Arc<WgpuContext>,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> anyhow::Result<Self> {
        if !matches!(
            format,
            wgpu::TextureFormat::Rgba8Unorm
                | wgpu::TextureFormat::Rgba8UnormSrgb
                | wgpu::TextureFormat::Bgra8Unorm
                | wgpu::TextureFormat::Bgra8UnormSrgb
        ) {
            anyhow::bail!("Unsupported readback format {format:?}");
        }
        debug_assert_eq!(ROW_ALIGNMENT, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("restyle-render-target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::info!("WgpuRenderTarget: created {width}x{height} {format:?} target");

        Ok(Self {
            context,
            texture,
            view,
            format,
            extent: Extent2D::new(width, height),
        })
    }

    /// The view to render into.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// The texture format of the target.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Records and submits a pass that clears the target to `color`.
    pub fn clear(&self, color: LinearRgba) {
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("restyle-clear"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("restyle-clear-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r as f64,
                            g: color.g as f64,
                            b: color.b as f64,
                            a: color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.context.queue.submit(Some(encoder.finish()));
    }

    fn is_bgra(&self) -> bool {
        matches!(
            self.format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        )
    }
}

#[async_trait]
impl RenderTarget for WgpuRenderTarget {
    fn extent(&self) -> Extent2D {
        self.extent
    }

    async fn read_pixels(&self) -> Result<PixelBuffer, ReadbackError> {
        let Extent2D { width, height } = self.extent;
        if width == 0 || height == 0 {
            return Err(ReadbackError::Unavailable);
        }

        let device = &self.context.device;
        let stride = padded_bytes_per_row(width);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("restyle-readback-staging"),
            size: stride as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("restyle-readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(stride),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.context.queue.submit(Some(encoder.finish()));

        let (sender, mut mapped) = oneshot::channel();
        staging.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        // PollType::Poll only runs callbacks for work that is already done, so
        // the host keeps rendering between polls.
        loop {
            match mapped.try_recv() {
                Ok(result) => {
                    result.map_err(|e| ReadbackError::MapFailed(format!("{e:?}")))?;
                    break;
                }
                Err(TryRecvError::Empty) => {
                    device
                        .poll(wgpu::PollType::Poll)
                        .map_err(|e| ReadbackError::Backend(format!("{e:?}")))?;
                    tokio::task::yield_now().await;
                }
                Err(TryRecvError::Closed) => {
                    return Err(ReadbackError::MapFailed("map callback was dropped".into()));
                }
            }
        }

        let mut pixels = {
            let mapped = staging.slice(..).get_mapped_range();
            strip_row_padding(&mapped, width, height, stride)
        };
        staging.unmap();

        if self.is_bgra() {
            swizzle_bgra_to_rgba(&mut pixels);
        }
        log::trace!("WgpuRenderTarget: read back {width}x{height}");

        PixelBuffer::new(pixels, width, height, PixelFormat::Rgba8)
            .map_err(|e| ReadbackError::Backend(e.to_string()))
    }
}
