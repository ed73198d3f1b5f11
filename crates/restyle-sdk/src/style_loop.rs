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

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use restyle_agents::{CycleContext, CycleController, CycleReport, CycleStats, TickOutcome};
use restyle_core::{
    asset::SharedMaterial, renderer::RenderGate, AssetSource, ModelLoader, PixelBuffer,
    RenderTarget, StyleReference, TensorPool, TextureBackend,
};
use restyle_infra::AssetFetcher;
use restyle_lanes::{
    decode_image, ExportedImage, FeedbackOutcome, FrameCapture, FrameExporter, InferenceSession,
    TextureFeedback,
};

use crate::config::LoopConfig;

/// The host-side services a loop runs against.
#[derive(Clone)]
pub struct LoopBackends {
    /// Turns model packages into runnable networks.
    pub loader: Arc<dyn ModelLoader>,
    /// Reads image assets.
    pub fetcher: AssetFetcher,
    /// The drawable whose frames are captured.
    pub target: Arc<dyn RenderTarget>,
    /// Allocates the surface textures.
    pub textures: Arc<dyn TextureBackend>,
}

/// A running render → infer → re-texture loop.
///
/// Built by [`StyleLoop::start`]; the host then calls [`on_frame`](Self::on_frame)
/// once per frame and skips drawing while [`should_render`](Self::should_render)
/// is false.
#[derive(Debug)]
pub struct StyleLoop {
    controller: CycleController,
    exports: Option<flume::Receiver<ExportedImage>>,
}

impl StyleLoop {
    /// Fetches every asset, initializes the inference session and binds the
    /// initial surface image, if any.
    ///
    /// Any failure here is fatal; no cycle is ever started from a partially
    /// initialized loop.
    pub async fn start(config: &LoopConfig, backends: LoopBackends, material: SharedMaterial) -> Result<Self> {
        config.cycle.validate()?;
        let LoopBackends {
            loader,
            fetcher,
            target,
            textures,
        } = backends;

        let style = StyleReference {
            pixels: fetch_image(&fetcher, &config.style_image)
                .await
                .context("Failed to load the style image")?,
        };
        let session = InferenceSession::initialize(
            loader.as_ref(),
            &config.encoder_model,
            &config.transform_model,
            &style,
            TensorPool::new(),
        )
        .await
        .context("Failed to initialize the inference session")?;

        let mut feedback = TextureFeedback::new(textures, config.cycle.sampling);
        let mut exports = None;
        if let Some(export) = config.cycle.export {
            let (exporter, receiver) = FrameExporter::new(export);
            feedback = feedback.with_exporter(exporter);
            exports = Some(receiver);
        }

        if let Some(surface) = &config.initial_surface {
            let pixels = fetch_image(&fetcher, surface)
                .await
                .context("Failed to load the initial surface image")?;
            match feedback.bind(&pixels, &material)? {
                FeedbackOutcome::Applied { texture, .. } => {
                    log::info!("Bound initial surface '{surface}' as {texture:?}")
                }
                FeedbackOutcome::Mismatch(mismatch) => {
                    log::warn!("Initial surface not bound: {mismatch}")
                }
            }
        }

        let capture = FrameCapture::new(config.cycle.capture, Arc::new(RenderGate::new()));
        let controller = CycleController::new(
            Arc::new(session),
            capture,
            feedback,
            CycleContext { target, material },
            config.cycle.trigger,
        );
        Ok(Self { controller, exports })
    }

    /// The per-frame scheduling hook. Must be called from within a tokio runtime.
    pub fn on_frame(&mut self, now: Instant) -> TickOutcome {
        self.controller.tick(now)
    }

    /// Whether the host should draw this frame. False while a paused capture
    /// holds the render gate.
    pub fn should_render(&self) -> bool {
        self.controller.render_gate().is_open()
    }

    /// Requests a cycle outside the trigger policy.
    pub fn trigger(&self) -> TickOutcome {
        self.controller.trigger()
    }

    /// Prevents further cycles. An in-flight cycle still completes.
    pub fn stop(&self) {
        self.controller.stop();
    }

    /// Resolves once no cycle is in flight.
    pub async fn wait_idle(&self) {
        self.controller.wait_idle().await;
    }

    /// Counters accumulated since start.
    pub fn stats(&self) -> CycleStats {
        self.controller.stats()
    }

    /// One report per finished cycle.
    pub fn reports(&self) -> flume::Receiver<CycleReport> {
        self.controller.reports()
    }

    /// Exported frames, when export is enabled.
    pub fn exports(&self) -> Option<&flume::Receiver<ExportedImage>> {
        self.exports.as_ref()
    }

    /// The underlying controller.
    pub fn controller(&self) -> &CycleController {
        &self.controller
    }
}

async fn fetch_image(fetcher: &AssetFetcher, source: &AssetSource) -> Result<PixelBuffer> {
    let bytes = fetcher.fetch(source).await?;
    let pixels = decode_image(&bytes).with_context(|| format!("while decoding '{source}'"))?;
    log::debug!("Decoded '{source}' ({})", pixels.extent());
    Ok(pixels)
}
