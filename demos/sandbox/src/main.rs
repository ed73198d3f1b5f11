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

// Restyle Sandbox
// Headless demo: renders into an offscreen target and feeds stylized frames
// back onto the surface material.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use restyle_sdk::prelude::*;

const DEFAULT_CONFIG: &str = "demos/sandbox/assets/loop.ron";
const TARGET_SIZE: u32 = 256;
const FRAMES: u32 = 240;
const FRAME_TIME: Duration = Duration::from_millis(16);

/// A slowly cycling clear color standing in for a rendered scene.
fn scene_color(frame: u32) -> LinearRgba {
    let t = frame as f32 / FRAMES as f32;
    LinearRgba::rgb(t, 0.3, 1.0 - t)
}

async fn run(config_path: &str) -> Result<()> {
    let config = LoopConfig::load(config_path)
        .with_context(|| format!("Failed to load loop configuration '{config_path}'"))?;

    let context = Arc::new(
        WgpuContext::new_headless()
            .await
            .context("Failed to create the graphics context")?,
    );
    let target = Arc::new(WgpuRenderTarget::new(
        Arc::clone(&context),
        TARGET_SIZE,
        TARGET_SIZE,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    )?);
    let textures = Arc::new(WgpuTextureBackend::new(Arc::clone(&context)));

    let fetcher = AssetFetcher::new();
    let backends = LoopBackends {
        loader: Arc::new(OnnxModelLoader::new(fetcher.clone())),
        fetcher,
        target: target.clone(),
        textures: textures.clone(),
    };
    let mut style_loop = StyleLoop::start(&config, backends, shared_material(StandardMaterial::default())).await?;
    let reports = style_loop.reports();

    let mut skipped = 0u32;
    for frame in 0..FRAMES {
        style_loop.on_frame(Instant::now());
        if style_loop.should_render() {
            target.clear(scene_color(frame));
        } else {
            skipped += 1;
        }

        for report in reports.try_iter() {
            match &report.outcome {
                CycleOutcome::Applied { texture, extent } => log::info!(
                    "Cycle {} applied {texture:?} ({extent}) in {:?}",
                    report.sequence,
                    report.duration
                ),
                other => log::info!("Cycle {} finished: {other:?}", report.sequence),
            }
        }
        if let Some(exports) = style_loop.exports() {
            for image in exports.try_iter() {
                log::info!(
                    "Exported cycle {} as {} ({} bytes)",
                    image.sequence,
                    image.mime,
                    image.data_url.len()
                );
            }
        }
        tokio::time::sleep(FRAME_TIME).await;
    }

    style_loop.stop();
    style_loop.wait_idle().await;

    let stats = style_loop.stats();
    log::info!("--- Restyle Summary ---");
    log::info!(
        "  Cycles: {} started, {} completed, {} failed, {} mismatched",
        stats.started,
        stats.completed,
        stats.failed,
        stats.mismatched
    );
    log::info!("  Dropped triggers: {}", stats.dropped_triggers);
    log::info!("  Frames skipped for capture: {skipped}");
    log::info!(
        "  Surface textures: {} live, {:.2} MB",
        textures.live_textures(),
        textures.allocated_bytes() as f64 / (1024.0 * 1024.0)
    );
    log::info!("-----------------------");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    run(&config_path).await
}
