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

//! Puts stylized pixels back on the rendered surface.
//!
//! The swap protocol: check the material can take a texture, create the new
//! texture, exchange it into the slot under the material's write lock, then
//! destroy the texture it displaced. The renderer therefore always samples
//! either the old texture or the new one, never a destroyed handle, and at
//! most one texture produced by this lane is alive per material after the
//! call returns.

mod export;

pub use export::*;

use std::sync::{Arc, PoisonError};

use restyle_core::{
    asset::{Material, SharedMaterial},
    lane::{Lane, LaneKind},
    renderer::{SamplingMode, TextureId},
    MaterialMismatch, PixelBuffer, ResourceError, StylizedFrame, TextureBackend,
};

/// Result of a successful feedback call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// The new texture is bound.
    Applied {
        /// The texture now in the material's slot.
        texture: TextureId,
        /// The texture it replaced, already destroyed.
        replaced: Option<TextureId>,
    },
    /// The material has no slot; nothing was created or destroyed.
    Mismatch(MaterialMismatch),
}

/// A lane that uploads frames as textures and swaps them into a material.
#[derive(Debug)]
pub struct TextureFeedback {
    backend: Arc<dyn TextureBackend>,
    sampling: SamplingMode,
    exporter: Option<FrameExporter>,
}

impl TextureFeedback {
    /// Creates a feedback lane uploading through `backend`.
    pub fn new(backend: Arc<dyn TextureBackend>, sampling: SamplingMode) -> Self {
        Self {
            backend,
            sampling,
            exporter: None,
        }
    }

    /// Also hands every applied stylized frame to `exporter`.
    pub fn with_exporter(mut self, exporter: FrameExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// The sampling mode of created textures.
    pub fn sampling(&self) -> SamplingMode {
        self.sampling
    }

    /// Applies the stylized output of cycle `sequence` to `material`.
    pub fn apply(
        &self,
        frame: &StylizedFrame,
        material: &SharedMaterial,
        sequence: u64,
    ) -> Result<FeedbackOutcome, ResourceError> {
        let outcome = self.swap_in(&frame.pixels, material, "stylized-surface")?;
        if let (FeedbackOutcome::Applied { .. }, Some(exporter)) = (&outcome, &self.exporter) {
            // Detached; the exporter logs its own drops.
            let _ = exporter.submit(sequence, frame);
        }
        Ok(outcome)
    }

    /// Binds a plain image to `material`, e.g. the initial surface picture.
    pub fn bind(&self, pixels: &PixelBuffer, material: &SharedMaterial) -> Result<FeedbackOutcome, ResourceError> {
        self.swap_in(pixels, material, "initial-surface")
    }

    fn swap_in(
        &self,
        pixels: &PixelBuffer,
        material: &SharedMaterial,
        label: &str,
    ) -> Result<FeedbackOutcome, ResourceError> {
        {
            let guard = material.read().unwrap_or_else(PoisonError::into_inner);
            if guard.texture_slot().is_none() {
                return Ok(self.mismatch(guard.kind()));
            }
        }

        let texture = self.backend.create_texture(pixels, self.sampling, Some(label))?;

        let mut guard = material.write().unwrap_or_else(PoisonError::into_inner);
        let kind = guard.kind();
        let swapped = guard.texture_slot_mut().map(|slot| slot.replace(texture));
        drop(guard);

        let replaced = match swapped {
            Some(replaced) => replaced,
            None => {
                // The material was swapped for a slotless one between the check and the lock.
                self.backend.destroy_texture(texture)?;
                return Ok(self.mismatch(kind));
            }
        };

        if let Some(old) = replaced {
            if let Err(e) = self.backend.destroy_texture(old) {
                log::warn!("TextureFeedback: failed to destroy replaced texture {old:?}: {e}");
            }
        }
        log::debug!(
            "TextureFeedback: bound {texture:?} ({}) to {kind}, replaced {replaced:?}",
            pixels.extent()
        );

        Ok(FeedbackOutcome::Applied { texture, replaced })
    }

    fn mismatch(&self, material: &'static str) -> FeedbackOutcome {
        let mismatch = MaterialMismatch { material };
        log::warn!("TextureFeedback: {mismatch}, frame not applied");
        FeedbackOutcome::Mismatch(mismatch)
    }
}

impl Lane for TextureFeedback {
    fn strategy_name(&self) -> &'static str {
        "SlotSwap"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Feedback
    }
}
