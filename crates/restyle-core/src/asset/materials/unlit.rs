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

//! Defines unlit materials for the rendering system.

use crate::{
    asset::{Asset, Material},
    math::LinearRgba,
};

use super::TextureSlot;

/// A simple, unlit material.
///
/// This material does not react to lighting and renders its base color
/// modulated by its texture. Useful for showing a stylized frame exactly as
/// the transform network produced it.
#[derive(Debug, Clone, Default)]
pub struct UnlitMaterial {
    /// The base color of the material.
    pub base_color: LinearRgba,
    /// The sampled texture.
    pub texture: TextureSlot,
}

// Mark `UnlitMaterial` as a valid asset.
impl Asset for UnlitMaterial {}

impl Material for UnlitMaterial {
    fn kind(&self) -> &'static str {
        "UnlitMaterial"
    }

    fn texture_slot(&self) -> Option<&TextureSlot> {
        Some(&self.texture)
    }

    fn texture_slot_mut(&mut self) -> Option<&mut TextureSlot> {
        Some(&mut self.texture)
    }
}
