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

//! Defines the standard PBR material with metallic-roughness workflow.

use crate::{
    asset::{Asset, Material},
    math::LinearRgba,
};

use super::TextureSlot;

/// A physically-based rendering (PBR) material using the metallic-roughness workflow.
///
/// The base-color texture slot is where stylized frames land: the sampled
/// texel is multiplied with `base_color`, so a white base color shows the
/// stylized image unchanged.
///
/// # Examples
///
/// ```
/// use restyle_core::asset::StandardMaterial;
/// use restyle_core::math::LinearRgba;
///
/// // A rough gold sphere.
/// let gold = StandardMaterial {
///     base_color: LinearRgba::new(1.0, 0.766, 0.336, 1.0),
///     metallic: 1.0,
///     roughness: 1.0,
///     ..Default::default()
/// };
/// assert!(gold.base_color_texture.texture().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct StandardMaterial {
    /// The base color (albedo) of the material.
    pub base_color: LinearRgba,

    /// Texture multiplied with `base_color`. Receives the stylized frame.
    pub base_color_texture: TextureSlot,

    /// The metallic factor (0.0 = dielectric, 1.0 = metal).
    pub metallic: f32,

    /// The roughness factor (0.0 = smooth, 1.0 = rough).
    pub roughness: f32,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            base_color: LinearRgba::new(0.8, 0.8, 0.8, 1.0), // Light gray
            base_color_texture: TextureSlot::new(),
            metallic: 0.0,
            roughness: 0.5,
        }
    }
}

impl Asset for StandardMaterial {}

impl Material for StandardMaterial {
    fn kind(&self) -> &'static str {
        "StandardMaterial"
    }

    fn texture_slot(&self) -> Option<&TextureSlot> {
        Some(&self.base_color_texture)
    }

    fn texture_slot_mut(&mut self) -> Option<&mut TextureSlot> {
        Some(&mut self.base_color_texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TextureId;

    #[test]
    fn test_standard_material_default() {
        let material = StandardMaterial::default();

        assert_eq!(material.base_color, LinearRgba::new(0.8, 0.8, 0.8, 1.0));
        assert_eq!(material.metallic, 0.0);
        assert_eq!(material.roughness, 0.5);
        assert!(material.base_color_texture.texture().is_none());
    }

    #[test]
    fn test_standard_material_exposes_base_color_slot() {
        let mut material = StandardMaterial::default();
        material
            .texture_slot_mut()
            .expect("standard material has a slot")
            .replace(TextureId(7));
        assert_eq!(material.base_color_texture.texture(), Some(TextureId(7)));
        assert_eq!(material.kind(), "StandardMaterial");
    }
}
