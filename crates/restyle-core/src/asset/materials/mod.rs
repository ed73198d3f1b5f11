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

//! Defines the core traits and material types for the rendering system.

mod standard;
mod unlit;
mod wireframe;

pub use standard::*;
pub use unlit::*;
pub use wireframe::*;

use std::any::Any;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use super::Asset;
use crate::renderer::TextureId;

/// Helper trait to allow downcasting `dyn Material` trait objects to their concrete types.
pub trait AsAny {
    /// Returns a reference to the inner value as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The slot a material samples its surface image from.
///
/// Holds at most one texture. Replacing it hands back the previous handle so
/// the caller can destroy it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureSlot {
    texture: Option<TextureId>,
}

impl TextureSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently bound texture.
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Binds `texture` and returns whatever was bound before.
    pub fn replace(&mut self, texture: TextureId) -> Option<TextureId> {
        self.texture.replace(texture)
    }
}

/// A trait for types that can be used as a material.
///
/// A material defines the surface properties of an object being rendered.
/// Only materials that expose a [`TextureSlot`] can receive stylized frames.
pub trait Material: Asset + AsAny + Debug {
    /// The material's type name, used when reporting a mismatch.
    fn kind(&self) -> &'static str;

    /// The texture slot, if this material samples one.
    fn texture_slot(&self) -> Option<&TextureSlot> {
        None
    }

    /// Mutable access to the texture slot, if this material samples one.
    fn texture_slot_mut(&mut self) -> Option<&mut TextureSlot> {
        None
    }
}

impl Asset for Box<dyn Material> {}

/// One mesh's material, shared between the render loop and the feedback stage.
///
/// The render loop takes read locks; only texture feedback takes the write
/// lock, and only for the instant of the swap.
pub type SharedMaterial = Arc<RwLock<Box<dyn Material>>>;

/// Wraps a material for sharing.
pub fn shared_material<M: Material>(material: M) -> SharedMaterial {
    Arc::new(RwLock::new(Box::new(material)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_replace_returns_previous() {
        let mut slot = TextureSlot::new();
        assert_eq!(slot.replace(TextureId(1)), None);
        assert_eq!(slot.replace(TextureId(2)), Some(TextureId(1)));
        assert_eq!(slot.texture(), Some(TextureId(2)));
    }

    #[test]
    fn test_shared_material_downcast() {
        let shared = shared_material(UnlitMaterial::default());
        let guard = shared.read().unwrap();
        assert!((**guard).as_any().downcast_ref::<UnlitMaterial>().is_some());
        assert_eq!(guard.kind(), "UnlitMaterial");
    }
}
