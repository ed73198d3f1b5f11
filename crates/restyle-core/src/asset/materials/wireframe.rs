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

//! Defines wireframe materials for debug visualization.

use crate::{
    asset::{Asset, Material},
    math::LinearRgba,
};

/// A material that renders geometry as colored lines.
///
/// Wireframes sample no texture, so a surface using one cannot receive
/// stylized frames.
///
/// # Examples
///
/// ```
/// use restyle_core::asset::{Material, WireframeMaterial};
///
/// let debug = WireframeMaterial::default();
/// assert!(debug.texture_slot().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct WireframeMaterial {
    /// The color of the wireframe lines.
    pub color: LinearRgba,
    /// The width of the wireframe lines in pixels.
    pub line_width: f32,
}

impl Default for WireframeMaterial {
    fn default() -> Self {
        Self {
            color: LinearRgba::GREEN,
            line_width: 1.0,
        }
    }
}

impl Asset for WireframeMaterial {}

impl Material for WireframeMaterial {
    fn kind(&self) -> &'static str {
        "WireframeMaterial"
    }
}
