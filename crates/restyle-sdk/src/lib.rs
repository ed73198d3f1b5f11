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

//! The public-facing SDK for Restyle.
//!
//! A host renderer describes its loop in a [`LoopConfig`], hands over its
//! render target, texture backend and surface material, and calls
//! [`StyleLoop::on_frame`] every frame.

mod config;
mod style_loop;

pub use config::LoopConfig;
pub use style_loop::{LoopBackends, StyleLoop};

pub mod prelude {
    //! The types most hosts need.
    pub use crate::{LoopBackends, LoopConfig, StyleLoop};
    pub use restyle_agents::{CycleOutcome, CycleReport, CycleState, CycleStats, TickOutcome};
    pub use restyle_core::{
        asset::{shared_material, Material, SharedMaterial, StandardMaterial, UnlitMaterial},
        math::{Extent2D, LinearRgba},
        AssetSource, CapturePolicy, CycleConfig, ExportConfig, ExportFormat, PixelBuffer,
        RenderTarget, TextureBackend, TriggerPolicy,
    };
    pub use restyle_infra::AssetFetcher;
    #[cfg(feature = "graphics")]
    pub use restyle_infra::{WgpuContext, WgpuRenderTarget, WgpuTextureBackend};
    #[cfg(feature = "onnx")]
    pub use restyle_infra::OnnxModelLoader;
    pub use restyle_lanes::ExportedImage;
}
