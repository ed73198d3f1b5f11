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

//! # Restyle Core
//!
//! Foundational crate containing traits, core types, and interface contracts
//! shared by every stage of the render → infer → re-texture loop.
//!
//! Nothing in here talks to a GPU or a model runtime directly. Backends live in
//! `restyle-infra`; the per-stage strategies live in `restyle-lanes`.

#![warn(missing_docs)]

pub mod asset;
pub mod config;
pub mod error;
pub mod image;
pub mod lane;
pub mod math;
pub mod model;
pub mod renderer;
pub mod tensor;

pub use config::{CapturePolicy, CycleConfig, ExportConfig, ExportFormat, TriggerPolicy};
pub use error::{AssetLoadError, CycleError, InferenceError, MaterialMismatch, ShapeError};
pub use image::{CapturedFrame, PixelBuffer, PixelFormat, StyleReference, StylizedFrame};
pub use lane::{Lane, LaneKind};
pub use model::{AssetSource, InferenceModel, ModelLoader, StyleEmbedding};
pub use renderer::{ReadbackError, RenderGate, RenderTarget, ResourceError, TextureBackend};
pub use tensor::{Tensor, TensorPool};
