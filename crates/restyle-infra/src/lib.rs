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

//! # Restyle Infra
//!
//! Concrete backends for the contracts defined in `restyle-core`.
//!
//! - `graphics`: wgpu render target with CPU readback and a texture backend
//!   (feature `graphics`, on by default).
//! - `inference`: ONNX Runtime model loader (feature `onnx`).
//! - `io`: asset fetching from the filesystem, and from URLs with feature `http`.

pub mod graphics;
#[cfg(feature = "onnx")]
pub mod inference;
pub mod io;

#[cfg(feature = "graphics")]
pub use graphics::wgpu::{WgpuContext, WgpuRenderTarget, WgpuTextureBackend};
#[cfg(feature = "onnx")]
pub use inference::{OnnxModel, OnnxModelLoader};
pub use io::AssetFetcher;
