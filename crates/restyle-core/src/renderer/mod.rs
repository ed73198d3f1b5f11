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

//! Rendering-side contracts: textures, render targets, and frame gating.
//!
//! The loop never owns the scene. It only needs read access to a render
//! target's pixels, a way to create and destroy textures, and a gate that lets
//! paused capture hold the render loop between frames.

pub mod error;
pub mod gate;
pub mod texture;
pub mod traits;

pub use error::*;
pub use gate::*;
pub use texture::*;
pub use traits::*;
