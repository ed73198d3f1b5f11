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

//! Provides the asset marker trait and the material types the loop re-textures.
//!
//! The key components are:
//! - The [`Asset`] trait: A marker for all types that can be treated as assets.
//! - The [`Material`] trait and its concrete implementations.
//! - [`SharedMaterial`]: the handle through which the render loop and the
//!   feedback stage share one mesh's material.

mod materials;

pub use materials::*;

/// A marker trait for types that can be managed by the asset system.
///
/// `Send + Sync + 'static` lets assets be shared between the render loop and
/// the tasks that run each cycle.
pub trait Asset: Send + Sync + 'static {}
