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

//! # Restyle Lanes
//!
//! Hot-path stages of the render → infer → re-texture loop.
//!
//! Each lane does one thing and holds no scheduling state. The
//! `CycleController` in `restyle-agents` decides when to run them and in which
//! order; lanes only see the data of the cycle they are working on.

#![warn(missing_docs)]

pub mod asset_lane;
pub mod capture_lane;
pub mod feedback_lane;
pub mod inference_lane;
pub mod tensor_lane;

pub use asset_lane::*;
pub use capture_lane::*;
pub use feedback_lane::*;
pub use inference_lane::*;
pub use tensor_lane::*;
