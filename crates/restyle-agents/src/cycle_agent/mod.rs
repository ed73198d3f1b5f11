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

//! Acts as the **[A]gent** driving the restyle loop.
//!
//! The controller owns the lanes and the explicit [`CycleContext`] (render
//! target and surface material) they operate on. The host render loop calls
//! [`CycleController::tick`] once per frame; the controller decides, from its
//! [`TriggerPolicy`](restyle_core::TriggerPolicy), whether a cycle starts.
//!
//! At most one cycle is in flight. A trigger that arrives while the controller
//! is not [`CycleState::Idle`] is dropped and counted, never queued, so texture
//! swaps land in start order.

mod agent;
mod report;

pub use agent::*;
pub use report::*;
