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

//! What the controller tells the outside world about finished cycles.

use std::fmt;
use std::time::{Duration, Instant};

use restyle_core::{math::Extent2D, renderer::TextureId, CycleError, MaterialMismatch};

/// The steps of the controller's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CycleState {
    /// Waiting for a trigger.
    #[default]
    Idle,
    /// Reading the frame back from the GPU.
    Capturing,
    /// Converting the frame to a content tensor.
    Encoding,
    /// Running the transform network.
    Inferring,
    /// Converting the network output back to pixels.
    Decoding,
    /// Swapping the new texture into the material.
    Applying,
    /// A step failed; the failure is being reported before returning to `Idle`.
    Faulted,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleState::Idle => "Idle",
            CycleState::Capturing => "Capturing",
            CycleState::Encoding => "Encoding",
            CycleState::Inferring => "Inferring",
            CycleState::Decoding => "Decoding",
            CycleState::Applying => "Applying",
            CycleState::Faulted => "Faulted",
        };
        f.write_str(name)
    }
}

/// How a cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The stylized frame is now displayed.
    Applied {
        /// The texture bound by this cycle.
        texture: TextureId,
        /// Size of the stylized frame, as emitted by the transform network.
        extent: Extent2D,
    },
    /// The surface cannot take a texture; nothing changed.
    Mismatch(MaterialMismatch),
    /// A step failed. The surface keeps its last texture.
    Failed {
        /// The step that failed.
        step: CycleState,
        /// Why it failed.
        error: CycleError,
    },
}

impl CycleOutcome {
    /// Returns `true` for [`CycleOutcome::Applied`].
    pub fn is_applied(&self) -> bool {
        matches!(self, CycleOutcome::Applied { .. })
    }
}

/// Emitted once per started cycle, whatever its outcome.
#[derive(Debug)]
pub struct CycleReport {
    /// Monotonic cycle number, starting at 1.
    pub sequence: u64,
    /// How the cycle ended.
    pub outcome: CycleOutcome,
    /// When the cycle left `Idle`.
    pub started_at: Instant,
    /// Wall time from start to report.
    pub duration: Duration,
}

/// Running counters of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleStats {
    /// Cycles that left `Idle`.
    pub started: u64,
    /// Cycles that bound a new texture.
    pub completed: u64,
    /// Cycles that ended in a contained failure.
    pub failed: u64,
    /// Cycles that found a slotless material.
    pub mismatched: u64,
    /// Triggers that arrived while a cycle was in flight.
    pub dropped_triggers: u64,
}

impl CycleStats {
    /// Cycles that have finished, whatever the outcome.
    pub fn finished(&self) -> u64 {
        self.completed + self.failed + self.mismatched
    }
}
