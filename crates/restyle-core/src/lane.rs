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

//! Identity shared by every stage of the loop.
//!
//! A lane is one hot-path stage driven by the cycle controller. Lanes carry no
//! scheduling logic of their own; the trait exists so the controller can name
//! and classify them in logs and reports.

use std::fmt;

/// The stage a lane implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// GPU readback of the rendered frame.
    Capture,
    /// Pixel buffer and tensor conversion.
    Tensor,
    /// Neural network execution.
    Inference,
    /// Upload of the stylized frame and material swap.
    Feedback,
    /// Encoding of stylized frames for the export side channel.
    Export,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Capture => write!(f, "Capture"),
            LaneKind::Tensor => write!(f, "Tensor"),
            LaneKind::Inference => write!(f, "Inference"),
            LaneKind::Feedback => write!(f, "Feedback"),
            LaneKind::Export => write!(f, "Export"),
        }
    }
}

/// Base trait for every lane.
pub trait Lane: Send + Sync {
    /// Human-readable name identifying this lane's strategy (e.g. `"PausedReadback"`).
    fn strategy_name(&self) -> &'static str;

    /// The kind of processing this lane performs.
    fn lane_kind(&self) -> LaneKind;
}
