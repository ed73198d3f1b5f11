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

//! GPU readback of the most recently rendered frame.

use std::sync::Arc;

use restyle_core::{
    lane::{Lane, LaneKind},
    CapturePolicy, CapturedFrame, ReadbackError, RenderGate, RenderTarget,
};

/// A lane that copies the render target back to CPU memory.
///
/// Under [`CapturePolicy::Paused`] the shared [`RenderGate`] is held closed for
/// the duration of the readback, so the host loop renders nothing until the
/// pixels are in hand. The hold is scoped: a failed readback reopens the gate
/// exactly like a successful one.
#[derive(Debug, Clone)]
pub struct FrameCapture {
    policy: CapturePolicy,
    gate: Arc<RenderGate>,
}

impl FrameCapture {
    /// Creates a capture lane bound to the host's render gate.
    pub fn new(policy: CapturePolicy, gate: Arc<RenderGate>) -> Self {
        Self { policy, gate }
    }

    /// The readback policy in effect.
    pub fn policy(&self) -> CapturePolicy {
        self.policy
    }

    /// The gate the host render loop consults before each frame.
    pub fn gate(&self) -> &Arc<RenderGate> {
        &self.gate
    }

    /// Reads the target's current contents.
    ///
    /// Fails with [`ReadbackError::Unavailable`] if the target has no pixels yet.
    pub async fn capture(&self, target: &dyn RenderTarget) -> Result<CapturedFrame, ReadbackError> {
        if target.extent().is_empty() {
            return Err(ReadbackError::Unavailable);
        }

        let pixels = match self.policy {
            CapturePolicy::Paused => {
                let _hold = self.gate.suspend();
                target.read_pixels().await?
            }
            CapturePolicy::Live => target.read_pixels().await?,
        };

        log::trace!(
            "FrameCapture: read back {} frame ({:?})",
            pixels.extent(),
            self.policy
        );
        Ok(CapturedFrame::new(pixels))
    }
}

impl Lane for FrameCapture {
    fn strategy_name(&self) -> &'static str {
        match self.policy {
            CapturePolicy::Paused => "PausedReadback",
            CapturePolicy::Live => "LiveReadback",
        }
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Capture
    }
}
