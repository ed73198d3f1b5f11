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

//! The begin/end-frame boundary that paused capture suspends.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Tells the host render loop whether it may present the next frame.
///
/// The render loop checks [`is_open`](Self::is_open) before each frame and
/// skips rendering while any [`FrameHold`] is alive. Holds nest; the gate
/// reopens when the last one drops, whichever path drops it.
#[derive(Debug, Default)]
pub struct RenderGate {
    holds: AtomicUsize,
    suspensions: AtomicU64,
}

impl RenderGate {
    /// Creates an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no hold is active.
    pub fn is_open(&self) -> bool {
        self.holds.load(Ordering::SeqCst) == 0
    }

    /// Closes the gate until the returned hold is dropped.
    pub fn suspend(&self) -> FrameHold<'_> {
        if self.holds.fetch_add(1, Ordering::SeqCst) == 0 {
            log::trace!("RenderGate: render loop suspended");
        }
        self.suspensions.fetch_add(1, Ordering::Relaxed);
        FrameHold { gate: self }
    }

    /// How many holds have been taken over the gate's lifetime.
    pub fn suspensions(&self) -> u64 {
        self.suspensions.load(Ordering::Relaxed)
    }
}

/// Keeps a [`RenderGate`] closed while alive.
#[derive(Debug)]
pub struct FrameHold<'a> {
    gate: &'a RenderGate,
}

impl Drop for FrameHold<'_> {
    fn drop(&mut self) {
        if self.gate.holds.fetch_sub(1, Ordering::SeqCst) == 1 {
            log::trace!("RenderGate: render loop resumed");
        }
    }
}
