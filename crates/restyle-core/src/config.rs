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

//! Configuration surface of the cycle controller.
//!
//! The two controller flavours of the loop (continuous per-frame stylization
//! and a delayed one-shot) are the same state machine under different
//! [`TriggerPolicy`] and [`CapturePolicy`] values.

use serde::{Deserialize, Serialize};

use crate::error::AssetLoadError;
use crate::renderer::SamplingMode;

/// How a frame is read back relative to the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CapturePolicy {
    /// Suspend the render loop around the readback so the pixels match exactly
    /// one completed frame. Causes a visible stall.
    #[default]
    Paused,
    /// Keep rendering while the readback is in flight. May capture a frame
    /// that interleaves with a previous texture swap.
    Live,
}

/// When a new cycle is started.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum TriggerPolicy {
    /// Attempt a cycle on every render tick. Ticks that arrive while a cycle
    /// is in flight are dropped.
    #[default]
    Continuous,
    /// Run exactly one cycle once `seconds` have elapsed since the first tick.
    Delayed {
        /// Delay before the single cycle starts.
        seconds: f32,
    },
    /// Run a cycle only when the host calls `trigger()`.
    Manual,
}

/// Encoding used for exported frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    /// `image/jpeg`.
    #[default]
    Jpeg,
    /// `image/png`.
    Png,
}

impl ExportFormat {
    /// The MIME type used in the exported data URL.
    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Png => "image/png",
        }
    }
}

/// Optional export of every stylized frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Image encoding.
    pub format: ExportFormat,
    /// Payloads buffered before new ones are dropped.
    pub capacity: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpeg,
            capacity: 4,
        }
    }
}

/// Everything the cycle controller needs to know about scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Readback policy.
    pub capture: CapturePolicy,
    /// Start policy.
    pub trigger: TriggerPolicy,
    /// Sampling applied to each new surface texture.
    pub sampling: SamplingMode,
    /// Export side channel, disabled when `None`.
    pub export: Option<ExportConfig>,
}

impl CycleConfig {
    /// Checks values serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), AssetLoadError> {
        if let TriggerPolicy::Delayed { seconds } = self.trigger {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(AssetLoadError::Config {
                    reason: format!("trigger delay must be a non-negative number of seconds, got {seconds}"),
                });
            }
        }
        if let Some(export) = &self.export {
            if export.capacity == 0 {
                return Err(AssetLoadError::Config {
                    reason: "export capacity must be at least 1".into(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_continuous_paused_nearest() {
        let config = CycleConfig::default();
        assert_eq!(config.capture, CapturePolicy::Paused);
        assert_eq!(config.trigger, TriggerPolicy::Continuous);
        assert_eq!(config.sampling, SamplingMode::Nearest);
        assert!(config.export.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_delay() {
        let config = CycleConfig {
            trigger: TriggerPolicy::Delayed { seconds: -1.0 },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AssetLoadError::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_export_capacity() {
        let config = CycleConfig {
            export: Some(ExportConfig {
                format: ExportFormat::Png,
                capacity: 0,
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ron_round_trip_of_delayed_live() {
        let text = "(capture: Live, trigger: Delayed(seconds: 1.5), export: Some((format: Png)))";
        let config: CycleConfig = ron::from_str(text).unwrap();
        assert_eq!(config.capture, CapturePolicy::Live);
        assert_eq!(config.trigger, TriggerPolicy::Delayed { seconds: 1.5 });
        assert_eq!(config.export.map(|e| e.format), Some(ExportFormat::Png));
        assert_eq!(config.export.map(|e| e.capacity), Some(4));
        assert_eq!(config.sampling, SamplingMode::Nearest);
    }
}
