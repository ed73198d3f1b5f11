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

//! The RON document describing one restyle loop.

use std::path::Path;

use restyle_core::{AssetLoadError, AssetSource, CycleConfig};
use serde::{Deserialize, Serialize};

/// Everything needed to bootstrap a [`StyleLoop`](crate::StyleLoop).
///
/// ```ron
/// (
///     encoder_model: Path("models/style_predict.onnx"),
///     transform_model: Path("models/style_transform.onnx"),
///     style_image: Url("https://example.com/starry_night.jpg"),
///     initial_surface: Some(Path("assets/earth.jpg")),
///     cycle: (capture: Paused, trigger: Delayed(seconds: 2.0)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// The network that turns the style image into an embedding.
    pub encoder_model: AssetSource,
    /// The network that applies an embedding to a captured frame.
    pub transform_model: AssetSource,
    /// The reference image whose style is applied.
    pub style_image: AssetSource,
    /// An image bound to the surface before the first cycle.
    #[serde(default)]
    pub initial_surface: Option<AssetSource>,
    /// Scheduling, capture and export policies.
    #[serde(default)]
    pub cycle: CycleConfig,
}

impl LoopConfig {
    /// Parses and validates a RON document.
    pub fn from_ron_str(source: &str) -> Result<Self, AssetLoadError> {
        let config: Self = ron::from_str(source).map_err(|e| AssetLoadError::Config {
            reason: e.to_string(),
        })?;
        config.cycle.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetLoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| AssetLoadError::Config {
            reason: format!("cannot read '{}': {e}", path.display()),
        })?;
        Self::from_ron_str(&source)
    }

    /// Renders the configuration as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, AssetLoadError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            AssetLoadError::Config {
                reason: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restyle_core::{renderer::SamplingMode, CapturePolicy, ExportFormat, TriggerPolicy};
    use std::path::PathBuf;

    const MINIMAL: &str = r#"(
        encoder_model: Path("predict.onnx"),
        transform_model: Path("transform.onnx"),
        style_image: Url("https://example.com/style.jpg"),
    )"#;

    #[test]
    fn test_minimal_document_uses_defaults() {
        let config = LoopConfig::from_ron_str(MINIMAL).unwrap();

        assert_eq!(config.encoder_model, AssetSource::Path(PathBuf::from("predict.onnx")));
        assert_eq!(
            config.style_image,
            AssetSource::Url("https://example.com/style.jpg".into())
        );
        assert!(config.initial_surface.is_none());
        assert_eq!(config.cycle, CycleConfig::default());
    }

    #[test]
    fn test_full_document() {
        let source = r#"(
            encoder_model: Path("predict.onnx"),
            transform_model: Path("transform.onnx"),
            style_image: Path("style.png"),
            initial_surface: Some(Path("earth.jpg")),
            cycle: (
                capture: Live,
                trigger: Delayed(seconds: 2.5),
                sampling: Linear,
                export: Some((format: Png, capacity: 2)),
            ),
        )"#;

        let config = LoopConfig::from_ron_str(source).unwrap();

        assert_eq!(config.initial_surface, Some(AssetSource::Path(PathBuf::from("earth.jpg"))));
        assert_eq!(config.cycle.capture, CapturePolicy::Live);
        assert_eq!(config.cycle.trigger, TriggerPolicy::Delayed { seconds: 2.5 });
        assert_eq!(config.cycle.sampling, SamplingMode::Linear);
        let export = config.cycle.export.unwrap();
        assert_eq!((export.format, export.capacity), (ExportFormat::Png, 2));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let negative_delay = r#"(
            encoder_model: Path("a"),
            transform_model: Path("b"),
            style_image: Path("c"),
            cycle: (trigger: Delayed(seconds: -1.0)),
        )"#;
        assert!(matches!(
            LoopConfig::from_ron_str(negative_delay),
            Err(AssetLoadError::Config { .. })
        ));
        assert!(matches!(
            LoopConfig::from_ron_str("(encoder_model: Path(\"a\"))"),
            Err(AssetLoadError::Config { .. })
        ));
    }

    #[test]
    fn test_load_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.ron");
        let config = LoopConfig::from_ron_str(MINIMAL).unwrap();
        std::fs::write(&path, config.to_ron_string().unwrap()).unwrap();

        assert_eq!(LoopConfig::load(&path).unwrap(), config);
        assert!(LoopConfig::load(dir.path().join("missing.ron")).is_err());
    }
}
