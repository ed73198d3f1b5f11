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

//! Defines the hierarchy of error types for the loop.
//!
//! Failures split into two tiers. [`AssetLoadError`] is fatal: it can only be
//! produced while a session is being initialized and is surfaced to the caller.
//! Everything wrapped by [`CycleError`] is contained by the cycle controller:
//! the failing cycle is reported and the loop carries on with the last texture.

use std::fmt;

use crate::renderer::{ReadbackError, ResourceError};

/// An error raised while fetching or decoding the assets a session needs.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetLoadError {
    /// The bytes behind an asset source could not be retrieved.
    Fetch {
        /// The path or URL that was requested.
        source: String,
        /// The underlying I/O or transport error.
        reason: String,
    },
    /// A model package was fetched but could not be turned into a runnable model.
    ModelLoad {
        /// A label for the model (usually its source).
        model: String,
        /// Detailed error message from the model runtime.
        reason: String,
    },
    /// An image could not be decoded into pixels.
    ImageDecode {
        /// Detailed error message from the decoder.
        reason: String,
    },
    /// The style encoder failed to produce an embedding for the reference image.
    StyleEncoding {
        /// Detailed error message.
        reason: String,
    },
    /// The loop configuration could not be read or is invalid.
    Config {
        /// Detailed error message.
        reason: String,
    },
}

impl fmt::Display for AssetLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetLoadError::Fetch { source, reason } => {
                write!(f, "Failed to fetch asset '{source}': {reason}")
            }
            AssetLoadError::ModelLoad { model, reason } => {
                write!(f, "Failed to load model '{model}': {reason}")
            }
            AssetLoadError::ImageDecode { reason } => write!(f, "Failed to decode image: {reason}"),
            AssetLoadError::StyleEncoding { reason } => {
                write!(f, "Failed to encode the style reference: {reason}")
            }
            AssetLoadError::Config { reason } => write!(f, "Invalid loop configuration: {reason}"),
        }
    }
}

impl std::error::Error for AssetLoadError {}

/// A tensor or pixel buffer did not have the layout a stage expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// A batched tensor was expected (`[1, ...]`) but the leading axis was missing or not 1.
    MissingBatch {
        /// The offending shape.
        shape: Vec<usize>,
    },
    /// The tensor has the wrong number of dimensions.
    Rank {
        /// The number of dimensions that was expected.
        expected: usize,
        /// The offending shape.
        shape: Vec<usize>,
    },
    /// The channel axis has a size the stage cannot interpret.
    Channels {
        /// The offending shape.
        shape: Vec<usize>,
    },
    /// A pixel buffer's byte length does not match its declared extent.
    BufferLength {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::MissingBatch { shape } => {
                write!(f, "Expected a leading batch axis of size 1, got shape {shape:?}")
            }
            ShapeError::Rank { expected, shape } => {
                write!(f, "Expected a rank-{expected} tensor, got shape {shape:?}")
            }
            ShapeError::Channels { shape } => {
                write!(f, "Unsupported channel count in shape {shape:?}")
            }
            ShapeError::BufferLength { expected, actual } => {
                write!(f, "Pixel buffer has {actual} bytes, expected {expected}")
            }
        }
    }
}

impl std::error::Error for ShapeError {}

/// An error reported by a model runtime while running a prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The model was given the wrong number of inputs.
    Arity {
        /// Inputs the model takes.
        expected: usize,
        /// Inputs it was given.
        actual: usize,
    },
    /// The model's output could not be interpreted.
    Shape(ShapeError),
    /// An error originating from the model runtime.
    Backend(String),
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::Arity { expected, actual } => {
                write!(f, "Model takes {expected} inputs, got {actual}")
            }
            InferenceError::Shape(err) => write!(f, "Model output shape error: {err}"),
            InferenceError::Backend(msg) => write!(f, "Model runtime error: {msg}"),
        }
    }
}

impl std::error::Error for InferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InferenceError::Shape(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShapeError> for InferenceError {
    fn from(err: ShapeError) -> Self {
        InferenceError::Shape(err)
    }
}

/// The target surface cannot accept a texture.
///
/// This is a condition, not an error: the cycle completes as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialMismatch {
    /// The concrete material type that lacked a texture slot.
    pub material: &'static str,
}

impl fmt::Display for MaterialMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Material '{}' has no texture slot", self.material)
    }
}

/// Any failure that ends a single cycle without stopping the loop.
#[derive(Debug)]
pub enum CycleError {
    /// The frame could not be read back from the GPU.
    Readback(ReadbackError),
    /// A tensor or buffer had an unexpected layout.
    Shape(ShapeError),
    /// The transform network failed.
    Inference(InferenceError),
    /// A texture could not be created or destroyed.
    Resource(ResourceError),
    /// A backend panicked or the cycle task was cancelled mid-step.
    Aborted(String),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Readback(err) => write!(f, "Capture failed: {err}"),
            CycleError::Shape(err) => write!(f, "Shape mismatch: {err}"),
            CycleError::Inference(err) => write!(f, "Inference failed: {err}"),
            CycleError::Resource(err) => write!(f, "Texture swap failed: {err}"),
            CycleError::Aborted(msg) => write!(f, "Cycle aborted: {msg}"),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CycleError::Readback(err) => Some(err),
            CycleError::Shape(err) => Some(err),
            CycleError::Inference(err) => Some(err),
            CycleError::Resource(err) => Some(err),
            CycleError::Aborted(_) => None,
        }
    }
}

impl From<ReadbackError> for CycleError {
    fn from(err: ReadbackError) -> Self {
        CycleError::Readback(err)
    }
}

impl From<ShapeError> for CycleError {
    fn from(err: ShapeError) -> Self {
        CycleError::Shape(err)
    }
}

impl From<InferenceError> for CycleError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Shape(shape) => CycleError::Shape(shape),
            other => CycleError::Inference(other),
        }
    }
}

impl From<ResourceError> for CycleError {
    fn from(err: ResourceError) -> Self {
        CycleError::Resource(err)
    }
}
