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

//! Contracts for the neural models driven by the loop.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AssetLoadError, InferenceError};
use crate::tensor::{Tensor, TensorPool};

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetSource {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// An `http://` or `https://` URL.
    Url(String),
}

impl AssetSource {
    /// Classifies a user-supplied location.
    ///
    /// `http(s)://` becomes [`AssetSource::Url`], `file://` is stripped to a
    /// path, and anything else is taken as a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            AssetSource::Url(location.to_string())
        } else if let Some(path) = location.strip_prefix("file://") {
            AssetSource::Path(PathBuf::from(path))
        } else {
            AssetSource::Path(PathBuf::from(location))
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Path(path) => write!(f, "{}", path.display()),
            AssetSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// A loaded, runnable model graph.
///
/// Implementations must be deterministic: identical inputs produce
/// bit-identical outputs.
#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    /// A human-readable label used in logs.
    fn name(&self) -> &str;

    /// Runs the graph over positional inputs and returns its first output.
    ///
    /// Any intermediate tensors must be released before returning; only the
    /// result, allocated from `pool`, survives the call.
    async fn predict(&self, inputs: &[&Tensor], pool: &TensorPool) -> Result<Tensor, InferenceError>;
}

/// Turns a model package into a runnable [`InferenceModel`].
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Fetches and prepares the model described by `source`.
    async fn load(&self, source: &AssetSource) -> Result<Arc<dyn InferenceModel>, AssetLoadError>;
}

/// The style signature computed once from the reference image.
///
/// Read-only for the lifetime of the session that owns it.
#[derive(Debug)]
pub struct StyleEmbedding {
    tensor: Tensor,
}

impl StyleEmbedding {
    /// Wraps the encoder's output.
    pub fn new(tensor: Tensor) -> Self {
        Self { tensor }
    }

    /// The embedding's model-defined shape.
    pub fn shape(&self) -> &[usize] {
        self.tensor.shape()
    }

    /// Borrow the underlying tensor as a model input.
    pub fn as_tensor(&self) -> &Tensor {
        &self.tensor
    }
}
