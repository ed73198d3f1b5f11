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

//! Owns the two style networks and the embedding they share.

use std::sync::Arc;

use restyle_core::{
    lane::{Lane, LaneKind},
    AssetLoadError, AssetSource, InferenceError, InferenceModel, ModelLoader, StyleEmbedding,
    StyleReference, Tensor, TensorPool,
};

use crate::tensor_lane::TensorBridge;

/// A loaded pair of style networks plus the precomputed style embedding.
///
/// The encoder runs exactly once, during construction, and is not retained.
/// Afterwards the session only runs the transformer, and is read-only: it can be shared freely between
/// cycles.
#[derive(Debug)]
pub struct InferenceSession {
    transformer: Arc<dyn InferenceModel>,
    embedding: StyleEmbedding,
    bridge: TensorBridge,
}

impl InferenceSession {
    /// Loads both networks concurrently, then encodes the style reference.
    ///
    /// Any failure is fatal to the session: no partially loaded session is
    /// ever returned.
    pub async fn initialize(
        loader: &dyn ModelLoader,
        encoder: &AssetSource,
        transformer: &AssetSource,
        style: &StyleReference,
        pool: TensorPool,
    ) -> Result<Self, AssetLoadError> {
        log::info!("Loading style networks (encoder: {encoder}, transformer: {transformer})");
        let (encoder, transformer) = tokio::try_join!(loader.load(encoder), loader.load(transformer))?;
        Self::from_models(encoder, transformer, style, pool).await
    }

    /// Builds a session from already loaded networks.
    pub async fn from_models(
        encoder: Arc<dyn InferenceModel>,
        transformer: Arc<dyn InferenceModel>,
        style: &StyleReference,
        pool: TensorPool,
    ) -> Result<Self, AssetLoadError> {
        let bridge = TensorBridge::new(pool);

        let input = bridge
            .encode(&style.pixels)
            .map_err(|e| AssetLoadError::StyleEncoding { reason: e.to_string() })?;
        let raw = encoder
            .predict(&[&input], bridge.pool())
            .await
            .map_err(|e| AssetLoadError::StyleEncoding { reason: e.to_string() })?;
        input.release();

        let embedding = StyleEmbedding::new(raw);
        log::info!(
            "Style embedding ready: {:?} from {} reference via '{}'",
            embedding.shape(),
            style.pixels.extent(),
            encoder.name()
        );

        Ok(Self {
            transformer,
            embedding,
            bridge,
        })
    }

    /// The embedding computed at construction.
    pub fn embedding(&self) -> &StyleEmbedding {
        &self.embedding
    }

    /// The bridge sharing this session's tensor pool.
    pub fn bridge(&self) -> &TensorBridge {
        &self.bridge
    }

    /// Runs the transformer over a `[1, H, W, 3]` content tensor.
    ///
    /// Consumes and releases `content` on every path. Returns the output with
    /// its batch axis removed; its spatial size is whatever the network emits.
    pub async fn transform(&self, content: Tensor, embedding: &StyleEmbedding) -> Result<Tensor, InferenceError> {
        let output = self
            .transformer
            .predict(&[&content, embedding.as_tensor()], self.bridge.pool())
            .await;
        content.release();
        Ok(output?.squeeze_batch()?)
    }
}

impl Lane for InferenceSession {
    fn strategy_name(&self) -> &'static str {
        "ArbitraryStyleTransfer"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Inference
    }
}
