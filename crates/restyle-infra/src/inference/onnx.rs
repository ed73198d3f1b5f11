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

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use ndarray::ArrayD;
use ort::session::{builder::GraphOptimizationLevel, Session};
use restyle_core::{
    AssetLoadError, AssetSource, InferenceError, InferenceModel, ModelLoader, Tensor, TensorPool,
};

use crate::io::AssetFetcher;

/// Loads ONNX graphs through an [`AssetFetcher`] and opens an ORT session on them.
#[derive(Debug, Clone, Default)]
pub struct OnnxModelLoader {
    fetcher: AssetFetcher,
}

impl OnnxModelLoader {
    /// Creates a loader that reads model bytes with `fetcher`.
    pub fn new(fetcher: AssetFetcher) -> Self {
        Self { fetcher }
    }

    fn create_session(bytes: &[u8], model: &str) -> Result<Session, AssetLoadError> {
        Session::builder()
            .map_err(|e| model_load_error(model, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| model_load_error(model, e))?
            .commit_from_memory(bytes)
            .map_err(|e| model_load_error(model, e))
    }
}

#[async_trait]
impl ModelLoader for OnnxModelLoader {
    async fn load(&self, source: &AssetSource) -> Result<Arc<dyn InferenceModel>, AssetLoadError> {
        let bytes = self.fetcher.fetch(source).await?;
        let name = source.to_string();

        let session = {
            let label = name.clone();
            tokio::task::spawn_blocking(move || Self::create_session(&bytes, &label))
                .await
                .map_err(|e| AssetLoadError::ModelLoad {
                    model: name.clone(),
                    reason: e.to_string(),
                })??
        };

        let model = OnnxModel::from_session(name, session)?;
        log::info!(
            "Loaded ONNX model '{}' ({} inputs, output '{}')",
            model.name,
            model.input_count,
            model.output_name
        );
        Ok(Arc::new(model))
    }
}

/// A single-output ONNX graph taking one or two float tensors.
///
/// Inputs are bound by position. Runs are serialized on the session lock and
/// executed on the blocking thread pool.
pub struct OnnxModel {
    name: String,
    session: Arc<Mutex<Session>>,
    output_name: String,
    input_count: usize,
}

impl OnnxModel {
    fn from_session(name: String, session: Session) -> Result<Self, AssetLoadError> {
        let input_count = session.inputs.len();
        if !(1..=2).contains(&input_count) {
            return Err(AssetLoadError::ModelLoad {
                model: name,
                reason: format!("expected a graph with 1 or 2 inputs, found {input_count}"),
            });
        }
        let Some(output_name) = session.outputs.first().map(|o| o.name.clone()) else {
            return Err(AssetLoadError::ModelLoad {
                model: name,
                reason: "graph has no outputs".into(),
            });
        };
        Ok(Self {
            name,
            session: Arc::new(Mutex::new(session)),
            output_name,
            input_count,
        })
    }

    /// Number of positional inputs the graph takes.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    fn run(
        session: &Mutex<Session>,
        output_name: &str,
        inputs: Vec<ArrayD<f32>>,
    ) -> Result<ArrayD<f32>, InferenceError> {
        let mut values = inputs
            .into_iter()
            .map(|array| ort::value::Tensor::from_array(array).map_err(backend_error))
            .collect::<Result<Vec<_>, _>>()?;

        let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
        let outputs = match values.len() {
            1 => session.run(ort::inputs![values.remove(0)]),
            _ => {
                let second = values.remove(1);
                session.run(ort::inputs![values.remove(0), second])
            }
        }
        .map_err(backend_error)?;

        let output = outputs[output_name]
            .try_extract_array::<f32>()
            .map_err(backend_error)?;
        Ok(output.to_owned())
    }
}

fn model_load_error(model: &str, err: impl fmt::Display) -> AssetLoadError {
    AssetLoadError::ModelLoad {
        model: model.to_string(),
        reason: err.to_string(),
    }
}

fn backend_error(err: impl fmt::Display) -> InferenceError {
    InferenceError::Backend(err.to_string())
}

impl fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxModel")
            .field("name", &self.name)
            .field("output_name", &self.output_name)
            .field("input_count", &self.input_count)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl InferenceModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn predict(&self, inputs: &[&Tensor], pool: &TensorPool) -> Result<Tensor, InferenceError> {
        if inputs.len() != self.input_count {
            return Err(InferenceError::Arity {
                expected: self.input_count,
                actual: inputs.len(),
            });
        }
        // ORT takes ownership of its input values; the copies never enter the pool.
        let arrays: Vec<ArrayD<f32>> = inputs.iter().map(|t| t.to_array()).collect();
        let session = Arc::clone(&self.session);
        let output_name = self.output_name.clone();

        let output = tokio::task::spawn_blocking(move || Self::run(&session, &output_name, arrays))
            .await
            .map_err(|e| InferenceError::Backend(e.to_string()))??;

        log::trace!("{}: produced output of shape {:?}", self.name, output.shape());
        Ok(pool.adopt(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_model_is_a_fetch_error() {
        let loader = OnnxModelLoader::default();
        let source = AssetSource::parse("/definitely/not/here/model.onnx");
        let err = loader.load(&source).await.unwrap_err();
        assert!(matches!(err, AssetLoadError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_a_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"not a protobuf").unwrap();

        let loader = OnnxModelLoader::default();
        let err = loader.load(&AssetSource::Path(path)).await.unwrap_err();

        assert!(matches!(err, AssetLoadError::ModelLoad { .. }));
    }
}
