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

use restyle_core::{AssetLoadError, AssetSource};

/// Reads the raw bytes behind an [`AssetSource`].
///
/// Paths are read with `tokio::fs`. URLs need the `http` feature; without it
/// every URL fails with [`AssetLoadError::Fetch`].
#[derive(Debug, Clone, Default)]
pub struct AssetFetcher {
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl AssetFetcher {
    /// Creates a fetcher with a default HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves every byte of `source`.
    pub async fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>, AssetLoadError> {
        let fetch_error = |reason: String| AssetLoadError::Fetch {
            source: source.to_string(),
            reason,
        };
        let bytes = match source {
            AssetSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| fetch_error(e.to_string()))?,
            AssetSource::Url(url) => self.fetch_url(url).await.map_err(fetch_error)?,
        };
        log::debug!("Fetched {} bytes from '{source}'", bytes.len());
        Ok(bytes)
    }

    #[cfg(feature = "http")]
    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "http"))]
    async fn fetch_url(&self, _url: &str) -> Result<Vec<u8>, String> {
        Err("URL sources require the `http` feature of restyle-infra".into())
    }
}
