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

//! Error types raised by rendering backends.

use std::fmt;

/// An error related to the creation or use of a GPU resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// No resource is registered under the given handle.
    NotFound,
    /// The data supplied for the resource does not fit its descriptor.
    InvalidData(String),
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidData(msg) => write!(f, "Invalid resource data: {msg}"),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// Pixel data could not be read back from a render target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadbackError {
    /// The render target has nothing to read (zero-sized or not yet rendered).
    Unavailable,
    /// Mapping the staging buffer for CPU access failed.
    MapFailed(String),
    /// An error originating from the graphics backend.
    Backend(String),
}

impl fmt::Display for ReadbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadbackError::Unavailable => write!(f, "Render target has no pixels to read"),
            ReadbackError::MapFailed(msg) => write!(f, "Staging buffer map failed: {msg}"),
            ReadbackError::Backend(msg) => write!(f, "GPU readback failed: {msg}"),
        }
    }
}

impl std::error::Error for ReadbackError {}
