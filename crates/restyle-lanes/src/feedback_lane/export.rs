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

//! Data-URL export of stylized frames.

use std::io::Cursor;

use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbaImage};
use restyle_core::{
    lane::{Lane, LaneKind},
    ExportConfig, ExportFormat, StylizedFrame,
};
use thiserror::Error;
use tokio::task::JoinHandle;

/// One exported frame, ready to be embedded or posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    /// The cycle that produced the frame.
    pub sequence: u64,
    /// MIME type of the encoded payload.
    pub mime: &'static str,
    /// `data:<mime>;base64,<payload>`.
    pub data_url: String,
}

/// Why a frame could not be exported.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The frame's bytes do not describe a full RGBA image.
    #[error("stylized frame is not a complete RGBA8 buffer")]
    Buffer,
    /// The image encoder failed.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

/// A lane that encodes stylized frames and offers them on a bounded channel.
///
/// Exporting never blocks a cycle: frames are encoded off the caller's task, and
/// when the receiver falls behind new frames are dropped.
#[derive(Debug, Clone)]
pub struct FrameExporter {
    format: ExportFormat,
    sender: flume::Sender<ExportedImage>,
}

impl FrameExporter {
    /// Creates an exporter and the receiving end of its channel.
    pub fn new(config: ExportConfig) -> (Self, flume::Receiver<ExportedImage>) {
        let (sender, receiver) = flume::bounded(config.capacity.max(1));
        (
            Self {
                format: config.format,
                sender,
            },
            receiver,
        )
    }

    /// Encodes `frame` as a data URL.
    pub fn encode(&self, sequence: u64, frame: &StylizedFrame) -> Result<ExportedImage, ExportError> {
        let pixels = frame.pixels.to_rgba8();
        let image =
            RgbaImage::from_raw(pixels.width(), pixels.height(), pixels.into_data()).ok_or(ExportError::Buffer)?;

        let mut bytes = Vec::new();
        match self.format {
            // JPEG has no alpha channel.
            ExportFormat::Jpeg => DynamicImage::ImageRgba8(image)
                .to_rgb8()
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?,
            ExportFormat::Png => image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?,
        }

        let mime = self.format.mime();
        let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(ExportedImage {
            sequence,
            mime,
            data_url: format!("data:{mime};base64,{payload}"),
        })
    }

    /// Offers `frame` for export without waiting on the encoder.
    ///
    /// Encoding runs on the blocking pool; the returned task resolves to `true`
    /// once the image is queued. Returns `None` when the channel is already full
    /// or closed, in which case the frame is not encoded at all.
    pub fn submit(&self, sequence: u64, frame: &StylizedFrame) -> Option<JoinHandle<bool>> {
        if self.sender.is_disconnected() {
            log::debug!("FrameExporter: receiver gone, dropped cycle {sequence}");
            return None;
        }
        if self.sender.is_full() {
            log::debug!("FrameExporter: channel full, dropped cycle {sequence}");
            return None;
        }

        let exporter = self.clone();
        let frame = frame.clone();
        Some(tokio::task::spawn_blocking(move || exporter.offer(sequence, &frame)))
    }

    fn offer(&self, sequence: u64, frame: &StylizedFrame) -> bool {
        let exported = match self.encode(sequence, frame) {
            Ok(exported) => exported,
            Err(e) => {
                log::warn!("FrameExporter: cycle {sequence} not exported: {e}");
                return false;
            }
        };
        match self.sender.try_send(exported) {
            Ok(()) => true,
            Err(flume::TrySendError::Full(_)) => {
                log::debug!("FrameExporter: channel full, dropped cycle {sequence}");
                false
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                log::debug!("FrameExporter: receiver gone, dropped cycle {sequence}");
                false
            }
        }
    }
}

impl Lane for FrameExporter {
    fn strategy_name(&self) -> &'static str {
        match self.format {
            ExportFormat::Jpeg => "JpegDataUrl",
            ExportFormat::Png => "PngDataUrl",
        }
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Export
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restyle_core::PixelBuffer;

    fn frame() -> StylizedFrame {
        StylizedFrame {
            pixels: PixelBuffer::solid_rgba(8, 8, [200, 100, 50, 255]),
        }
    }

    #[test]
    fn test_png_payload_decodes_back() {
        let (exporter, _rx) = FrameExporter::new(ExportConfig {
            format: ExportFormat::Png,
            capacity: 1,
        });
        let exported = exporter.encode(3, &frame()).unwrap();

        let payload = exported.data_url.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(decoded.get_pixel(3, 3).0, [200, 100, 50, 255]);
    }

    #[test]
    fn test_jpeg_mime() {
        let (exporter, _rx) = FrameExporter::new(ExportConfig::default());
        let exported = exporter.encode(1, &frame()).unwrap();
        assert_eq!(exported.mime, "image/jpeg");
        assert!(exported.data_url.starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[tokio::test]
    async fn test_full_channel_drops_new_frames() {
        let (exporter, rx) = FrameExporter::new(ExportConfig {
            format: ExportFormat::Png,
            capacity: 1,
        });
        assert!(exporter.submit(1, &frame()).unwrap().await.unwrap());
        assert!(exporter.submit(2, &frame()).is_none());
        assert_eq!(rx.try_recv().unwrap().sequence, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submit_encodes_on_a_blocking_task() {
        let (exporter, rx) = FrameExporter::new(ExportConfig::default());
        let pending = exporter.submit(4, &frame()).unwrap();

        assert!(pending.await.unwrap());
        assert_eq!(rx.recv_async().await.unwrap().sequence, 4);

        drop(rx);
        assert!(exporter.submit(5, &frame()).is_none());
    }
}
