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

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ndarray::{ArrayD, Axis, IxDyn};
use restyle_agents::{CycleContext, CycleController, CycleOutcome, CycleState, TickOutcome};
use restyle_core::{
    asset::{shared_material, Material, SharedMaterial, StandardMaterial, WireframeMaterial},
    math::Extent2D,
    renderer::{SamplingMode, TextureId},
    AssetLoadError, AssetSource, CapturePolicy, CycleError, ExportConfig, InferenceError, InferenceModel,
    ModelLoader, PixelBuffer, PixelFormat, ReadbackError, RenderGate, RenderTarget, ResourceError, ShapeError,
    StyleReference, Tensor, TensorPool, TextureBackend, TriggerPolicy,
};
use restyle_lanes::{FrameCapture, FrameExporter, InferenceSession, TextureFeedback};

// --- MOCK BACKENDS ---

#[derive(Debug)]
struct MockTarget {
    extent: Extent2D,
    fail: AtomicBool,
    panic: AtomicBool,
    reads: AtomicUsize,
}

impl MockTarget {
    fn new(size: u32) -> Self {
        Self {
            extent: Extent2D::new(size, size),
            fail: AtomicBool::new(false),
            panic: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RenderTarget for MockTarget {
    fn extent(&self) -> Extent2D {
        self.extent
    }

    async fn read_pixels(&self) -> Result<PixelBuffer, ReadbackError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.panic.load(Ordering::SeqCst) {
            panic!("device lost during readback");
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ReadbackError::MapFailed("buffer lost".into()));
        }
        let (w, h) = (self.extent.width, self.extent.height);
        let mut data = Vec::with_capacity((w * h * 4) as usize);
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 90, 255]);
            }
        }
        Ok(PixelBuffer::new(data, w, h, PixelFormat::Rgba8).unwrap())
    }
}

#[derive(Debug, Default)]
struct MockTextureBackend {
    next: AtomicUsize,
    live: Mutex<Vec<TextureId>>,
    created: Mutex<Vec<(Extent2D, Vec<u8>)>>,
    destroyed: Mutex<Vec<TextureId>>,
}

impl MockTextureBackend {
    fn live(&self) -> Vec<TextureId> {
        self.live.lock().unwrap().clone()
    }

    fn created(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

impl TextureBackend for MockTextureBackend {
    fn create_texture(
        &self,
        pixels: &PixelBuffer,
        _sampling: SamplingMode,
        _label: Option<&str>,
    ) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next.fetch_add(1, Ordering::SeqCst));
        self.live.lock().unwrap().push(id);
        self.created.lock().unwrap().push((pixels.extent(), pixels.data().to_vec()));
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut live = self.live.lock().unwrap();
        let pos = live.iter().position(|t| *t == id).ok_or(ResourceError::NotFound)?;
        live.remove(pos);
        self.destroyed.lock().unwrap().push(id);
        Ok(())
    }
}

/// Produces a fixed 100-wide bottleneck from the style image's mean color.
#[derive(Debug)]
struct MockEncoder;

#[async_trait]
impl InferenceModel for MockEncoder {
    fn name(&self) -> &str {
        "mock-style-predict"
    }

    async fn predict(&self, inputs: &[&Tensor], pool: &TensorPool) -> Result<Tensor, InferenceError> {
        let mean = inputs[0].view().mean().unwrap_or(0.0);
        Ok(pool.adopt(ArrayD::from_elem(IxDyn(&[1, 1, 1, 100]), mean)))
    }
}

/// Inverts the content, optionally resampling or emitting a bad channel count.
#[derive(Debug)]
struct MockTransformer {
    output: Option<(usize, usize)>,
    channels: usize,
    fail: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl MockTransformer {
    fn new() -> Self {
        Self {
            output: None,
            channels: 3,
            fail: false,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    fn resampling(height: usize, width: usize) -> Self {
        Self {
            output: Some((height, width)),
            ..Self::new()
        }
    }

    fn with_channels(channels: usize) -> Self {
        Self {
            channels,
            ..Self::new()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl InferenceModel for MockTransformer {
    fn name(&self) -> &str {
        "mock-transformer"
    }

    async fn predict(&self, inputs: &[&Tensor], pool: &TensorPool) -> Result<Tensor, InferenceError> {
        if inputs.len() != 2 {
            return Err(InferenceError::Arity {
                expected: 2,
                actual: inputs.len(),
            });
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(InferenceError::Backend("out of memory".into()));
        }

        let content = inputs[0].view();
        let (h, w) = self.output.unwrap_or((content.shape()[1], content.shape()[2]));
        let (src_h, src_w) = (content.shape()[1], content.shape()[2]);
        let content = content.index_axis(Axis(0), 0);
        let out = ArrayD::from_shape_fn(IxDyn(&[1, h, w, self.channels]), |idx| {
            let (y, x, c) = (idx[1] * src_h / h, idx[2] * src_w / w, idx[3].min(2));
            1.0 - content[[y, x, c]]
        });
        Ok(pool.adopt(out))
    }
}

struct FailingLoader;

#[async_trait]
impl ModelLoader for FailingLoader {
    async fn load(&self, source: &AssetSource) -> Result<Arc<dyn InferenceModel>, AssetLoadError> {
        Err(AssetLoadError::Fetch {
            source: source.to_string(),
            reason: "HTTP 404".into(),
        })
    }
}

// --- HARNESS ---

struct Harness {
    controller: CycleController,
    target: Arc<MockTarget>,
    backend: Arc<MockTextureBackend>,
    transformer: Arc<MockTransformer>,
    material: SharedMaterial,
    pool: TensorPool,
    gate: Arc<RenderGate>,
}

async fn harness(
    trigger: TriggerPolicy,
    material: SharedMaterial,
    transformer: MockTransformer,
    size: u32,
    exporter: Option<FrameExporter>,
) -> Harness {
    harness_with_capture(CapturePolicy::Paused, trigger, material, transformer, size, exporter).await
}

async fn harness_with_capture(
    capture: CapturePolicy,
    trigger: TriggerPolicy,
    material: SharedMaterial,
    transformer: MockTransformer,
    size: u32,
    exporter: Option<FrameExporter>,
) -> Harness {
    let pool = TensorPool::new();
    let transformer = Arc::new(transformer);
    let style = StyleReference {
        pixels: PixelBuffer::solid_rgba(size, size, [200, 40, 40, 255]),
    };
    let session = InferenceSession::from_models(Arc::new(MockEncoder), transformer.clone(), &style, pool.clone())
        .await
        .unwrap();

    let target = Arc::new(MockTarget::new(size));
    let backend = Arc::new(MockTextureBackend::default());
    let gate = Arc::new(RenderGate::new());

    let mut feedback = TextureFeedback::new(backend.clone(), SamplingMode::Nearest);
    if let Some(exporter) = exporter {
        feedback = feedback.with_exporter(exporter);
    }
    let controller = CycleController::new(
        Arc::new(session),
        FrameCapture::new(capture, gate.clone()),
        feedback,
        CycleContext {
            target: target.clone(),
            material: material.clone(),
        },
        trigger,
    );

    Harness {
        controller,
        target,
        backend,
        transformer,
        material,
        pool,
        gate,
    }
}

fn standard() -> SharedMaterial {
    shared_material(StandardMaterial::default())
}

async fn run_once(controller: &CycleController) -> u64 {
    let TickOutcome::Started(sequence) = controller.trigger() else {
        panic!("controller was not idle");
    };
    controller.wait_idle().await;
    sequence
}

// --- TESTS ---

#[tokio::test]
async fn test_rapid_triggers_never_overlap() {
    let h = harness(TriggerPolicy::Manual, standard(), MockTransformer::new(), 8, None).await;

    assert_eq!(h.controller.trigger(), TickOutcome::Started(1));
    for _ in 0..10 {
        assert_eq!(h.controller.trigger(), TickOutcome::Dropped);
    }
    h.controller.wait_idle().await;

    let stats = h.controller.stats();
    assert_eq!(stats.started, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.dropped_triggers, 10);
    assert_eq!(h.transformer.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_continuous_ticks_keep_one_cycle_in_flight() {
    let mut h = harness(TriggerPolicy::Continuous, standard(), MockTransformer::new(), 8, None).await;

    for _ in 0..50 {
        let outcome = h.controller.tick(Instant::now());
        assert_ne!(outcome, TickOutcome::Waiting);
        tokio::task::yield_now().await;
    }
    h.controller.wait_idle().await;

    let stats = h.controller.stats();
    assert_eq!(stats.started + stats.dropped_triggers, 50);
    assert_eq!(stats.finished(), stats.started);
    assert_eq!(h.transformer.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(h.transformer.calls.load(Ordering::SeqCst) as u64, stats.started);
}

#[tokio::test]
async fn test_many_cycles_leave_one_texture_and_the_embedding() {
    let h = harness(TriggerPolicy::Manual, standard(), MockTransformer::new(), 8, None).await;

    for expected in 1..=5 {
        assert_eq!(run_once(&h.controller).await, expected);
    }

    assert_eq!(h.backend.created(), 5);
    assert_eq!(h.backend.live(), vec![TextureId(4)]);
    assert_eq!(h.backend.destroyed.lock().unwrap().len(), 4);
    assert_eq!(h.pool.live(), 1);

    let material = h.material.read().unwrap();
    assert_eq!(material.texture_slot().and_then(|s| s.texture()), Some(TextureId(4)));
    assert_eq!(h.gate.suspensions(), 5);
    assert!(h.gate.is_open());
}

#[tokio::test]
async fn test_reports_are_emitted_in_order() {
    let h = harness(TriggerPolicy::Manual, standard(), MockTransformer::new(), 4, None).await;
    let reports = h.controller.reports();

    run_once(&h.controller).await;
    run_once(&h.controller).await;

    let first = reports.try_recv().unwrap();
    let second = reports.try_recv().unwrap();
    assert_eq!((first.sequence, second.sequence), (1, 2));
    assert!(first.outcome.is_applied());
    assert!(second.started_at >= first.started_at);
}

#[tokio::test]
async fn test_256_frame_with_smaller_model_output() {
    let h = harness(
        TriggerPolicy::Manual,
        standard(),
        MockTransformer::resampling(128, 96),
        256,
        None,
    )
    .await;
    let reports = h.controller.reports();

    assert_eq!(h.controller.state(), CycleState::Idle);
    assert_eq!(h.controller.session().embedding().shape(), &[1, 1, 1, 100]);

    run_once(&h.controller).await;

    let report = reports.try_recv().unwrap();
    match report.outcome {
        CycleOutcome::Applied { texture, extent } => {
            assert_eq!(texture, TextureId(0));
            assert_eq!(extent, Extent2D::new(96, 128));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(h.backend.created(), 1);
    assert_eq!(h.backend.created.lock().unwrap()[0].0, Extent2D::new(96, 128));
}

#[tokio::test]
async fn test_material_without_slot_is_a_no_op() {
    let h = harness(
        TriggerPolicy::Manual,
        shared_material(WireframeMaterial::default()),
        MockTransformer::new(),
        8,
        None,
    )
    .await;
    let reports = h.controller.reports();

    run_once(&h.controller).await;

    assert!(matches!(
        reports.try_recv().unwrap().outcome,
        CycleOutcome::Mismatch(m) if m.material == "WireframeMaterial"
    ));
    assert_eq!(h.backend.created(), 0);
    assert!(h.backend.destroyed.lock().unwrap().is_empty());
    assert_eq!(h.controller.stats().mismatched, 1);
    assert_eq!(h.controller.state(), CycleState::Idle);
}

#[tokio::test]
async fn test_readback_failure_is_contained_and_retried() {
    let h = harness(TriggerPolicy::Manual, standard(), MockTransformer::new(), 8, None).await;
    let reports = h.controller.reports();
    h.target.fail.store(true, Ordering::SeqCst);

    run_once(&h.controller).await;

    assert!(matches!(
        reports.try_recv().unwrap().outcome,
        CycleOutcome::Failed {
            step: CycleState::Capturing,
            error: CycleError::Readback(ReadbackError::MapFailed(_)),
        }
    ));
    assert_eq!(h.controller.state(), CycleState::Idle);
    assert!(h.gate.is_open());
    assert_eq!(h.backend.created(), 0);
    assert_eq!(h.transformer.calls.load(Ordering::SeqCst), 0);

    h.target.fail.store(false, Ordering::SeqCst);
    run_once(&h.controller).await;

    assert!(reports.try_recv().unwrap().outcome.is_applied());
    let stats = h.controller.stats();
    assert_eq!((stats.failed, stats.completed), (1, 1));
}

#[tokio::test]
async fn test_shape_failure_releases_tensors() {
    let h = harness(
        TriggerPolicy::Manual,
        standard(),
        MockTransformer::with_channels(2),
        8,
        None,
    )
    .await;
    let reports = h.controller.reports();

    run_once(&h.controller).await;

    assert!(matches!(
        reports.try_recv().unwrap().outcome,
        CycleOutcome::Failed {
            step: CycleState::Decoding,
            error: CycleError::Shape(ShapeError::Channels { .. }),
        }
    ));
    assert_eq!(h.pool.live(), 1);
    assert_eq!(h.backend.created(), 0);
    assert_eq!(h.controller.state(), CycleState::Idle);
}

#[tokio::test]
async fn test_inference_failure_keeps_last_texture() {
    let h = harness(TriggerPolicy::Manual, standard(), MockTransformer::failing(), 8, None).await;
    let reports = h.controller.reports();

    run_once(&h.controller).await;

    assert!(matches!(
        reports.try_recv().unwrap().outcome,
        CycleOutcome::Failed {
            step: CycleState::Inferring,
            error: CycleError::Inference(InferenceError::Backend(_)),
        }
    ));
    assert_eq!(h.pool.live(), 1);
    assert!(h.backend.live().is_empty());
}

#[tokio::test]
async fn test_panicking_target_is_contained() {
    let h = harness(TriggerPolicy::Manual, standard(), MockTransformer::new(), 8, None).await;
    let reports = h.controller.reports();
    h.target.panic.store(true, Ordering::SeqCst);

    assert_eq!(h.controller.trigger(), TickOutcome::Started(1));
    tokio::time::timeout(Duration::from_secs(5), h.controller.wait_idle())
        .await
        .expect("controller stuck after a panicking cycle");

    match reports.try_recv().unwrap().outcome {
        CycleOutcome::Failed {
            step: CycleState::Capturing,
            error: CycleError::Aborted(reason),
        } => assert!(reason.contains("device lost")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(h.controller.state(), CycleState::Idle);
    assert!(h.gate.is_open());

    h.target.panic.store(false, Ordering::SeqCst);
    assert_eq!(run_once(&h.controller).await, 2);
    let stats = h.controller.stats();
    assert_eq!((stats.started, stats.failed, stats.completed), (2, 1, 1));
    assert_eq!(stats.dropped_triggers, 0);
}

#[tokio::test]
async fn test_live_capture_never_suspends_rendering() {
    let h = harness_with_capture(
        CapturePolicy::Live,
        TriggerPolicy::Manual,
        standard(),
        MockTransformer::new(),
        8,
        None,
    )
    .await;
    let reports = h.controller.reports();

    run_once(&h.controller).await;
    run_once(&h.controller).await;

    assert!(reports.try_recv().unwrap().outcome.is_applied());
    assert!(reports.try_recv().unwrap().outcome.is_applied());
    assert_eq!(h.gate.suspensions(), 0);
    assert!(h.gate.is_open());
    assert_eq!(h.backend.live(), vec![TextureId(1)]);
    assert_eq!(h.target.reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_delayed_trigger_fires_once() {
    let mut h = harness(
        TriggerPolicy::Delayed { seconds: 1.0 },
        standard(),
        MockTransformer::new(),
        8,
        None,
    )
    .await;
    let t0 = Instant::now();

    assert_eq!(h.controller.tick(t0), TickOutcome::Waiting);
    assert_eq!(h.controller.tick(t0 + Duration::from_millis(500)), TickOutcome::Waiting);
    assert_eq!(h.controller.tick(t0 + Duration::from_secs(1)), TickOutcome::Started(1));
    h.controller.wait_idle().await;

    assert_eq!(h.controller.tick(t0 + Duration::from_secs(2)), TickOutcome::Waiting);
    assert_eq!(h.controller.tick(t0 + Duration::from_secs(60)), TickOutcome::Waiting);
    assert_eq!(h.controller.stats().started, 1);
    assert_eq!(h.target.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_manual_policy_ignores_ticks() {
    let mut h = harness(TriggerPolicy::Manual, standard(), MockTransformer::new(), 8, None).await;

    for _ in 0..5 {
        assert_eq!(h.controller.tick(Instant::now()), TickOutcome::Waiting);
    }
    assert_eq!(h.controller.stats().started, 0);

    run_once(&h.controller).await;
    assert_eq!(h.controller.stats().completed, 1);
}

#[tokio::test]
async fn test_stop_prevents_new_cycles() {
    let mut h = harness(TriggerPolicy::Continuous, standard(), MockTransformer::new(), 8, None).await;

    assert_eq!(h.controller.tick(Instant::now()), TickOutcome::Started(1));
    h.controller.stop();
    h.controller.wait_idle().await;

    // The in-flight cycle ran to completion.
    assert_eq!(h.controller.stats().completed, 1);
    assert_eq!(h.controller.tick(Instant::now()), TickOutcome::Stopped);
    assert_eq!(h.controller.trigger(), TickOutcome::Stopped);
    assert!(h.controller.is_stopped());
}

#[tokio::test]
async fn test_identical_frames_produce_identical_textures() {
    let h = harness(TriggerPolicy::Manual, standard(), MockTransformer::new(), 16, None).await;

    run_once(&h.controller).await;
    run_once(&h.controller).await;

    let created = h.backend.created.lock().unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0], created[1]);
}

#[tokio::test]
async fn test_applied_frames_reach_the_exporter() {
    let (exporter, exports) = FrameExporter::new(ExportConfig::default());
    let h = harness(
        TriggerPolicy::Manual,
        standard(),
        MockTransformer::new(),
        8,
        Some(exporter),
    )
    .await;

    run_once(&h.controller).await;

    let exported = exports.recv_async().await.unwrap();
    assert_eq!(exported.sequence, 1);
    assert!(exported.data_url.starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_failed_initialization_never_reaches_idle() {
    let target = MockTarget::new(8);
    let style = StyleReference {
        pixels: PixelBuffer::solid_rgba(8, 8, [0, 0, 0, 255]),
    };

    let result = InferenceSession::initialize(
        &FailingLoader,
        &AssetSource::parse("https://example.com/style/model.onnx"),
        &AssetSource::parse("https://example.com/transformer/model.onnx"),
        &style,
        TensorPool::new(),
    )
    .await;

    assert!(matches!(result, Err(AssetLoadError::Fetch { .. })));
    // Without a session there is no controller, so nothing was ever captured.
    assert_eq!(target.reads.load(Ordering::SeqCst), 0);
}
