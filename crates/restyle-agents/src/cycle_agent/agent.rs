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

//! Defines the CycleController, the state machine serializing restyle cycles.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use restyle_core::{
    asset::SharedMaterial,
    lane::Lane,
    math::Extent2D,
    CycleError, RenderGate, RenderTarget, StylizedFrame, TriggerPolicy,
};
use restyle_lanes::{FeedbackOutcome, FrameCapture, InferenceSession, TextureFeedback};
use tokio::sync::Notify;

use super::report::{CycleOutcome, CycleReport, CycleState, CycleStats};

/// Reports buffered for a slow reader before new ones are dropped.
const REPORT_CAPACITY: usize = 64;

/// The scene objects a cycle reads from and writes to.
#[derive(Debug, Clone)]
pub struct CycleContext {
    /// The drawable whose pixels are captured.
    pub target: Arc<dyn RenderTarget>,
    /// The surface material that receives stylized frames.
    pub material: SharedMaterial,
}

/// What a call to [`CycleController::tick`] or [`CycleController::trigger`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A cycle with this sequence number was spawned.
    Started(u64),
    /// A cycle is in flight; the trigger was dropped.
    Dropped,
    /// The trigger policy did not fire on this tick.
    Waiting,
    /// The controller was stopped.
    Stopped,
}

/// State shared between the controller and its in-flight cycle.
#[derive(Debug)]
struct Shared {
    session: Arc<InferenceSession>,
    capture: FrameCapture,
    feedback: TextureFeedback,
    context: CycleContext,
    state: Mutex<CycleState>,
    stats: Mutex<CycleStats>,
    sequence: AtomicU64,
    stopped: AtomicBool,
    reports: flume::Sender<CycleReport>,
    idle: Notify,
}

/// The agent responsible for scheduling restyle cycles.
///
/// Constructed only from a successfully initialized [`InferenceSession`], so a
/// controller always starts in [`CycleState::Idle`].
///
/// Cycles are spawned onto the current tokio runtime; `tick` and `trigger`
/// must be called from within one.
#[derive(Debug)]
pub struct CycleController {
    shared: Arc<Shared>,
    trigger: TriggerPolicy,
    reports: flume::Receiver<CycleReport>,
    first_tick: Option<Instant>,
    delayed_fired: bool,
}

impl CycleController {
    /// Creates an idle controller.
    pub fn new(
        session: Arc<InferenceSession>,
        capture: FrameCapture,
        feedback: TextureFeedback,
        context: CycleContext,
        trigger: TriggerPolicy,
    ) -> Self {
        log::info!(
            "CycleController: {} capture, {} inference, {} feedback, trigger {:?}",
            capture.strategy_name(),
            session.strategy_name(),
            feedback.strategy_name(),
            trigger
        );

        let (sender, reports) = flume::bounded(REPORT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                session,
                capture,
                feedback,
                context,
                state: Mutex::new(CycleState::Idle),
                stats: Mutex::new(CycleStats::default()),
                sequence: AtomicU64::new(0),
                stopped: AtomicBool::new(false),
                reports: sender,
                idle: Notify::new(),
            }),
            trigger,
            reports,
            first_tick: None,
            delayed_fired: false,
        }
    }

    /// The per-frame entry point, called by the host before rendering.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.is_stopped() {
            return TickOutcome::Stopped;
        }
        match self.trigger {
            TriggerPolicy::Continuous => self.shared.try_start(),
            TriggerPolicy::Delayed { seconds } => {
                let first = *self.first_tick.get_or_insert(now);
                let delay = Duration::try_from_secs_f32(seconds).unwrap_or_default();
                if self.delayed_fired || now.saturating_duration_since(first) < delay {
                    return TickOutcome::Waiting;
                }
                let outcome = self.shared.try_start();
                if matches!(outcome, TickOutcome::Started(_)) {
                    self.delayed_fired = true;
                }
                outcome
            }
            TriggerPolicy::Manual => TickOutcome::Waiting,
        }
    }

    /// Starts a cycle now if the controller is idle, whatever the trigger policy.
    pub fn trigger(&self) -> TickOutcome {
        self.shared.try_start()
    }

    /// Prevents further cycle starts. An in-flight cycle runs to completion.
    pub fn stop(&self) {
        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            log::info!("CycleController: stopped");
        }
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// The current step of the state machine.
    pub fn state(&self) -> CycleState {
        self.shared.state()
    }

    /// A snapshot of the running counters.
    pub fn stats(&self) -> CycleStats {
        *self.shared.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A receiver for the report of every finished cycle.
    pub fn reports(&self) -> flume::Receiver<CycleReport> {
        self.reports.clone()
    }

    /// The gate the host must consult before rendering a frame.
    pub fn render_gate(&self) -> &Arc<RenderGate> {
        self.shared.capture.gate()
    }

    /// The session the controller runs.
    pub fn session(&self) -> &Arc<InferenceSession> {
        &self.shared.session
    }

    /// Resolves once no cycle is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.state() == CycleState::Idle {
                return;
            }
            notified.await;
        }
    }
}

impl Shared {
    fn state(&self) -> CycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, state: CycleState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn update_stats(&self, f: impl FnOnce(&mut CycleStats)) {
        f(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }

    fn try_start(self: &Arc<Self>) -> TickOutcome {
        if self.stopped.load(Ordering::SeqCst) {
            return TickOutcome::Stopped;
        }
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != CycleState::Idle {
                log::trace!("CycleController: trigger dropped while {}", *state);
                drop(state);
                self.update_stats(|s| s.dropped_triggers += 1);
                return TickOutcome::Dropped;
            }
            *state = CycleState::Capturing;
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.update_stats(|s| s.started += 1);
        tokio::spawn(Arc::clone(self).run_cycle(sequence));
        TickOutcome::Started(sequence)
    }

    async fn run_cycle(self: Arc<Self>, sequence: u64) {
        let _idle = IdleOnExit(&self);
        let started_at = Instant::now();
        log::debug!("Cycle {sequence}: started");

        // The pipeline runs as its own task so a panicking backend surfaces as a JoinError.
        let pipeline = tokio::spawn({
            let shared = Arc::clone(&self);
            async move { shared.pipeline(sequence).await }
        });
        let result = pipeline.await.unwrap_or_else(|err| {
            let step = self.state();
            let reason = if err.is_panic() {
                panic_message(err.into_panic())
            } else {
                "task cancelled".to_string()
            };
            Err((step, CycleError::Aborted(reason)))
        });

        let outcome = match result {
            Ok((FeedbackOutcome::Applied { texture, .. }, extent)) => {
                self.update_stats(|s| s.completed += 1);
                CycleOutcome::Applied { texture, extent }
            }
            Ok((FeedbackOutcome::Mismatch(mismatch), _)) => {
                self.update_stats(|s| s.mismatched += 1);
                CycleOutcome::Mismatch(mismatch)
            }
            Err((step, error)) => {
                self.enter(CycleState::Faulted);
                log::warn!("Cycle {sequence}: failed while {step}: {error}");
                self.update_stats(|s| s.failed += 1);
                CycleOutcome::Failed { step, error }
            }
        };

        let duration = started_at.elapsed();
        log::debug!("Cycle {sequence}: finished in {duration:?}");
        let report = CycleReport {
            sequence,
            outcome,
            started_at,
            duration,
        };
        if self.reports.try_send(report).is_err() {
            log::trace!("Cycle {sequence}: report dropped, no reader keeping up");
        }
    }

    async fn pipeline(
        &self,
        sequence: u64,
    ) -> Result<(FeedbackOutcome, Extent2D), (CycleState, CycleError)> {
        let bridge = self.session.bridge();

        let frame = self
            .capture
            .capture(self.context.target.as_ref())
            .await
            .map_err(|e| (CycleState::Capturing, CycleError::from(e)))?;

        self.enter(CycleState::Encoding);
        let content = bridge
            .encode(&frame.pixels)
            .map_err(|e| (CycleState::Encoding, CycleError::from(e)))?;
        drop(frame);

        self.enter(CycleState::Inferring);
        let stylized = self
            .session
            .transform(content, self.session.embedding())
            .await
            .map_err(|e| (CycleState::Inferring, CycleError::from(e)))?;

        self.enter(CycleState::Decoding);
        let decoded = bridge.decode(&stylized);
        stylized.release();
        let frame = StylizedFrame {
            pixels: decoded.map_err(|e| (CycleState::Decoding, CycleError::from(e)))?,
        };

        self.enter(CycleState::Applying);
        let extent = frame.pixels.extent();
        let outcome = self
            .feedback
            .apply(&frame, &self.context.material, sequence)
            .map_err(|e| (CycleState::Applying, CycleError::from(e)))?;
        Ok((outcome, extent))
    }
}

/// Returns the controller to `Idle` and wakes waiters however a cycle ends.
struct IdleOnExit<'a>(&'a Shared);

impl Drop for IdleOnExit<'_> {
    fn drop(&mut self) {
        self.0.enter(CycleState::Idle);
        self.0.idle.notify_waiters();
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "backend panicked".to_string()
    }
}
