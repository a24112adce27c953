//! Render Coordinator
//!
//! Host-side protocol state machine, one state per render target. Keeps at
//! most one render in flight and at most one queued per target: a burst of
//! rotation updates collapses to the in-flight frame plus one follow-up
//! carrying the newest parameters. Earlier intermediate requests are
//! deliberately dropped: under load the display skips to the latest
//! rotation instead of replaying stale ones.

use std::collections::HashMap;

use crate::engine::{RenderCommand, RenderOutcome, RenderRequest, RenderResult, RenderWorker};

/// Per-target protocol state.
///
/// The busy/needs-rerender flags are modeled as one enum so the
/// single-in-flight-plus-one-queued invariant is structural: there is no
/// state in which two renders are in flight or two requests are queued.
#[derive(Debug)]
pub enum TargetState {
    Idle,
    Rendering,
    RenderingPending(RenderRequest),
}

impl TargetState {
    /// Accept a new request. Returns the request to dispatch now, if the
    /// target was idle; otherwise the request parks in the pending slot,
    /// displacing whatever was there (latest-wins, not FIFO).
    pub fn submit(&mut self, request: RenderRequest) -> Option<RenderRequest> {
        match self {
            TargetState::Idle => {
                *self = TargetState::Rendering;
                Some(request)
            },
            TargetState::Rendering | TargetState::RenderingPending(_) => {
                *self = TargetState::RenderingPending(request);
                None
            },
        }
    }

    /// A result (or failure) for this target arrived. Returns the pending
    /// request to dispatch next, if one was queued.
    pub fn complete(&mut self) -> Option<RenderRequest> {
        match std::mem::replace(self, TargetState::Idle) {
            TargetState::RenderingPending(next) => {
                *self = TargetState::Rendering;
                Some(next)
            },
            // Idle (unsolicited result) and Rendering both settle to Idle
            TargetState::Idle | TargetState::Rendering => None,
        }
    }
}

/// Owns one render worker and the protocol state for every target that has
/// ever requested a frame. Target states are created lazily and never
/// destroyed.
pub struct Coordinator {
    worker: Option<RenderWorker>,
    targets: HashMap<String, TargetState>,
    /// Zero-area requests parked for retry on the next tick
    deferred: Vec<RenderRequest>,
}

impl Coordinator {
    /// Start a coordinator with its own render thread. If the thread cannot
    /// be spawned, rendering is disabled for this coordinator's lifetime and
    /// every request becomes a silent no-op; callers keep running with a
    /// stale or blank surface.
    pub fn new(name: &str) -> Self {
        match RenderWorker::spawn(name) {
            Ok(worker) => Self::with_worker(Some(worker)),
            Err(e) => {
                eprintln!("renderer '{}' unavailable: {}", name, e);
                Self::with_worker(None)
            },
        }
    }

    fn with_worker(worker: Option<RenderWorker>) -> Self {
        Self {
            worker,
            targets: HashMap::new(),
            deferred: Vec::new(),
        }
    }

    /// True if a render thread is running
    pub fn is_available(&self) -> bool {
        self.worker.is_some()
    }

    /// Submit a render request for its target.
    ///
    /// A request against a zero-area destination is transient, not an error:
    /// it is deferred and retried on the next tick. A newer request for the
    /// same target supersedes a deferred one.
    pub fn request(&mut self, request: RenderRequest) {
        if self.worker.is_none() {
            return;
        }

        self.deferred.retain(|r| r.target_id != request.target_id);

        if request.width == 0 || request.height == 0 {
            self.deferred.push(request);
            return;
        }

        let state = self
            .targets
            .entry(request.target_id.clone())
            .or_insert(TargetState::Idle);
        if let Some(ready) = state.submit(request) {
            self.dispatch(ready);
        }
    }

    /// Warm the worker's noise cache for a seed. No reply is expected.
    pub fn preload(&mut self, seed: f32) {
        if let Some(worker) = &self.worker {
            worker.send(RenderCommand::Preload { seed });
        }
    }

    /// Pump the protocol: retry deferred requests, drain finished outcomes,
    /// dispatch queued follow-ups. Returns completed frames, oldest first;
    /// ownership of each pixel buffer passes to the caller.
    pub fn tick(&mut self) -> Vec<RenderResult> {
        for request in std::mem::take(&mut self.deferred) {
            self.request(request);
        }

        let outcomes = match &self.worker {
            Some(worker) => worker.poll(),
            None => Vec::new(),
        };

        let mut frames = Vec::new();
        for outcome in outcomes {
            let target_id = match &outcome {
                RenderOutcome::Frame(frame) => frame.target_id.clone(),
                RenderOutcome::Failed { target_id } => target_id.clone(),
            };

            // A failure still completes the state machine; otherwise the
            // target would stay in Rendering forever
            let next = self
                .targets
                .get_mut(&target_id)
                .and_then(|state| state.complete());
            if let Some(next_request) = next {
                self.dispatch(next_request);
            }

            if let RenderOutcome::Frame(frame) = outcome {
                frames.push(frame);
            }
        }
        frames
    }

    fn dispatch(&mut self, request: RenderRequest) {
        let target_id = request.target_id.clone();
        let sent = self
            .worker
            .as_ref()
            .map(|worker| worker.send(RenderCommand::Render(request)))
            .unwrap_or(false);
        if !sent {
            // Worker thread is gone; settle the target so it cannot wedge
            if let Some(state) = self.targets.get_mut(&target_id) {
                *state = TargetState::Idle;
            }
        }
    }
}
