//! Render Worker
//!
//! Runs the rasterizer on a dedicated thread, talking to the host only
//! through channel messages. The host never blocks: commands go in through a
//! sender, finished frames come back through a non-blocking poll. Each worker
//! owns its own noise cache; nothing is shared across threads besides the
//! message payloads themselves.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::cache::NoiseCache;
use crate::display::PixelBuffer;
use crate::math3d::Quat;
use crate::planet::PlanetDescriptor;
use crate::raster;

/// One render to perform. Immutable and single-use.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub descriptor: PlanetDescriptor,
    pub rotation: Quat,
    pub width: u32,
    pub height: u32,
    pub target_id: String,
    pub radius_override: Option<f32>,
}

/// Host → worker commands
pub enum RenderCommand {
    Render(RenderRequest),
    /// Warm the noise cache for a seed. No pixel work, no reply. Issued so
    /// the first interactive render of a freshly generated planet skips the
    /// permutation-table build.
    Preload { seed: f32 },
}

/// A completed frame. The pixel vector is moved, not copied, through the
/// channel; after delivery the worker retains no reference and the host owns
/// the buffer exclusively.
pub struct RenderResult {
    /// RGBA bytes, length `width * height * 4`
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub target_id: String,
}

/// Worker → host replies (`Preload` sends none)
pub enum RenderOutcome {
    Frame(RenderResult),
    /// The per-pixel loop panicked; the coordinator must still clear the
    /// in-flight slot for this target.
    Failed { target_id: String },
}

/// Handle to a render thread: command sender + outcome receiver
pub struct RenderWorker {
    commands: Sender<RenderCommand>,
    outcomes: Receiver<RenderOutcome>,
    _thread: thread::JoinHandle<()>,
}

impl RenderWorker {
    /// Start a named render thread.
    /// Fails if the platform cannot spawn the thread; callers treat that as
    /// rendering being unavailable, not as a crash.
    pub fn spawn(name: &str) -> Result<Self, String> {
        let (command_tx, command_rx) = mpsc::channel();
        let (outcome_tx, outcome_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name(format!("render-{}", name))
            .spawn(move || Self::render_loop(command_rx, outcome_tx))
            .map_err(|e| format!("failed to start render thread '{}': {}", name, e))?;

        Ok(Self {
            commands: command_tx,
            outcomes: outcome_rx,
            _thread: handle,
        })
    }

    /// Queue a command. Returns false if the worker thread is gone.
    pub fn send(&self, command: RenderCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Drain all completed outcomes without blocking
    pub fn poll(&self) -> Vec<RenderOutcome> {
        let mut drained = Vec::new();
        while let Ok(outcome) = self.outcomes.try_recv() {
            drained.push(outcome);
        }
        drained
    }

    fn render_loop(commands: Receiver<RenderCommand>, outcomes: Sender<RenderOutcome>) {
        let mut cache = NoiseCache::new();

        for command in commands.iter() {
            match command {
                RenderCommand::Preload { seed } => {
                    cache.ensure(seed);
                },
                RenderCommand::Render(request) => {
                    let field = cache.ensure(request.descriptor.continent_seed);
                    let target_id = request.target_id.clone();
                    let (width, height) = (request.width, request.height);

                    // One frame is a synchronous, non-preemptible pixel loop;
                    // a panic inside it must not take the worker down with it
                    let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
                        let mut buffer = PixelBuffer::with_size(width, height);
                        raster::render_planet(
                            &request.descriptor,
                            request.rotation,
                            request.radius_override,
                            &field,
                            &mut buffer,
                        );
                        buffer
                    }));

                    let outcome = match rendered {
                        Ok(buffer) => RenderOutcome::Frame(RenderResult {
                            pixels: buffer.into_bytes(),
                            width,
                            height,
                            target_id,
                        }),
                        Err(_) => RenderOutcome::Failed { target_id },
                    };

                    if outcomes.send(outcome).is_err() {
                        // Host gone, exit
                        break;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for_outcomes(worker: &RenderWorker, count: usize) -> Vec<RenderOutcome> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut collected = Vec::new();
        while collected.len() < count && Instant::now() < deadline {
            collected.extend(worker.poll());
            thread::sleep(Duration::from_millis(2));
        }
        collected
    }

    fn request(target_id: &str, size: u32) -> RenderRequest {
        RenderRequest {
            descriptor: PlanetDescriptor {
                water_color: [0, 0, 255],
                land_color: [0, 128, 0],
                continent_seed: 0.42,
                min_terrain_height: 0.0,
                max_terrain_height: 10.0,
                ocean_height_level: 2.0,
            },
            rotation: Quat::identity(),
            width: size,
            height: size,
            target_id: target_id.into(),
            radius_override: None,
        }
    }

    #[test]
    fn test_render_round_trip() {
        let worker = RenderWorker::spawn("test").unwrap();
        assert!(worker.send(RenderCommand::Render(request("inspect", 32))));

        let outcomes = wait_for_outcomes(&worker, 1);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            RenderOutcome::Frame(frame) => {
                assert_eq!(frame.target_id, "inspect");
                assert_eq!(frame.width, 32);
                assert_eq!(frame.height, 32);
                assert_eq!(frame.pixels.len(), 32 * 32 * 4);
            },
            RenderOutcome::Failed { .. } => panic!("render should succeed"),
        }
    }

    #[test]
    fn test_preload_sends_no_reply() {
        let worker = RenderWorker::spawn("test-preload").unwrap();
        assert!(worker.send(RenderCommand::Preload { seed: 0.42 }));
        assert!(worker.send(RenderCommand::Render(request("inspect", 16))));

        // Only the render replies; the preload is silent
        let outcomes = wait_for_outcomes(&worker, 1);
        assert_eq!(outcomes.len(), 1);
        thread::sleep(Duration::from_millis(20));
        assert!(worker.poll().is_empty());
    }

    #[test]
    fn test_preload_does_not_change_output() {
        let worker = RenderWorker::spawn("test-idempotent").unwrap();
        worker.send(RenderCommand::Render(request("a", 24)));
        let first = wait_for_outcomes(&worker, 1);

        // Preload the same seed twice, then render again
        worker.send(RenderCommand::Preload { seed: 0.42 });
        worker.send(RenderCommand::Preload { seed: 0.42 });
        worker.send(RenderCommand::Render(request("a", 24)));
        let second = wait_for_outcomes(&worker, 1);

        match (&first[0], &second[0]) {
            (RenderOutcome::Frame(a), RenderOutcome::Frame(b)) => {
                assert_eq!(a.pixels, b.pixels);
            },
            _ => panic!("both renders should succeed"),
        }
    }
}
