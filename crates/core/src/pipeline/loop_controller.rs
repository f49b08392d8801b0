use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{after, never, select, Receiver};
use thiserror::Error;

use crate::capture::domain::capture_session::{CaptureError, CaptureSession};
use crate::gallery::domain::gallery::Gallery;
use crate::pipeline::cycle_logger::{CycleLogger, NullCycleLogger};
use crate::pipeline::recognition_engine::RecognitionEngine;
use crate::pipeline::render_sink::{RenderEvent, RenderSink, Status};
use crate::publishing::domain::decision_publisher::DecisionPublisher;
use crate::publishing::domain::decision_store::AccessDecision;
use crate::shared::constants::DEFAULT_CYCLE_INTERVAL_MS;

pub const STATUS_CAMERA_ERROR: &str = "Camera Error";
pub const STATUS_CAMERA_CLOSED: &str = "Camera Closed";
pub const STATUS_WAITING: &str = "Access: Waiting...";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("recognition loop is not running")]
    NotRunning,
}

/// Operator requests delivered to [`LoopController::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    /// Open the selected camera and begin scheduled cycles.
    Start,
    /// Halt scheduling and release the camera.
    Stop,
    /// Run one cycle immediately, outside the schedule.
    Scan,
    /// Choose the camera used by the next `Start`.
    SelectCamera(usize),
    /// Stop and leave the command loop.
    Shutdown,
}

/// How one cycle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Decided {
        decision: AccessDecision,
        published: bool,
    },
    CameraError,
    RecognitionFailed,
}

/// Drives capture -> recognize -> publish -> render.
///
/// While Running, a cycle is scheduled `interval` after the previous one
/// completes, so cycles never overlap. Everything runs on the thread that
/// calls [`run`](Self::run); commands and ticks are serialized through one
/// `select!`.
pub struct LoopController {
    session: CaptureSession,
    engine: RecognitionEngine,
    gallery: Arc<Gallery>,
    publisher: DecisionPublisher,
    sink: Box<dyn RenderSink>,
    logger: Box<dyn CycleLogger>,
    state: LoopState,
    selected_camera: usize,
    interval: Duration,
    next_tick: Option<Receiver<Instant>>,
}

impl LoopController {
    pub fn new(
        session: CaptureSession,
        engine: RecognitionEngine,
        gallery: Arc<Gallery>,
        publisher: DecisionPublisher,
        sink: Box<dyn RenderSink>,
    ) -> Self {
        Self {
            session,
            engine,
            gallery,
            publisher,
            sink,
            logger: Box::new(NullCycleLogger),
            state: LoopState::Idle,
            selected_camera: 0,
            interval: Duration::from_millis(DEFAULT_CYCLE_INTERVAL_MS),
            next_tick: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn CycleLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// Records which camera the next `start` from the command loop opens.
    /// Has no effect on a session that is already running.
    pub fn select_camera(&mut self, index: usize) {
        log::info!("Camera {index} selected");
        self.selected_camera = index;
    }

    pub fn selected_camera(&self) -> usize {
        self.selected_camera
    }

    /// Opens `camera_index` and schedules the first cycle immediately.
    ///
    /// Each start begins a fresh logging session. Starting while Running is
    /// a no-op. If the camera cannot be opened the
    /// error is rendered and returned, and the controller stays Idle.
    pub fn start(&mut self, camera_index: usize) -> Result<(), CaptureError> {
        if self.state == LoopState::Running {
            log::debug!("Start ignored: already running");
            return Ok(());
        }

        if let Err(e) = self.session.open(camera_index) {
            self.sink
                .render(RenderEvent::status_only(Status::error(e.to_string())));
            return Err(e);
        }

        self.state = LoopState::Running;
        self.next_tick = Some(after(Duration::ZERO));
        self.logger.reset();
        self.logger.info(&format!("Recognition started on camera {camera_index}"));
        self.sink
            .render(RenderEvent::status_only(Status::ok(STATUS_WAITING)));
        Ok(())
    }

    /// Cancels pending cycles and releases the camera. Idempotent.
    pub fn stop(&mut self) {
        if self.state == LoopState::Idle {
            return;
        }
        self.next_tick = None;
        self.session.close();
        self.state = LoopState::Idle;
        self.logger.info("Recognition stopped");
        self.logger.summary();
        self.sink
            .render(RenderEvent::status_only(Status::ok(STATUS_CAMERA_CLOSED)));
    }

    /// Runs a single cycle now without touching the schedule.
    pub fn run_once(&mut self) -> Result<CycleOutcome, ControlError> {
        if self.state != LoopState::Running {
            return Err(ControlError::NotRunning);
        }
        Ok(self.cycle())
    }

    /// Runs the scheduled cycle and arms the next one.
    ///
    /// Does nothing unless Running.
    pub fn tick(&mut self) -> Option<CycleOutcome> {
        if self.state != LoopState::Running {
            return None;
        }
        let outcome = self.cycle();
        if self.state == LoopState::Running {
            self.next_tick = Some(after(self.interval));
        }
        Some(outcome)
    }

    /// Serves commands and scheduled cycles until `Shutdown` arrives or the
    /// command channel disconnects. The camera is released on exit.
    pub fn run(&mut self, commands: &Receiver<ControlCommand>) {
        loop {
            let tick = self.next_tick.clone().unwrap_or_else(never);
            select! {
                recv(commands) -> msg => match msg {
                    Ok(command) => {
                        if !self.handle(command) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(tick) -> _ => {
                    // A stop that raced the timer must win.
                    if !self.drain(commands) {
                        break;
                    }
                    self.tick();
                }
            }
        }
        self.stop();
    }

    /// Applies one command. Returns `false` when the loop should exit.
    pub fn handle(&mut self, command: ControlCommand) -> bool {
        log::debug!("Command: {command:?}");
        match command {
            ControlCommand::Start => {
                // Failure has already been rendered.
                let _ = self.start(self.selected_camera);
            }
            ControlCommand::Stop => self.stop(),
            ControlCommand::Scan => {
                if let Err(e) = self.run_once() {
                    log::info!("Scan ignored: {e}");
                }
            }
            ControlCommand::SelectCamera(index) => self.select_camera(index),
            ControlCommand::Shutdown => return false,
        }
        true
    }

    fn drain(&mut self, commands: &Receiver<ControlCommand>) -> bool {
        while let Ok(command) = commands.try_recv() {
            if !self.handle(command) {
                return false;
            }
        }
        true
    }

    fn cycle(&mut self) -> CycleOutcome {
        let started = Instant::now();
        let frame = match self.session.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("{e}");
                self.sink
                    .render(RenderEvent::status_only(Status::error(STATUS_CAMERA_ERROR)));
                let outcome = CycleOutcome::CameraError;
                self.logger.outcome(&outcome);
                return outcome;
            }
        };
        self.logger.timing("capture", elapsed_ms(started));

        let t = Instant::now();
        let result = match self.engine.recognize(&frame, &self.gallery) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Frame {}: {e}", frame.sequence());
                self.sink.render(RenderEvent {
                    status: Status::error(format!("Recognition Error: {e}")),
                    frame: Some(frame),
                    overlays: Vec::new(),
                });
                let outcome = CycleOutcome::RecognitionFailed;
                self.logger.outcome(&outcome);
                return outcome;
            }
        };
        self.logger.timing("recognize", elapsed_ms(t));
        if let Some(label) = &result.matched_label {
            self.logger
                .info(&format!("Frame {}: matched {label}", frame.sequence()));
        }

        let t = Instant::now();
        let decision = AccessDecision::from_match(result.matched);
        let published = self.publisher.publish(result.matched);
        self.logger.timing("publish", elapsed_ms(t));

        let value = self.publisher.values().value_for(decision);
        let mut status = if decision.is_granted() {
            Status::ok(format!("Access: {value}"))
        } else {
            Status::error(format!("Access: {value}"))
        };
        if let Err(e) = &published {
            status = Status::error(format!("{} (not published: {e})", status.text));
        }

        let t = Instant::now();
        self.sink.render(RenderEvent {
            status,
            frame: Some(frame),
            overlays: result.annotated_regions,
        });
        self.logger.timing("render", elapsed_ms(t));

        let outcome = CycleOutcome::Decided {
            decision,
            published: published.is_ok(),
        };
        self.logger.outcome(&outcome);
        outcome
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
