use std::collections::HashMap;
use std::time::Instant;

use crate::pipeline::loop_controller::CycleOutcome;

/// Cross-cutting logger for recognition-loop events.
///
/// Keeps the controller free of any particular output mechanism; the CLI
/// collects statistics while tests discard everything.
pub trait CycleLogger: Send {
    /// Record how long a named stage took for one cycle.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record how a cycle ended.
    fn outcome(&mut self, outcome: &CycleOutcome);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit a summary of the session so far. Default: no-op.
    fn summary(&self) {}

    /// Forget everything recorded so far; called when a new session starts.
    fn reset(&mut self) {}
}

/// Silent logger that discards all events.
pub struct NullCycleLogger;

impl CycleLogger for NullCycleLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn outcome(&mut self, _outcome: &CycleOutcome) {}
    fn info(&mut self, _message: &str) {}
}

/// Running total for one stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageTiming {
    pub count: usize,
    pub total_ms: f64,
}

impl StageTiming {
    pub fn average_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleCounters {
    pub cycles: usize,
    pub granted: usize,
    pub denied: usize,
    pub camera_errors: usize,
    pub recognition_errors: usize,
    pub publish_failures: usize,
}

/// Tracks per-stage timing and outcome counts for the current session and
/// reports them through the `log` crate when it stops.
///
/// Memory stays constant however long a session runs.
///
/// Cycle-level progress is throttled to every `throttle_cycles` cycles.
pub struct StatsCycleLogger {
    throttle_cycles: usize,
    timings: HashMap<String, StageTiming>,
    counters: CycleCounters,
    start_time: Instant,
}

impl StatsCycleLogger {
    pub fn new(throttle_cycles: usize) -> Self {
        Self {
            throttle_cycles: throttle_cycles.max(1),
            timings: HashMap::new(),
            counters: CycleCounters::default(),
            start_time: Instant::now(),
        }
    }

    pub fn counters(&self) -> CycleCounters {
        self.counters
    }

    pub fn timing_for(&self, stage: &str) -> Option<StageTiming> {
        self.timings.get(stage).copied()
    }

    /// Returns the formatted summary string, or `None` if no cycle ran.
    pub fn summary_string(&self) -> Option<String> {
        let c = self.counters;
        if c.cycles == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = Vec::new();
        lines.push(format!(
            "Recognition summary ({} cycles, {:.1}s):",
            c.cycles,
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let timing = self.timings[stage];
            let avg_ms = timing.average_ms();
            let total_ms = timing.total_ms;
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        lines.push(format!(
            "  granted {}, denied {}, camera errors {}, recognition errors {}, publish failures {}",
            c.granted, c.denied, c.camera_errors, c.recognition_errors, c.publish_failures
        ));

        if elapsed_ms > 0.0 {
            let rate = c.cycles as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Rate: {rate:.1} cycles/s"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StatsCycleLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl CycleLogger for StatsCycleLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        let timing = self.timings.entry(stage.to_string()).or_default();
        timing.count += 1;
        timing.total_ms += duration_ms;
    }

    fn outcome(&mut self, outcome: &CycleOutcome) {
        let c = &mut self.counters;
        c.cycles += 1;
        match outcome {
            CycleOutcome::Decided { decision, published } => {
                if decision.is_granted() {
                    c.granted += 1;
                } else {
                    c.denied += 1;
                }
                if !published {
                    c.publish_failures += 1;
                }
            }
            CycleOutcome::CameraError => c.camera_errors += 1,
            CycleOutcome::RecognitionFailed => c.recognition_errors += 1,
        }
        if c.cycles % self.throttle_cycles == 0 {
            log::info!(
                "{} cycles: {} granted, {} denied",
                c.cycles,
                c.granted,
                c.denied
            );
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }

    fn reset(&mut self) {
        self.timings.clear();
        self.counters = CycleCounters::default();
        self.start_time = Instant::now();
    }
}
