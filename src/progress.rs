// src/progress.rs
//! Cosmetic progress animation shown while a video generates. The stage
//! table is fixed and has nothing to do with real backend progress; the
//! displayed percentage creeps toward each stage target, dwells, then
//! advances. Real job state arrives only through the poller, which
//! force-completes or aborts this animation.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// One row of the animation table.
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    pub progress: u8,
    pub label: &'static str,
    pub status: &'static str,
    pub eta: &'static str,
}

pub const STAGES: [Stage; 7] = [
    Stage { progress: 15, label: "Analyzing video concept...", status: "AI analyzing requirements", eta: "8-10 min" },
    Stage { progress: 30, label: "Generating scene layouts...", status: "Creating visual composition", eta: "6-8 min" },
    Stage { progress: 45, label: "Rendering character animations...", status: "AI crafting character movements", eta: "5-7 min" },
    Stage { progress: 60, label: "Processing video frames...", status: "Rendering high-quality frames", eta: "4-6 min" },
    Stage { progress: 75, label: "Adding visual effects...", status: "Applying AI enhancements", eta: "3-4 min" },
    Stage { progress: 88, label: "Encoding final video...", status: "Finalizing video output", eta: "1-2 min" },
    Stage { progress: 95, label: "Almost ready...", status: "Final optimizations", eta: "< 1 min" },
];

const TICK: Duration = Duration::from_millis(200);
const STAGE_DWELL: Duration = Duration::from_millis(3000);
const STEP: f64 = 0.5;

/// What the progress UI renders right now.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressFrame {
    pub percent: u8,
    pub label: String,
    pub status: String,
    pub eta: String,
}

impl ProgressFrame {
    fn at(percent: u8, stage: &Stage) -> Self {
        Self {
            percent,
            label: stage.label.to_string(),
            status: stage.status.to_string(),
            eta: stage.eta.to_string(),
        }
    }

    fn idle() -> Self {
        Self {
            percent: 0,
            label: String::new(),
            status: String::new(),
            eta: String::new(),
        }
    }

    fn finished() -> Self {
        Self {
            percent: 100,
            label: "Video generation complete!".to_string(),
            status: "Ready for preview".to_string(),
            eta: "Complete".to_string(),
        }
    }
}

/// Driver for the fake progress bar. `start` restarts the animation from
/// zero; `complete` snaps it to the finished frame; `abort` just stops it
/// (the failure path reverts to the form instead).
pub struct ProgressSimulator {
    frames: watch::Sender<ProgressFrame>,
    running: Mutex<Option<CancellationToken>>,
}

impl ProgressSimulator {
    pub fn new() -> (Self, watch::Receiver<ProgressFrame>) {
        let (frames, rx) = watch::channel(ProgressFrame::idle());
        (
            Self {
                frames,
                running: Mutex::new(None),
            },
            rx,
        )
    }

    fn cancel_running(&self) {
        if let Some(token) = self.running.lock().unwrap().take() {
            token.cancel();
        }
    }

    pub fn start(&self) {
        self.cancel_running();
        let cancel = CancellationToken::new();
        *self.running.lock().unwrap() = Some(cancel.clone());

        let frames = self.frames.clone();
        tokio::spawn(async move {
            let mut percent: f64 = 0.0;
            let _ = frames.send(ProgressFrame::at(0, &STAGES[0]));

            for stage in STAGES.iter() {
                let target = f64::from(stage.progress);
                while percent < target {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(TICK) => {}
                    }
                    // The tick can win the select in the same instant the
                    // token fires. No frames after cancellation.
                    if cancel.is_cancelled() {
                        return;
                    }
                    percent += STEP;
                    let _ = frames.send(ProgressFrame::at(percent.floor() as u8, stage));
                }
                // Hold at the stage target before moving to the next one.
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(STAGE_DWELL) => {}
                }
            }
            // Parked at 95%; only the poller can finish or abort from here.
        });
    }

    /// Snap to 100% on the real completion signal.
    pub fn complete(&self) {
        self.cancel_running();
        let _ = self.frames.send(ProgressFrame::finished());
    }

    /// Stop the animation without a completion frame.
    pub fn abort(&self) {
        self.cancel_running();
    }
}
