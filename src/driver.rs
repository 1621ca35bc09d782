//! Per-frame control loop.
//!
//! Each iteration:
//! 1. Checks the quit flag
//! 2. Captures a frame (end of stream or capture error ends the run)
//! 3. Runs the detector and reduces the result to a presence bit
//! 4. Steps the debouncer
//! 5. On a transition: appends to the journal, then plays the chime
//! 6. Renders the status view on every display
//!
//! All collaborators are injected, so the loop runs unchanged against a
//! scripted source and a manual clock in tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;

use crate::chime::Chime;
use crate::clock::Clock;
use crate::debounce::{LightEvent, RoomState};
use crate::detect::{DetectorBackend, PresenceFilter};
use crate::display::{Display, StatusView};
use crate::ingest::FrameSource;
use crate::journal::Journal;

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    QuitRequested,
    EndOfStream,
    CaptureFailed,
    FrameLimit,
}

/// Totals for a finished run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub frames: u64,
    pub transitions: Vec<LightEvent>,
    pub final_state: RoomState,
    pub stop: StopReason,
}

/// Pacing and limits for a run.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunLimits {
    /// Stop after this many processed frames.
    pub max_frames: Option<u64>,
    /// Sleep between frames; sources that block on capture need none.
    pub frame_interval: Option<Duration>,
}

/// Everything the loop talks to.
pub struct Collaborators<'a, C: Clock> {
    pub source: &'a mut dyn FrameSource,
    pub detector: &'a mut dyn DetectorBackend,
    pub filter: PresenceFilter,
    pub clock: &'a C,
    pub journal: &'a mut Journal,
    pub chime: &'a mut dyn Chime,
    pub displays: Vec<&'a mut dyn Display>,
}

/// Run until quit, end of stream, capture failure or the frame limit.
///
/// Journal write failures are returned as errors. Detector and display
/// failures only affect the current frame.
pub fn run<C: Clock>(
    mut io: Collaborators<'_, C>,
    initial: RoomState,
    limits: RunLimits,
    quit: &AtomicBool,
) -> Result<RunSummary> {
    let mut state = initial;
    let mut frames = 0u64;
    let mut transitions = Vec::new();

    for display in io.displays.iter_mut() {
        render(&mut **display, &idle_view(&state));
    }

    let stop = loop {
        if quit.load(Ordering::SeqCst) {
            break StopReason::QuitRequested;
        }
        if limits.max_frames.is_some_and(|max| frames >= max) {
            break StopReason::FrameLimit;
        }

        let frame = match io.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("source {} ended", io.source.describe());
                break StopReason::EndOfStream;
            }
            Err(e) => {
                log::warn!("frame capture from {} failed: {:#}", io.source.describe(), e);
                break StopReason::CaptureFailed;
            }
        };
        frames += 1;

        let subjects = match frame.run_detector(io.detector) {
            Ok(result) => io.filter.count(&result),
            Err(e) => {
                log::warn!(
                    "detector {} failed on frame {}: {:#}",
                    io.detector.name(),
                    frame.sequence,
                    e
                );
                0
            }
        };
        drop(frame);
        let detected = subjects > 0;

        let now = io.clock.now();
        let (next, event) = state.step(detected, now);
        state = next;

        if let Some(event) = event {
            io.journal.record(event, &io.clock.wall())?;
            io.chime.play(event);
            transitions.push(event);
            log::info!(
                "light {} (frame {}, {} subject(s) in view)",
                event,
                frames,
                subjects
            );
        }

        let view = StatusView {
            light_on: state.is_on(),
            countdown_secs: state.countdown_secs(detected, now),
            subjects,
        };
        log::trace!("frame {}: {}", frames, view.overlay_line());
        for display in io.displays.iter_mut() {
            render(&mut **display, &view);
        }

        if let Some(interval) = limits.frame_interval {
            std::thread::sleep(interval);
        }
    };

    for display in io.displays.iter_mut() {
        display.finish();
    }

    log::info!(
        "stopped ({:?}) after {} frames, {} transitions, light {}",
        stop,
        frames,
        transitions.len(),
        if state.is_on() { "on" } else { "off" }
    );

    Ok(RunSummary {
        frames,
        transitions,
        final_state: state,
        stop,
    })
}

fn idle_view(state: &RoomState) -> StatusView {
    StatusView {
        light_on: state.is_on(),
        countdown_secs: None,
        subjects: 0,
    }
}

fn render(display: &mut dyn Display, view: &StatusView) {
    if let Err(e) = display.render(view) {
        log::warn!("display update failed: {:#}", e);
    }
}
