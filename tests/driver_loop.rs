//! End-to-end runs of the light loop against scripted scenes and a stepping clock.

use std::cell::Cell;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeZone};

use presence_light::ingest::{SyntheticConfig, SyntheticSource};
use presence_light::{
    run, Chime, Clock, Collaborators, DetectionResult, DetectorBackend, Display, Frame,
    FrameSource, Journal, LightEvent, PresenceFilter, RoomState, RunLimits, StatusView,
    StopReason, StubBackend,
};

/// Advances by `step` every time the driver asks for the time.
struct SteppingClock {
    start: Instant,
    wall_start: DateTime<Local>,
    step: Duration,
    ticks: Cell<u32>,
    last: Cell<Duration>,
}

impl SteppingClock {
    fn new(step: Duration) -> Self {
        Self {
            start: Instant::now(),
            wall_start: Local
                .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .expect("unambiguous local time"),
            step,
            ticks: Cell::new(0),
            last: Cell::new(Duration::ZERO),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Instant {
        let offset = self.step * self.ticks.get();
        self.ticks.set(self.ticks.get() + 1);
        self.last.set(offset);
        self.start + offset
    }

    fn wall(&self) -> DateTime<Local> {
        self.wall_start + chrono::Duration::from_std(self.last.get()).expect("small offset")
    }
}

#[derive(Default)]
struct RecordingChime(Vec<LightEvent>);

impl Chime for RecordingChime {
    fn play(&mut self, event: LightEvent) {
        self.0.push(event);
    }
}

#[derive(Default)]
struct RecordingDisplay {
    views: Vec<StatusView>,
    finished: bool,
}

impl Display for RecordingDisplay {
    fn render(&mut self, view: &StatusView) -> Result<()> {
        self.views.push(view.clone());
        Ok(())
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

fn scene(script: &[bool]) -> SyntheticSource {
    SyntheticSource::scripted(
        SyntheticConfig {
            width: 80,
            height: 60,
            ..SyntheticConfig::default()
        },
        script.to_vec(),
    )
}

struct Harness {
    _dir: tempfile::TempDir,
    journal: Journal,
    chime: RecordingChime,
    display: RecordingDisplay,
}

impl Harness {
    fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let journal = Journal::open(dir.path().join("room_log.txt"))?;
        Ok(Self {
            _dir: dir,
            journal,
            chime: RecordingChime::default(),
            display: RecordingDisplay::default(),
        })
    }

    fn run(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn DetectorBackend,
        clock: &SteppingClock,
        limits: RunLimits,
        quit: &AtomicBool,
    ) -> Result<presence_light::RunSummary> {
        run(
            Collaborators {
                source,
                detector,
                filter: PresenceFilter::default(),
                clock,
                journal: &mut self.journal,
                chime: &mut self.chime,
                displays: vec![&mut self.display as &mut dyn Display],
            },
            RoomState::new(Duration::from_secs(5)),
            limits,
            quit,
        )
    }

    fn log_contents(&self) -> Result<String> {
        Ok(std::fs::read_to_string(self.journal.path())?)
    }
}

#[test]
fn person_walks_in_and_leaves() -> Result<()> {
    let mut harness = Harness::new()?;
    let mut source = scene(&[true, false, false, false, false, false, false]);
    let mut detector = StubBackend::new();
    let clock = SteppingClock::new(Duration::from_secs(1));

    let summary = harness.run(
        &mut source,
        &mut detector,
        &clock,
        RunLimits::default(),
        &AtomicBool::new(false),
    )?;

    assert_eq!(summary.stop, StopReason::EndOfStream);
    assert_eq!(summary.frames, 7);
    assert_eq!(summary.transitions, vec![LightEvent::On, LightEvent::Off]);
    assert!(!summary.final_state.is_on());
    assert_eq!(harness.chime.0, vec![LightEvent::On, LightEvent::Off]);

    assert_eq!(
        harness.log_contents()?,
        "[2024-05-01 12:00:00] Light State: ON\n[2024-05-01 12:00:06] Light State: OFF\n"
    );

    // Startup view, then one per frame.
    let countdowns: Vec<Option<u64>> = harness.display.views[1..]
        .iter()
        .map(|v| v.countdown_secs)
        .collect();
    assert_eq!(
        countdowns,
        vec![None, Some(4), Some(3), Some(2), Some(1), Some(0), None]
    );
    let lit: Vec<bool> = harness.display.views.iter().map(|v| v.light_on).collect();
    assert_eq!(lit, vec![false, true, true, true, true, true, true, false]);
    assert_eq!(harness.display.views[1].subjects, 1);
    assert!(harness.display.finished);
    Ok(())
}

#[test]
fn steady_presence_logs_a_single_transition() -> Result<()> {
    let mut harness = Harness::new()?;
    let mut source = scene(&[true; 12]);
    let mut detector = StubBackend::new();
    let clock = SteppingClock::new(Duration::from_millis(500));

    let summary = harness.run(
        &mut source,
        &mut detector,
        &clock,
        RunLimits::default(),
        &AtomicBool::new(false),
    )?;

    assert_eq!(summary.transitions, vec![LightEvent::On]);
    assert!(summary.final_state.is_on());
    assert_eq!(harness.log_contents()?.lines().count(), 1);
    Ok(())
}

#[test]
fn quit_flag_stops_before_capture() -> Result<()> {
    let mut harness = Harness::new()?;
    let mut source = scene(&[true, true]);
    let mut detector = StubBackend::new();
    let clock = SteppingClock::new(Duration::from_secs(1));

    let summary = harness.run(
        &mut source,
        &mut detector,
        &clock,
        RunLimits::default(),
        &AtomicBool::new(true),
    )?;

    assert_eq!(summary.stop, StopReason::QuitRequested);
    assert_eq!(summary.frames, 0);
    assert_eq!(source.frames_captured(), 0);
    assert!(harness.log_contents()?.is_empty());
    Ok(())
}

#[test]
fn frame_limit_bounds_endless_scene() -> Result<()> {
    let mut harness = Harness::new()?;
    let mut source = SyntheticSource::new(SyntheticConfig {
        width: 80,
        height: 60,
        present_frames: 3,
        absent_frames: 10,
        ..SyntheticConfig::default()
    });
    let mut detector = StubBackend::new();
    let clock = SteppingClock::new(Duration::from_secs(1));

    let summary = harness.run(
        &mut source,
        &mut detector,
        &clock,
        RunLimits {
            max_frames: Some(20),
            frame_interval: None,
        },
        &AtomicBool::new(false),
    )?;

    // On at 0, last seen at 2, off at 8 (6s > 5s), on again at 13.
    assert_eq!(summary.stop, StopReason::FrameLimit);
    assert_eq!(summary.frames, 20);
    assert_eq!(
        summary.transitions,
        vec![LightEvent::On, LightEvent::Off, LightEvent::On]
    );
    Ok(())
}

/// Yields `good` frames, then fails.
struct FlakySource {
    good: u64,
    captured: u64,
}

impl FrameSource for FlakySource {
    fn describe(&self) -> String {
        "flaky".to_string()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.captured >= self.good {
            return Err(anyhow!("device unplugged"));
        }
        self.captured += 1;
        let mut pixels = vec![255u8; 8 * 8 * 3];
        pixels[0] = 0;
        Frame::from_rgb(pixels, 8, 8, self.captured).map(Some)
    }

    fn frames_captured(&self) -> u64 {
        self.captured
    }
}

#[test]
fn capture_failure_ends_run_gracefully() -> Result<()> {
    let mut harness = Harness::new()?;
    let mut source = FlakySource {
        good: 2,
        captured: 0,
    };
    let mut detector = StubBackend::new();
    let clock = SteppingClock::new(Duration::from_secs(1));

    let summary = harness.run(
        &mut source,
        &mut detector,
        &clock,
        RunLimits::default(),
        &AtomicBool::new(false),
    )?;

    assert_eq!(summary.stop, StopReason::CaptureFailed);
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.transitions, vec![LightEvent::On]);
    Ok(())
}

struct BrokenDetector;

impl DetectorBackend for BrokenDetector {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<DetectionResult> {
        Err(anyhow!("inference failed"))
    }
}

#[test]
fn detector_errors_count_as_absence() -> Result<()> {
    let mut harness = Harness::new()?;
    let mut source = scene(&[true, true, true]);
    let mut detector = BrokenDetector;
    let clock = SteppingClock::new(Duration::from_secs(1));

    let summary = harness.run(
        &mut source,
        &mut detector,
        &clock,
        RunLimits::default(),
        &AtomicBool::new(false),
    )?;

    assert_eq!(summary.frames, 3);
    assert!(summary.transitions.is_empty());
    assert!(harness.chime.0.is_empty());
    Ok(())
}
