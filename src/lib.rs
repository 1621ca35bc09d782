//! Presence-driven virtual room light.
//!
//! Watches a camera, asks a detector whether a person is in view, and folds
//! that signal through a debounced two-state machine. The light turns on as
//! soon as someone is seen and off once nobody has been seen for longer than
//! the off delay. Every transition is appended to a text log, announced with a
//! sound and reflected on the room display.
//!
//! # Module Structure
//!
//! - `debounce`: `RoomState`, `LightEvent` and the transition function
//! - `detect`: detector backends and the presence filter
//! - `ingest`: frame sources (synthetic, image directory, V4L2)
//! - `driver`: the per-frame loop wiring everything together
//! - `journal`, `display`, `chime`: side effects of transitions
//! - `config`, `assets`, `ui`: startup

pub mod assets;
pub mod chime;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod detect;
pub mod display;
pub mod driver;
pub mod frame;
pub mod ingest;
pub mod journal;
pub mod ui;

pub use assets::{AssetSettings, RoomAssets};
pub use chime::{Chime, ChimeSettings, CommandChime, SilentChime};
pub use clock::{Clock, SystemClock};
pub use config::{DetectorSettings, PresenceConfig};
pub use debounce::{LightEvent, RoomState, DEFAULT_OFF_DELAY};
pub use detect::{
    build_backend, BackendKind, Detection, DetectionResult, DetectorBackend, ObjectClass,
    PresenceFilter, StubBackend,
};
pub use display::{Display, SnapshotDisplay, StatusLine, StatusView};
pub use driver::{run, Collaborators, RunLimits, RunSummary, StopReason};
pub use frame::Frame;
pub use ingest::{open_source, FrameSource, SourceSettings};
pub use journal::Journal;
