mod backend;
mod backends;
mod presence;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use presence::{PresenceFilter, DEFAULT_THRESHOLD};
pub use registry::{build_backend, BackendKind};
pub use result::{Detection, DetectionResult, ObjectClass};
