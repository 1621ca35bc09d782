use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Error, Result};

use super::backend::DetectorBackend;
use super::backends::StubBackend;

/// Detector backends selectable from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Stub,
    Tract,
}

impl BackendKind {
    /// Whether the backend needs a model file on disk.
    pub fn needs_model(self) -> bool {
        matches!(self, BackendKind::Tract)
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(BackendKind::Stub),
            "tract" | "onnx" => Ok(BackendKind::Tract),
            other => Err(anyhow!("unknown detector backend '{}'", other)),
        }
    }
}

/// Construct and warm up the configured backend.
pub fn build_backend(
    kind: BackendKind,
    model_path: &Path,
    input_size: u32,
) -> Result<Box<dyn DetectorBackend>> {
    let mut backend: Box<dyn DetectorBackend> = match kind {
        BackendKind::Stub => Box::new(StubBackend::new()),
        BackendKind::Tract => tract_backend(model_path, input_size)?,
    };
    backend.warm_up()?;
    log::info!("detector backend '{}' ready", backend.name());
    Ok(backend)
}

#[cfg(feature = "backend-tract")]
fn tract_backend(model_path: &Path, input_size: u32) -> Result<Box<dyn DetectorBackend>> {
    Ok(Box::new(super::backends::TractBackend::new(
        model_path, input_size,
    )?))
}

#[cfg(not(feature = "backend-tract"))]
fn tract_backend(model_path: &Path, _input_size: u32) -> Result<Box<dyn DetectorBackend>> {
    Err(anyhow!(
        "model {} requires the backend-tract feature",
        model_path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_names() {
        assert_eq!("stub".parse::<BackendKind>().unwrap(), BackendKind::Stub);
        assert_eq!("ONNX".parse::<BackendKind>().unwrap(), BackendKind::Tract);
        assert!("cuda".parse::<BackendKind>().is_err());
    }

    #[test]
    fn builds_stub_backend() -> Result<()> {
        let backend = build_backend(BackendKind::Stub, Path::new("unused.onnx"), 640)?;
        assert_eq!(backend.name(), "stub");
        Ok(())
    }
}
