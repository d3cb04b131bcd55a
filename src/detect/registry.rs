use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::config::DetectionSettings;
use crate::detect::backends::StubBackend;

use super::backend::DetectorBackend;

/// Shared handle to a registered backend.
pub type SharedBackend = Arc<Mutex<dyn DetectorBackend>>;

/// Named detector backends with one default.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect` takes `&mut self`.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, SharedBackend>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend. The first registered backend becomes the default;
    /// a later one with the same name replaces it.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        log::debug!("registered detector backend '{}'", name);
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// The backend detection cycles run against.
    pub fn default_backend(&self) -> Result<SharedBackend> {
        let name = self
            .default_name
            .as_deref()
            .ok_or_else(|| anyhow!("no detector backend registered"))?;
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("backend '{}' not registered", name))
    }
}

/// Build the registry described by the daemon configuration.
///
/// The demo stub is always registered; `tract` registers the ONNX backend,
/// warms it up and makes it the default.
#[cfg_attr(not(feature = "backend-tract"), allow(unused_variables))]
pub fn registry_from_settings(
    settings: &DetectionSettings,
    width: u32,
    height: u32,
) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::demo()?);
    match settings.backend.as_str() {
        "stub" => {}
        #[cfg(feature = "backend-tract")]
        "tract" => {
            use crate::detect::backends::TractBackend;

            let path = settings
                .model_path
                .as_ref()
                .ok_or_else(|| anyhow!("the tract backend requires a model path"))?;
            let mut backend = TractBackend::new(path, width, height)?;
            backend.warm_up()?;
            registry.register(backend);
            registry.set_default("tract")?;
        }
        other => {
            return Err(anyhow!(
                "detector backend '{}' is not available in this build",
                other
            ))
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::{BoundingBox, Detection};
    use crate::frame::RawFrame;

    struct Silent;

    impl DetectorBackend for Silent {
        fn name(&self) -> &'static str {
            "silent"
        }

        fn detect(&mut self, _frame: &RawFrame) -> Result<Vec<Detection>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn first_registered_backend_is_default_until_changed() {
        let mut registry = BackendRegistry::new();
        assert!(registry.default_backend().is_err());

        registry.register(Silent);
        let cup = Detection::new("cup", 0.9, BoundingBox::new(0.0, 0.0, 30.0, 30.0)).unwrap();
        registry.register(StubBackend::new().with_batch(vec![cup.clone()]));
        assert_eq!(registry.default_backend().unwrap().lock().unwrap().name(), "silent");

        assert!(registry.set_default("missing").is_err());
        registry.set_default("stub").unwrap();
        let backend = registry.default_backend().unwrap();
        let batch = backend.lock().unwrap().detect(&RawFrame::blank(8, 8)).unwrap();
        assert_eq!(batch, vec![cup]);
    }

    #[test]
    fn registry_from_settings_defaults_to_demo_stub() {
        let mut settings = DetectionSettings {
            interval: std::time::Duration::from_millis(500),
            backend: "stub".to_string(),
            model_path: None,
        };
        let registry = registry_from_settings(&settings, 640, 480).unwrap();
        let backend = registry.default_backend().unwrap();
        let batch = backend
            .lock()
            .unwrap()
            .detect(&RawFrame::blank(640, 480))
            .unwrap();
        assert!(!batch.is_empty());

        settings.backend = "yolo".to_string();
        assert!(registry_from_settings(&settings, 640, 480).is_err());
    }
}
