mod backend;
mod backends;
pub mod labels;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::{StubBackend, StubStep};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use registry::{registry_from_settings, BackendRegistry, SharedBackend};
pub use result::{BoundingBox, Detection};
