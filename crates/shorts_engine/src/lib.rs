//! Shorts engine: backend client and effect execution.
mod backend;
mod engine;
mod persist;
mod poller;
mod settings;
mod submit;
mod types;
mod wire;

pub use backend::{Backend, ReqwestBackend};
pub use engine::Engine;
pub use persist::{
    artifact_filename, ensure_output_dir, save_artifact, AtomicFileWriter, PersistError,
    SavedArtifact,
};
pub use poller::{poll_once, PollTimer};
pub use settings::{BackendSettings, EngineSettings, Endpoints};
pub use submit::{JobSubmitter, SubmitError};
pub use types::{BackendError, FailureKind};
