use std::path::PathBuf;

use thiserror::Error;

use crate::shaders::ShaderMarkerError;

/// Everything that can abort asset or level loading.
///
/// All of these are load-time configuration errors: the caller is expected to
/// stop startup rather than continue with a partially loaded scene.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to import model {path:?}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("model {path:?} has a primitive without {attribute} data")]
    MissingAttribute { path: PathBuf, attribute: &'static str },

    #[error("model {path:?} has a primitive without indices")]
    MissingIndices { path: PathBuf },

    #[error("model {path:?} contains no scene")]
    MissingScene { path: PathBuf },

    #[error("shader {path:?}: {source}")]
    ShaderMarker {
        path: PathBuf,
        #[source]
        source: ShaderMarkerError,
    },

    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("failed to link shader program: {0}")]
    ProgramLink(String),

    #[error("gpu object creation failed: {0}")]
    Gpu(String),

    #[error("failed to parse level {path:?}: {source}")]
    Level {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
