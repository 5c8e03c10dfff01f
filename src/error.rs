use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Failed to connect to the Docker daemon at {host}")]
    Connect {
        host: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("Malformed daemon response: {object} without `{field}`")]
    MissingField {
        object: &'static str,
        field: &'static str,
    },

    #[error("Failed to start layout program `{program}` (is Graphviz installed?)")]
    RendererUnavailable {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Layout program `{program}` failed ({status}): {stderr}")]
    RenderFailed {
        program: &'static str,
        status: ExitStatus,
        stderr: String,
    },
}
