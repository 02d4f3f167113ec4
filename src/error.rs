use crate::config::ConfigError;
use thiserror::Error;

/// Errors at the pipeline boundary: reading sources, writing output tables.
///
/// The assembly, rollup and validation stages themselves never fail.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse source tables from '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {table}: {source}")]
    Serialize {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
