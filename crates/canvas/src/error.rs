//! CLI error types.

use canvas_config::ConfigError;
use canvas_server::StartError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Start(#[from] StartError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
