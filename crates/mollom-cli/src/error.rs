//! CLI errors.

use mollom_client::{ConfigError, MollomError};
use thiserror::Error;

/// Why a command failed.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The service call failed.
    #[error(transparent)]
    Mollom(#[from] MollomError),

    /// The command needs the other API.
    #[error("`{command}` is only available over {transport}")]
    Unsupported {
        /// Command name.
        command: &'static str,
        /// API it requires.
        transport: &'static str,
    },

    /// Writing the result failed.
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),

    /// The result could not be rendered.
    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit status: 2 for usage and configuration problems, 1 for
    /// everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Unsupported { .. } => 2,
            Self::Mollom(MollomError::Config { .. }) => 2,
            Self::Mollom(_) | Self::Output(_) | Self::Render(_) => 1,
        }
    }
}
