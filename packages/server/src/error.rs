//! Server startup errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::infrastructure::SeedError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to load seed file {}: {source}", path.display())]
    Seed {
        path: PathBuf,
        #[source]
        source: SeedError,
    },

    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
