//! Errors of the build pipeline.

use thiserror::Error;

use dmc_core::{ConfigError, InternalError, RegistryError};

/// Why a build could not run to completion.
///
/// User mistakes in proc bodies are never a `BuildError`; they are collected
/// as diagnostics on the compiled unit.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

pub type Result<T> = std::result::Result<T, BuildError>;
