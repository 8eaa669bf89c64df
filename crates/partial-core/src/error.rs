use thiserror::Error;

use crate::path::Path;

/// Failure while following or rewriting a [`Path`] inside a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("no entry `{key}` while resolving `{path}`")]
    Missing { path: Path, key: String },
    #[error("`{at}` holds a plain value, so `{path}` cannot be assigned")]
    NotAScope { path: Path, at: Path },
    #[error("cannot assign at the root path")]
    EmptyPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartialError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("views already registered at `{path}`")]
    DuplicateRegistration { path: Path },
    #[error("no view `{name}` registered under `{path}`")]
    UnknownView { path: Path, name: String },
    #[error("no action `{name}` under `{path}`")]
    UnknownAction { path: Path, name: String },
    #[error("host application is no longer alive")]
    HostUnavailable,
}

pub type Result<T, E = PartialError> = std::result::Result<T, E>;
