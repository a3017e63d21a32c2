// Error taxonomy for the framework
//
// Construction and mount-point errors are fatal and surface at startup.
// Everything that can fail during normal operation (store writes, storage
// access) is reported through Result values; lifecycle errors inside
// mount/unmount are contained at the component boundary and never reach
// callers as errors.

use std::fmt;

/// Errors raised while wiring components and the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameworkError {
    /// Component constructed over something that is not a render target
    /// (e.g. a text node)
    InvalidContainer(String),
    /// Event binding against an invalid target
    InvalidBinding(String),
    /// No application root in the document at router construction time
    MountPointNotFound,
}

impl fmt::Display for FrameworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidContainer(msg) => write!(f, "Invalid container: {}", msg),
            Self::InvalidBinding(msg) => write!(f, "Invalid event binding: {}", msg),
            Self::MountPointNotFound => write!(f, "Application mount point not found"),
        }
    }
}

impl std::error::Error for FrameworkError {}

/// Errors from the host key-value storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Reading the persisted snapshot failed
    Read(String),
    /// Writing the snapshot failed; the associated mutation is not committed
    Write(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(msg) => write!(f, "Storage read failed: {}", msg),
            Self::Write(msg) => write!(f, "Storage write failed: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Errors from store mutations
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Store used before `init`
    Uninitialized,
    /// State keys must be non-empty strings
    InvalidKey(String),
    /// Value outside the representable set (non-finite numbers)
    InvalidValue(String),
    /// Persistence failed; the in-memory state was left unchanged
    Persistence(PersistenceError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Store has not been initialized"),
            Self::InvalidKey(key) => write!(f, "Invalid state key: {:?}", key),
            Self::InvalidValue(msg) => write!(f, "Invalid state value: {}", msg),
            Self::Persistence(err) => write!(f, "State not committed: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}
