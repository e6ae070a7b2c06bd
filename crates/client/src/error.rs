//! Client runtime errors.
//!
//! Resolution and session failures never surface here; they are absorbed
//! into store state. Only cart operations and startup can fail.

use storehost_platform::PlatformError;
use thiserror::Error;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// A quantity that cannot be added.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The platform rejected or failed the call.
    #[error("cart request failed: {0}")]
    Platform(#[from] PlatformError),
}

/// Errors that abort client startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The page has no element to mount the app into.
    #[error("mount point #{0} not found")]
    MissingMountPoint(&'static str),
}
