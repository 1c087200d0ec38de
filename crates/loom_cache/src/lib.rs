//! On-disk cache of compiled generated-model modules.
//!
//! [`CompilerService`] maps an output path to a compiled module. When the
//! path already exists it is returned as-is; otherwise the source is compiled
//! and published there. Population is serialized per path within a process
//! and made exclusive across processes by a no-clobber publish, and is only
//! attempted by the holder of the [`OwnershipLock`].

#![warn(missing_docs)]

pub mod error;
pub mod locks;
pub mod ownership;
pub mod service;

pub use error::{CacheError, OwnershipError};
pub use locks::PathLocks;
pub use ownership::{FileLease, OwnershipLock, SoleOwner};
pub use service::{CacheState, CompilerService};
