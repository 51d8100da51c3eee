//! Permission request coordination.
//!
//! Turns a trigger stream plus a list of capability names into a stream of
//! [`Permission`] results while guaranteeing that a capability is never
//! prompted for twice concurrently:
//! - [`PendingRegistry`] tracks capabilities with an outstanding prompt
//! - [`PermissionCoordinator`] deduplicates, dispatches and re-orders results
//! - [`combinators`] reduce a batch into a bool, per-item records, or one
//!   combined record

pub mod combinators;
pub mod coordinator;
pub mod host;
pub mod pending;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use combinators::{ensure, ensure_each, ensure_each_combined};
pub use coordinator::{BoxStream, PermissionCoordinator, PermissionStream, ReadySource};
pub use host::{PermissionHost, PlatformGate};
pub use pending::{PendingRegistry, PendingResult};
pub use permgate_core::{Error, Permission, Result};
