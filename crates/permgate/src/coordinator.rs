//! Permission request coordinator.
//!
//! Turns a trigger stream and a list of capability names into an ordered
//! stream of [`Permission`] results. A capability with an outstanding prompt
//! is never prompted for again: later requests subscribe to the pending
//! result instead, and all capabilities that do need a prompt go to the host
//! in a single dispatch.

use std::pin::Pin;
use std::sync::Arc;

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

use permgate_core::{Config, Error, Permission, Result};

use crate::combinators;
use crate::host::{PermissionHost, PlatformGate};
use crate::pending::{PendingRegistry, PendingResult};

/// Ordered stream of per-capability results.
pub type PermissionStream = Pin<Box<dyn Stream<Item = Permission> + Send>>;

/// Boxed stream returned by the reducing combinators.
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// What released a request to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySource {
    /// The caller's trigger stream emitted.
    Trigger,
    /// None of the requested capabilities had an outstanding prompt.
    NothingPending,
}

/// Where a single capability's result comes from.
enum ResultSource {
    Resolved(Permission),
    Pending(PendingResult),
}

impl ResultSource {
    async fn into_permission(self) -> Option<Permission> {
        match self {
            Self::Resolved(permission) => Some(permission),
            Self::Pending(result) => result.wait().await,
        }
    }
}

/// Coordinates permission requests against a host and a shared registry.
#[derive(Clone)]
pub struct PermissionCoordinator {
    gate: PlatformGate,
    registry: PendingRegistry,
}

impl PermissionCoordinator {
    /// Create a coordinator over an already-configured gate.
    ///
    /// `registry` should be shared with every other coordinator talking to
    /// the same host so their requests dedup against each other.
    pub const fn new(gate: PlatformGate, registry: PendingRegistry) -> Self {
        Self { gate, registry }
    }

    pub fn from_config(
        host: Arc<dyn PermissionHost>,
        registry: PendingRegistry,
        config: &Config,
    ) -> Self {
        Self::new(PlatformGate::from_config(host, config), registry)
    }

    pub const fn registry(&self) -> &PendingRegistry {
        &self.registry
    }

    /// Request `names` once `trigger` emits, or straight away when none of
    /// them is already pending.
    ///
    /// The returned stream yields exactly one result per name, in input
    /// order, then completes. It ends early, without the remaining results,
    /// if the trigger finishes first while a request is pending or if a
    /// pending entry is dropped without a result.
    pub fn request<T, N>(&self, trigger: T, names: &[N]) -> Result<PermissionStream>
    where
        T: Stream + Send + 'static,
        N: AsRef<str>,
    {
        if names.is_empty() {
            return Err(Error::NoCapabilities);
        }
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        let this = self.clone();

        let stream = async_stream::stream! {
            let ready = match this.ready(trigger, &names).await {
                Some(ready) => ready,
                None => {
                    debug!(capabilities = ?names, "Trigger completed while a request was pending");
                    return;
                }
            };
            debug!(capabilities = ?names, source = ?ready, "Permission request ready");

            for source in this.resolve_sources(&names).await {
                match source.into_permission().await {
                    Some(permission) => yield permission,
                    None => {
                        debug!(capabilities = ?names, "Pending permission dropped without a result");
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    /// Ask now and emit `true` only if every capability is granted.
    pub fn request_granted<N: AsRef<str>>(&self, names: &[N]) -> Result<BoxStream<bool>> {
        combinators::ensure(self, tokio_stream::once(()), names)
    }

    /// Ask now and emit one result per capability.
    pub fn request_each<N: AsRef<str>>(&self, names: &[N]) -> Result<PermissionStream> {
        combinators::ensure_each(self, tokio_stream::once(()), names)
    }

    /// Ask now and emit a single combined result.
    pub fn request_each_combined<N: AsRef<str>>(
        &self,
        names: &[N],
    ) -> Result<BoxStream<Permission>> {
        combinators::ensure_each_combined(self, tokio_stream::once(()), names)
    }

    /// Report the host's answers for a dispatched prompt.
    ///
    /// `names` and `granted` correspond positionally. Returns how many
    /// pending entries were resolved.
    pub async fn on_prompt_result<N: AsRef<str>>(
        &self,
        names: &[N],
        granted: &[bool],
    ) -> Result<usize> {
        if names.len() != granted.len() {
            return Err(Error::ResultLengthMismatch {
                names: names.len(),
                results: granted.len(),
            });
        }

        let mut resolved = 0;
        for (name, &granted) in names.iter().zip(granted) {
            let name = name.as_ref();
            info!(capability = %name, granted, "Prompt result received");
            if self.registry.resolve(Permission::new(name, granted)).await {
                resolved += 1;
            }
        }
        Ok(resolved)
    }

    /// Whether the platform already holds a grant for `name`. Always true
    /// below the gating threshold.
    pub fn is_granted(&self, name: &str) -> bool {
        self.gate.is_granted(name)
    }

    /// Whether `name` was revoked by a policy. Always false below the gating
    /// threshold.
    pub fn is_revoked(&self, name: &str) -> bool {
        self.gate.is_revoked(name)
    }

    /// Whether the user should be shown a rationale before asking for
    /// `names`.
    ///
    /// True only if the host wants a rationale for every capability that is
    /// not already granted. Always false below the gating threshold.
    pub fn should_show_rationale<N: AsRef<str>>(&self, names: &[N]) -> Result<bool> {
        if names.is_empty() {
            return Err(Error::NoCapabilities);
        }
        if !self.gate.is_gated() {
            return Ok(false);
        }
        Ok(names.iter().all(|name| {
            let name = name.as_ref();
            self.gate.is_granted(name) || self.gate.should_show_rationale(name)
        }))
    }

    /// Wait for whichever fires first: the trigger, or the immediate signal
    /// emitted when nothing requested is already pending.
    async fn ready<T>(&self, trigger: T, names: &[String]) -> Option<ReadySource>
    where
        T: Stream + Send,
    {
        let nothing_pending = !self.registry.contains_any(names).await;
        let pending_check =
            tokio_stream::iter(nothing_pending.then_some(ReadySource::NothingPending));

        let ready = trigger.map(|_| ReadySource::Trigger).merge(pending_check);
        tokio::pin!(ready);
        ready.next().await
    }

    /// Pick a result source for every name, registering new pending entries
    /// and dispatching one prompt for all of them.
    async fn resolve_sources(&self, names: &[String]) -> Vec<ResultSource> {
        let mut sources = Vec::with_capacity(names.len());
        let mut unrequested = Vec::new();

        let mut pending = self.registry.lock().await;
        for name in names {
            if self.gate.is_granted(name) {
                debug!(capability = %name, "Already granted");
                sources.push(ResultSource::Resolved(Permission::new(name.as_str(), true)));
                continue;
            }

            if self.gate.is_revoked(name) {
                debug!(capability = %name, "Revoked by policy");
                sources.push(ResultSource::Resolved(Permission::new(name.as_str(), false)));
                continue;
            }

            let result = if let Some(result) = pending.subscribe(name) {
                debug!(capability = %name, "Joining pending request");
                result
            } else {
                unrequested.push(name.clone());
                pending.insert(name)
            };
            sources.push(ResultSource::Pending(result));
        }
        drop(pending);

        if !unrequested.is_empty() {
            info!(capabilities = %unrequested.join(", "), "Dispatching permission prompt");
            self.gate.dispatch_prompt(unrequested);
        }

        sources
    }
}
