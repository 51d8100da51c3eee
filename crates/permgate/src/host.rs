//! Host collaborator contract and platform version gating.

use std::sync::Arc;

use permgate_core::Config;
use permgate_core::config::PlatformConfig;

/// The component that owns the real permission prompt.
///
/// Implementations answer platform queries synchronously and issue prompts
/// fire-and-forget. Every name passed to [`dispatch_prompt`] must eventually
/// be reported back through
/// [`PermissionCoordinator::on_prompt_result`](crate::PermissionCoordinator::on_prompt_result),
/// otherwise requests waiting on it never complete.
///
/// [`dispatch_prompt`]: PermissionHost::dispatch_prompt
pub trait PermissionHost: Send + Sync {
    /// Whether the platform already holds a grant for `name`.
    fn is_granted(&self, name: &str) -> bool;

    /// Whether `name` has been revoked by a policy.
    fn is_revoked(&self, name: &str) -> bool;

    /// Whether the user should see an explanation before being asked.
    fn should_show_rationale(&self, name: &str) -> bool;

    /// Ask the user for every capability in `names` with a single prompt.
    fn dispatch_prompt(&self, names: Vec<String>);
}

/// Host wrapper that applies platform version gating.
///
/// Below the gating threshold capabilities are not gated at run time, so
/// every name counts as granted and none as revoked.
#[derive(Clone)]
pub struct PlatformGate {
    host: Arc<dyn PermissionHost>,
    platform: PlatformConfig,
}

impl PlatformGate {
    pub fn new(host: Arc<dyn PermissionHost>, platform: PlatformConfig) -> Self {
        Self { host, platform }
    }

    pub fn from_config(host: Arc<dyn PermissionHost>, config: &Config) -> Self {
        Self::new(host, config.platform.clone())
    }

    pub const fn is_gated(&self) -> bool {
        self.platform.is_gated()
    }

    pub fn is_granted(&self, name: &str) -> bool {
        !self.is_gated() || self.host.is_granted(name)
    }

    pub fn is_revoked(&self, name: &str) -> bool {
        self.is_gated() && self.host.is_revoked(name)
    }

    pub fn should_show_rationale(&self, name: &str) -> bool {
        self.is_gated() && self.host.should_show_rationale(name)
    }

    pub fn dispatch_prompt(&self, names: Vec<String>) {
        self.host.dispatch_prompt(names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingHost;

    fn platform(api_level: u32) -> PlatformConfig {
        PlatformConfig {
            api_level,
            gating_threshold: 23,
        }
    }

    #[test]
    fn ungated_platform_grants_everything() {
        let (host, _rx) = RecordingHost::with_receiver();
        host.revoke("camera");
        let gate = PlatformGate::new(host, platform(22));

        assert!(gate.is_granted("camera"));
        assert!(!gate.is_revoked("camera"));
        assert!(!gate.should_show_rationale("camera"));
    }

    #[test]
    fn gated_platform_asks_host() {
        let (host, _rx) = RecordingHost::with_receiver();
        host.grant("location");
        host.revoke("camera");
        let gate = PlatformGate::new(host, platform(23));

        assert!(gate.is_granted("location"));
        assert!(!gate.is_granted("camera"));
        assert!(gate.is_revoked("camera"));
    }
}
