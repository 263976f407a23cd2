//! Named limiter registry.
//!
//! A process typically runs one limiter per endpoint class (API, contact
//! form, auth, ...). The registry builds those instances from a
//! [`ThrottleProfiles`] configuration and hands them out by name. Instances
//! are fully independent; the registry is only a lookup table.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::config::ThrottleProfiles;
use crate::error::Result;

use super::limiter::WindowedRateLimiter;
use super::sweep::Sweepable;

/// Lookup table of named [`WindowedRateLimiter`] instances.
pub struct LimiterRegistry {
    limiters: DashMap<String, Arc<WindowedRateLimiter>>,
}

impl LimiterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            limiters: DashMap::new(),
        }
    }

    /// Build one limiter per configured profile.
    ///
    /// Fails if any profile's settings are invalid.
    pub fn from_profiles(profiles: &ThrottleProfiles) -> Result<Self> {
        let registry = Self::new();
        for (name, settings) in &profiles.profiles {
            let limiter = Arc::new(WindowedRateLimiter::new(*settings)?);
            info!(
                profile = %name,
                window_ms = settings.window_ms,
                max_requests = settings.max_requests,
                "Registered throttle profile"
            );
            registry.limiters.insert(name.clone(), limiter);
        }
        Ok(registry)
    }

    /// Register a limiter under a name, replacing any previous entry.
    pub fn insert(&self, name: impl Into<String>, limiter: Arc<WindowedRateLimiter>) {
        self.limiters.insert(name.into(), limiter);
    }

    /// Look up a limiter by profile name.
    pub fn get(&self, name: &str) -> Option<Arc<WindowedRateLimiter>> {
        self.limiters.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered limiters.
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Whether the registry holds no limiters.
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }

    /// All registered limiters as sweep targets for a shared [`Sweeper`].
    ///
    /// [`Sweeper`]: super::sweep::Sweeper
    pub fn sweepables(&self) -> Vec<Arc<dyn Sweepable>> {
        self.limiters
            .iter()
            .map(|entry| Arc::clone(entry.value()) as Arc<dyn Sweepable>)
            .collect()
    }
}

impl Default for LimiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_from_profiles() {
        let yaml = r#"
profiles:
  api:
    window_ms: 60000
    max_requests: 100
  contact:
    window_ms: 3600000
    max_requests: 5
"#;
        let profiles = ThrottleProfiles::from_yaml(yaml).unwrap();
        let registry = LimiterRegistry::from_profiles(&profiles).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("api").unwrap().settings().max_requests, 100);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_registry_profiles_are_independent() {
        let yaml = r#"
profiles:
  a:
    window_ms: 60000
    max_requests: 1
  b:
    window_ms: 60000
    max_requests: 1
"#;
        let profiles = ThrottleProfiles::from_yaml(yaml).unwrap();
        let registry = LimiterRegistry::from_profiles(&profiles).unwrap();

        let a = registry.get("a").unwrap();
        let b = registry.get("b").unwrap();

        assert!(a.limit("client").admitted);
        assert!(!a.limit("client").admitted);
        // Same identifier, different profile: unaffected.
        assert!(b.limit("client").admitted);
    }

    #[test]
    fn test_registry_sweepables() {
        let registry = LimiterRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.sweepables().is_empty());

        let limiter = Arc::new(
            WindowedRateLimiter::new(crate::config::LimiterSettings::new(1000, 3).unwrap())
                .unwrap(),
        );
        registry.insert("api", limiter);
        assert_eq!(registry.sweepables().len(), 1);
    }
}
