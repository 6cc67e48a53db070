// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use hook_env::{EnvError, Environment};

use crate::env_const::{
    DEFAULT_PUBLIC_HOST, WEBHOOK_ENABLE_SSL, WEBHOOK_PLUGINS, WEBHOOK_PUBLIC_HOST,
};

/// Discovers the public host name. Called lazily, at most once per execution context.
pub type HostResolver = Arc<dyn Fn() -> String + Send + Sync>;

/// Process-wide settings consumed when building execution contexts.
///
/// Materialized once (typically with [`PayloadSettings::from_env`]) and then shared read-only.
#[derive(Clone)]
pub struct PayloadSettings {
    /// Service-capability plugins made available to resolvers.
    pub enabled_plugins: Vec<String>,
    /// Whether the public endpoint is served over HTTPS.
    pub enable_ssl: bool,
    pub host_resolver: HostResolver,
}

impl PayloadSettings {
    pub fn new(enabled_plugins: Vec<String>, enable_ssl: bool, host_resolver: HostResolver) -> Self {
        Self {
            enabled_plugins,
            enable_ssl,
            host_resolver,
        }
    }

    pub fn from_env(env: Arc<dyn Environment>) -> Result<Self, EnvError> {
        let enabled_plugins = env.get_list(WEBHOOK_PLUGINS, vec![]);
        let enable_ssl = env.enabled(WEBHOOK_ENABLE_SSL, false)?;

        let host_resolver: HostResolver =
            Arc::new(move || env.get_or_else(WEBHOOK_PUBLIC_HOST, DEFAULT_PUBLIC_HOST));

        Ok(Self::new(enabled_plugins, enable_ssl, host_resolver))
    }

    pub fn with_host_resolver(self, host_resolver: HostResolver) -> Self {
        Self {
            host_resolver,
            ..self
        }
    }
}

impl Debug for PayloadSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadSettings")
            .field("enabled_plugins", &self.enabled_plugins)
            .field("enable_ssl", &self.enable_ssl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use hook_env::MapEnvironment;

    use super::*;

    #[test]
    fn defaults() {
        let settings = PayloadSettings::from_env(Arc::new(MapEnvironment::new())).unwrap();

        assert!(settings.enabled_plugins.is_empty());
        assert!(!settings.enable_ssl);
        assert_eq!((settings.host_resolver)(), "localhost");
    }

    #[test]
    fn configured() {
        let env = MapEnvironment::from([
            (WEBHOOK_PLUGINS, "webhooks,invoicing"),
            (WEBHOOK_ENABLE_SSL, "true"),
            (WEBHOOK_PUBLIC_HOST, "shop.example.com"),
        ]);
        let settings = PayloadSettings::from_env(Arc::new(env)).unwrap();

        assert_eq!(settings.enabled_plugins, vec!["webhooks", "invoicing"]);
        assert!(settings.enable_ssl);
        assert_eq!((settings.host_resolver)(), "shop.example.com");
    }

    #[test]
    fn replaced_host_resolver() {
        let env = MapEnvironment::from([
            (WEBHOOK_PLUGINS, "webhooks"),
            (WEBHOOK_PUBLIC_HOST, "shop.example.com"),
        ]);
        let settings = PayloadSettings::from_env(Arc::new(env))
            .unwrap()
            .with_host_resolver(Arc::new(|| "tenant.example.com".to_string()));

        assert_eq!((settings.host_resolver)(), "tenant.example.com");
        assert_eq!(settings.enabled_plugins, vec!["webhooks"]);
    }

    #[test]
    fn invalid_ssl_flag() {
        let env = MapEnvironment::from([(WEBHOOK_ENABLE_SSL, "sometimes")]);

        assert!(PayloadSettings::from_env(Arc::new(env)).is_err());
    }
}
