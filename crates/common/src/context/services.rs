// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::future::Future;

use elsa::sync::FrozenMap;
use serde_json::Value;

/// Yields the identity of whoever triggered the event, if anyone.
pub type RequestorResolver = Box<dyn Fn() -> Option<String> + Send + Sync>;

/// Backend capabilities available to resolvers for the duration of one payload generation.
pub struct Services {
    enabled_plugins: Vec<String>,
    requestor_resolver: RequestorResolver,

    // cache of loaded values so that each key is loaded only once per context
    loader_cache: FrozenMap<String, Box<Value>>,
}

impl Services {
    pub fn new(enabled_plugins: Vec<String>, requestor_resolver: RequestorResolver) -> Self {
        Self {
            enabled_plugins,
            requestor_resolver,
            loader_cache: FrozenMap::new(),
        }
    }

    pub fn enabled_plugins(&self) -> &[String] {
        &self.enabled_plugins
    }

    pub fn is_plugin_enabled(&self, plugin: &str) -> bool {
        self.enabled_plugins.iter().any(|p| p == plugin)
    }

    pub fn requestor_identity(&self) -> Option<String> {
        (self.requestor_resolver)()
    }

    /// Load the value for `key`, reusing an earlier load of the same key.
    pub async fn load<F, Fut, E>(&self, key: &str, loader: F) -> Result<&Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.loader_cache.get(key) {
            return Ok(value);
        }

        let value = loader().await?;
        Ok(self.loader_cache.insert(key.to_string(), Box::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn loads_each_key_once() {
        let services = Services::new(vec!["tax".into()], Box::new(|| None));
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = services
                .load("product:1", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(json!({"name": "Shoe"}))
                })
                .await
                .unwrap();
            assert_eq!(value, &json!({"name": "Shoe"}));
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(services.enabled_plugins(), ["tax".to_string()]);
        assert!(services.is_plugin_enabled("tax"));
        assert!(!services.is_plugin_enabled("avatax"));
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let services = Services::new(vec![], Box::new(|| Some("user:1".into())));

        let failed = services.load("k", || async { Err("down") }).await;
        assert_eq!(failed, Err("down"));

        let loaded = services
            .load("k", || async { Ok::<_, &str>(json!(1)) })
            .await
            .unwrap();
        assert_eq!(loaded, &json!(1));
        assert_eq!(services.requestor_identity().as_deref(), Some("user:1"));
    }
}
