// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Resolvers compute the values of the fields a subscription selects.
//!
//! The root field is produced by a [`SubscriptionResolver`] from the event that fired, every other
//! field by a [`FieldResolver`] registered for its type (or, absent one, by reading the property of
//! the same name from the parent value).

mod access;
mod field_resolver;
mod field_value;
mod subscription_resolver;

use std::collections::HashMap;
use std::sync::Arc;

pub use access::ensure_app_permissions;
pub use field_resolver::{FieldResolver, PropertyResolver};
pub use field_value::{Deferred, FieldValue};
pub use subscription_resolver::{EventRoot, EventRootResolver, SubscriptionResolver};

/// The resolvers to use for a schema.
#[derive(Default, Clone)]
pub struct Resolvers {
    fields: HashMap<(String, String), Arc<dyn FieldResolver>>,
    subscriptions: HashMap<String, Arc<dyn SubscriptionResolver>>,
}

impl Resolvers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `field_name` of the object type `type_name` with `resolver`.
    pub fn with_field(
        mut self,
        type_name: &str,
        field_name: &str,
        resolver: impl FieldResolver + 'static,
    ) -> Self {
        self.fields.insert(
            (type_name.to_string(), field_name.to_string()),
            Arc::new(resolver),
        );
        self
    }

    /// Resolve the subscription field `field_name` with `resolver`.
    pub fn with_subscription(
        mut self,
        field_name: &str,
        resolver: impl SubscriptionResolver + 'static,
    ) -> Self {
        self.subscriptions
            .insert(field_name.to_string(), Arc::new(resolver));
        self
    }

    pub fn field_resolver(&self, type_name: &str, field_name: &str) -> &dyn FieldResolver {
        self.fields
            .get(&(type_name.to_string(), field_name.to_string()))
            .map(|resolver| resolver.as_ref())
            .unwrap_or(&PropertyResolver)
    }

    pub fn subscription_resolver(&self, field_name: &str) -> &dyn SubscriptionResolver {
        self.subscriptions
            .get(field_name)
            .map(|resolver| resolver.as_ref())
            .unwrap_or(&EventRootResolver)
    }
}

impl std::fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolvers")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("subscriptions", &self.subscriptions.keys().collect::<Vec<_>>())
            .finish()
    }
}
