// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use common::context::ExecutionContext;
use futures::stream::{self, BoxStream, StreamExt};
use heck::ToUpperCamelCase;
use serde_json::Value;

use crate::error::FieldError;
use crate::validation::field::ValidatedField;

use super::FieldValue;

/// The root value a subscription executes against: the event that fired.
#[derive(Debug, Clone)]
pub struct EventRoot {
    /// For example, `ORDER_CREATED`.
    pub event_type: String,
    pub event: Value,
}

impl EventRoot {
    pub fn new(event_type: impl Into<String>, event: Value) -> Self {
        Self {
            event_type: event_type.into(),
            event,
        }
    }

    /// The object type representing this event (`ORDER_CREATED` is represented by `OrderCreated`).
    pub fn type_name(&self) -> String {
        self.event_type.to_upper_camel_case()
    }
}

/// Produces the values of a subscription field.
///
/// A subscription is a stream; only its first item is used to build a payload.
#[async_trait]
pub trait SubscriptionResolver: Send + Sync {
    async fn subscribe<'a>(
        &'a self,
        root: &'a EventRoot,
        field: &'a ValidatedField,
        context: &'a ExecutionContext,
    ) -> Result<BoxStream<'a, Result<FieldValue, FieldError>>, FieldError>;
}

/// Emits the event itself, typed after the event type.
#[derive(Debug, Clone, Copy)]
pub struct EventRootResolver;

#[async_trait]
impl SubscriptionResolver for EventRootResolver {
    async fn subscribe<'a>(
        &'a self,
        root: &'a EventRoot,
        _field: &'a ValidatedField,
        _context: &'a ExecutionContext,
    ) -> Result<BoxStream<'a, Result<FieldValue, FieldError>>, FieldError> {
        let value = FieldValue::typed(root.type_name(), root.event.clone());
        Ok(stream::once(async move { Ok(value) }).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names() {
        assert_eq!(
            EventRoot::new("ORDER_CREATED", Value::Null).type_name(),
            "OrderCreated"
        );
        assert_eq!(
            EventRoot::new("product_variant_stock_updated", Value::Null).type_name(),
            "ProductVariantStockUpdated"
        );
    }
}
