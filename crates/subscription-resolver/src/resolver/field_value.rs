// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::FieldError;

/// The value of a field, as produced by a resolver.
pub enum FieldValue {
    Value(Value),
    /// A value of a known object type. Needed when the field's declared type is an interface or a
    /// union and the value itself carries no `__typename`.
    Typed { type_name: String, value: Value },
    List(Vec<FieldValue>),
    /// A value that is still being computed (for example, waiting for a batched load).
    Deferred(Deferred),
}

pub struct Deferred(BoxFuture<'static, Result<FieldValue, FieldError>>);

impl Deferred {
    pub fn new(future: impl Future<Output = Result<FieldValue, FieldError>> + Send + 'static) -> Self {
        Self(future.boxed())
    }
}

impl FieldValue {
    pub fn null() -> Self {
        FieldValue::Value(Value::Null)
    }

    pub fn typed(type_name: impl Into<String>, value: Value) -> Self {
        FieldValue::Typed {
            type_name: type_name.into(),
            value,
        }
    }

    pub fn deferred(
        future: impl Future<Output = Result<FieldValue, FieldError>> + Send + 'static,
    ) -> Self {
        FieldValue::Deferred(Deferred::new(future))
    }

    /// Wait for a deferred value (and whatever it defers to in turn). Values nested in a list are
    /// left as is.
    pub async fn resolve(self) -> Result<FieldValue, FieldError> {
        let mut value = self;
        while let FieldValue::Deferred(Deferred(future)) = value {
            value = future.await?;
        }
        Ok(value)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldValue::Typed { type_name, value } => f
                .debug_struct("Typed")
                .field("type_name", type_name)
                .field("value", value)
                .finish(),
            FieldValue::List(values) => f.debug_tuple("List").field(values).finish(),
            FieldValue::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn nested_deferred_values_are_resolved() {
        let value = FieldValue::deferred(async {
            tokio::task::yield_now().await;
            Ok(FieldValue::deferred(async { Ok(json!("done").into()) }))
        });

        assert!(matches!(
            value.resolve().await,
            Ok(FieldValue::Value(Value::String(s))) if s == "done"
        ));
    }

    #[tokio::test]
    async fn failures_surface_on_resolve() {
        let value = FieldValue::deferred(async { Err(FieldError::graphql("not loaded")) });

        assert_eq!(value.resolve().await.unwrap_err().to_string(), "not loaded");
    }

    #[tokio::test]
    async fn ready_values_are_unchanged() {
        let value = FieldValue::typed("App", json!({"id": "1"}))
            .resolve()
            .await
            .unwrap();

        assert!(matches!(
            value,
            FieldValue::Typed { type_name, value } if type_name == "App" && value == json!({"id": "1"})
        ));
    }
}
