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
use serde_json::Value;

use crate::error::FieldError;
use crate::validation::field::ValidatedField;

use super::FieldValue;

#[async_trait]
pub trait FieldResolver: Send + Sync {
    /// Resolve `field` (for example `name` in `product { name }`) on `parent`, the already
    /// resolved value of the enclosing object (here the `product`).
    async fn resolve_field(
        &self,
        parent: &Value,
        field: &ValidatedField,
        context: &ExecutionContext,
    ) -> Result<FieldValue, FieldError>;
}

/// Plain functions serve as resolvers; they may still return a [`FieldValue::Deferred`] to do
/// asynchronous work.
#[async_trait]
impl<F> FieldResolver for F
where
    F: Fn(&Value, &ValidatedField, &ExecutionContext) -> Result<FieldValue, FieldError>
        + Send
        + Sync,
{
    async fn resolve_field(
        &self,
        parent: &Value,
        field: &ValidatedField,
        context: &ExecutionContext,
    ) -> Result<FieldValue, FieldError> {
        self(parent, field, context)
    }
}

/// Resolves a field to the property of the same name in the parent value (`null` if absent).
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver;

#[async_trait]
impl FieldResolver for PropertyResolver {
    async fn resolve_field(
        &self,
        parent: &Value,
        field: &ValidatedField,
        _context: &ExecutionContext,
    ) -> Result<FieldValue, FieldError> {
        Ok(parent
            .get(field.name.as_str())
            .cloned()
            .unwrap_or(Value::Null)
            .into())
    }
}
