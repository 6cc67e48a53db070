// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use common::context::{App, ExecutionContext};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::{ExecutionError, RECOGNIZED_ERROR_KINDS, format_errors};
use crate::execution::SubscriptionExecutor;
use crate::resolver::{EventRoot, Resolvers};
use crate::schema::Schema;
use crate::validation::{
    document_validator::DocumentValidator, operation::ValidatedSubscription,
    validation_error::ValidationError,
};

/// The data selected by the subscription, keyed by the field's output name, plus an `errors`
/// array when some fields failed.
pub type Payload = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookErrorCode {
    Invalid,
}

/// Why a subscription query cannot be stored, in the shape reported to webhook owners.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct QueryValidationError {
    pub field: &'static str,
    pub message: &'static str,
    pub code: WebhookErrorCode,
}

impl QueryValidationError {
    pub fn invalid_query() -> Self {
        Self {
            field: "query",
            message: "Subscription query is not valid",
            code: WebhookErrorCode::Invalid,
        }
    }
}

/// Why no payload was generated.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Invalid subscription query: {0}")]
    Validation(#[from] ValidationError),

    #[error("Subscription failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Subscription produced no payload")]
    NoPayload,
}

/// Validates subscription queries and generates webhook payloads from them.
///
/// Holds only read-only state, so a single generator may serve any number of concurrent
/// generations; everything mutable lives in the [`ExecutionContext`] of each call.
#[derive(Debug, Clone)]
pub struct PayloadGenerator {
    schema: Arc<Schema>,
    resolvers: Arc<Resolvers>,
}

impl PayloadGenerator {
    pub fn new(schema: Arc<Schema>, resolvers: Arc<Resolvers>) -> Self {
        Self { schema, resolvers }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Parse and validate a subscription query.
    pub fn prepare_subscription(
        &self,
        query: &str,
    ) -> Result<ValidatedSubscription, ValidationError> {
        let document = async_graphql_parser::parse_query(query).map_err(|error| {
            debug!(%error, "Failed to parse subscription query");
            ValidationError::from(error)
        })?;

        DocumentValidator::new(&self.schema).validate(document)
    }

    /// Whether `query` is acceptable as a webhook's subscription query: exactly one subscription
    /// operation, selecting exactly one field, valid against the schema.
    ///
    /// A missing or empty query means "no subscription query" and is always acceptable.
    pub fn validate(&self, query: Option<&str>) -> bool {
        match query {
            None | Some("") => true,
            Some(query) => match self.prepare_subscription(query) {
                Ok(_) => true,
                Err(error) => {
                    debug!(%error, query, "Subscription query rejected");
                    false
                }
            },
        }
    }

    /// Like [`Self::validate`], but report a rejected query as a [`QueryValidationError`].
    pub fn validate_query(&self, query: Option<&str>) -> Result<(), QueryValidationError> {
        if self.validate(query) {
            Ok(())
        } else {
            Err(QueryValidationError::invalid_query())
        }
    }

    /// Execute `query` with the event as its root and build the payload.
    ///
    /// The query is parsed again on each call; callers are expected to have validated it when it
    /// was stored. `app` (the owner of the payload) is attached to `context` before execution.
    #[instrument(
        name = "PayloadGenerator::try_generate_payload"
        skip(self, event, context, app)
        )]
    pub async fn try_generate_payload(
        &self,
        event_type: &str,
        event: Value,
        query: &str,
        mut context: ExecutionContext,
        app: Option<App>,
    ) -> Result<Payload, PayloadError> {
        let subscription = self.prepare_subscription(query)?;

        context.app = app;
        let root = EventRoot::new(event_type, event);

        let result = SubscriptionExecutor::new(&self.schema, &self.resolvers, &context)
            .execute(&subscription, &root)
            .await?
            .ok_or(PayloadError::NoPayload)?;

        let mut payload = result.data.unwrap_or_default();

        let errors = format_errors(&result.errors, &RECOGNIZED_ERROR_KINDS);
        if !errors.is_empty() {
            payload.insert("errors".to_string(), Value::Array(errors));
        }

        Ok(payload)
    }

    /// Execute `query` with the event as its root and build the payload, or `None` if no payload
    /// can be produced (the reason is logged). A broken subscription never fails event processing.
    pub async fn generate_payload(
        &self,
        event_type: &str,
        event: Value,
        query: &str,
        context: ExecutionContext,
        app: Option<App>,
    ) -> Option<Payload> {
        let app_id = app.as_ref().map(|app| app.id.clone());

        match self
            .try_generate_payload(event_type, event, query, context, app)
            .await
        {
            Ok(payload) => Some(payload),
            Err(error) => {
                warn!(%error, query, app = ?app_id, "No payload generated for subscription");
                None
            }
        }
    }

    /// [`Self::generate_payload`] for callers outside of an async runtime. Blocks the current
    /// thread until every deferred value is resolved.
    pub fn generate_payload_blocking(
        &self,
        event_type: &str,
        event: Value,
        query: &str,
        context: ExecutionContext,
        app: Option<App>,
    ) -> Option<Payload> {
        futures::executor::block_on(self.generate_payload(event_type, event, query, context, app))
    }
}
