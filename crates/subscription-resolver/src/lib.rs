// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Generation of webhook payloads from subscription queries.
//!
//! A webhook owner describes the payload it wants as a GraphQL subscription with a single field
//! (for example `subscription { event { ... on OrderCreated { order { id } } } }`). This crate
//! checks such queries when they are stored ([`PayloadGenerator::validate_query`]) and, whenever an
//! event fires, executes them with the event as the root value
//! ([`PayloadGenerator::generate_payload`]).

pub mod error;
pub mod execution;
pub mod payload_generator;
pub mod resolver;
pub mod schema;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use error::{ErrorKind, ExecutionError, FieldError, PathSegment, format_error, format_errors};
pub use payload_generator::{
    Payload, PayloadError, PayloadGenerator, QueryValidationError, WebhookErrorCode,
};
pub use resolver::{
    Deferred, EventRoot, EventRootResolver, FieldResolver, FieldValue, Resolvers,
    SubscriptionResolver, ensure_app_permissions,
};
pub use schema::{Schema, SchemaError};
