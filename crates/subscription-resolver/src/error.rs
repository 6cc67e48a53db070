// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use async_graphql_parser::Pos;
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::error;

/// An error raised while resolving a single field.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("{0}")]
    GraphQL(String),

    #[error("You need one of the following permissions: {}", .permissions.join(", "))]
    PermissionDenied { permissions: Vec<String> },

    #[error("{0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl FieldError {
    pub fn graphql(message: impl Into<String>) -> Self {
        FieldError::GraphQL(message.into())
    }

    pub fn internal(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        FieldError::Internal(Box::new(error))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FieldError::GraphQL(_) => ErrorKind::GraphQL,
            FieldError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            FieldError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Errors raised by the execution engine (or deliberately by a resolver) meant for the reader
    GraphQL,
    PermissionDenied,
    /// Anything else; the message may carry internal details
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::GraphQL => "GraphQLError",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::Internal => "InternalError",
        }
    }
}

/// The kinds whose details are safe to include in a payload.
pub const RECOGNIZED_ERROR_KINDS: [ErrorKind; 2] = [ErrorKind::GraphQL, ErrorKind::PermissionDenied];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A field error together with where in the query (and in the result) it happened.
#[derive(Debug)]
pub struct ExecutionError {
    pub error: FieldError,
    pub path: Vec<PathSegment>,
    pub locations: Vec<Pos>,
}

impl ExecutionError {
    pub fn new(error: FieldError, path: Vec<PathSegment>, locations: Vec<Pos>) -> Self {
        Self {
            error,
            path,
            locations,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

/// Normalize an error for inclusion in a payload.
///
/// Errors of a kind in `recognized` keep their message, locations, path, and code. Any other error
/// is reduced to a generic message, so that internal details never reach a webhook receiver.
pub fn format_error(error: &ExecutionError, recognized: &[ErrorKind]) -> Value {
    if !recognized.contains(&error.kind()) {
        error!(%error, path = ?error.path, "Unrecognized error while generating payload");
        return json!({ "message": "Internal server error" });
    }

    let mut record = Map::new();
    record.insert("message".to_string(), Value::String(error.to_string()));

    if !error.locations.is_empty() {
        let locations = error
            .locations
            .iter()
            .map(|pos| json!({ "line": pos.line, "column": pos.column }))
            .collect();
        record.insert("locations".to_string(), Value::Array(locations));
    }

    if !error.path.is_empty() {
        record.insert("path".to_string(), json!(error.path));
    }

    let mut exception = Map::new();
    exception.insert("code".to_string(), Value::from(error.kind().code()));
    if let FieldError::PermissionDenied { permissions } = &error.error {
        exception.insert("permissions".to_string(), json!(permissions));
    }
    record.insert("extensions".to_string(), json!({ "exception": exception }));

    Value::Object(record)
}

pub fn format_errors(errors: &[ExecutionError], recognized: &[ErrorKind]) -> Vec<Value> {
    errors
        .iter()
        .map(|error| format_error(error, recognized))
        .collect()
}

#[cfg(test)]
mod tests {
    use insta::assert_json_snapshot;

    use super::*;

    #[derive(Debug, Error)]
    #[error("connection to 10.0.0.3:5432 refused")]
    struct DatabaseDown;

    fn path(segments: &[PathSegment]) -> Vec<PathSegment> {
        segments.to_vec()
    }

    #[test]
    fn recognized_errors_keep_details() {
        let errors = vec![
            ExecutionError::new(
                FieldError::PermissionDenied {
                    permissions: vec!["MANAGE_PRODUCTS".into(), "MANAGE_ORDERS".into()],
                },
                path(&["event".into(), "product".into(), "privateMetadata".into()]),
                vec![Pos { line: 4, column: 9 }],
            ),
            ExecutionError::new(
                FieldError::graphql("Variant not found"),
                path(&["event".into(), "variants".into(), PathSegment::Index(1)]),
                vec![],
            ),
        ];

        assert_json_snapshot!(format_errors(&errors, &RECOGNIZED_ERROR_KINDS), @r###"
        [
          {
            "message": "You need one of the following permissions: MANAGE_PRODUCTS, MANAGE_ORDERS",
            "locations": [
              {
                "line": 4,
                "column": 9
              }
            ],
            "path": [
              "event",
              "product",
              "privateMetadata"
            ],
            "extensions": {
              "exception": {
                "code": "PermissionDenied",
                "permissions": [
                  "MANAGE_PRODUCTS",
                  "MANAGE_ORDERS"
                ]
              }
            }
          },
          {
            "message": "Variant not found",
            "path": [
              "event",
              "variants",
              1
            ],
            "extensions": {
              "exception": {
                "code": "GraphQLError"
              }
            }
          }
        ]
        "###);
    }

    #[test]
    fn unrecognized_errors_are_degraded() {
        let error = ExecutionError::new(
            FieldError::internal(DatabaseDown),
            path(&["event".into()]),
            vec![Pos { line: 1, column: 16 }],
        );

        assert_eq!(
            format_error(&error, &RECOGNIZED_ERROR_KINDS),
            json!({ "message": "Internal server error" })
        );
    }

    #[test]
    fn recognition_is_decided_by_the_caller() {
        let error = ExecutionError::new(FieldError::graphql("Boom"), vec![], vec![]);

        assert_eq!(
            format_error(&error, &[ErrorKind::PermissionDenied]),
            json!({ "message": "Internal server error" })
        );
        assert_eq!(
            format_error(&error, &[ErrorKind::GraphQL]),
            json!({ "message": "Boom", "extensions": { "exception": { "code": "GraphQLError" } } })
        );
        assert!(format_errors(&[], &RECOGNIZED_ERROR_KINDS).is_empty());
    }
}
