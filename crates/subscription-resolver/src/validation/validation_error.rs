// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Pos;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0}")]
    QueryParsingFailed(String, Pos, Option<Pos>),

    #[error("Query must contain exactly one subscription with a single field")]
    NotSingleSubscription,

    #[error("The schema does not support subscriptions")]
    SubscriptionsNotSupported,

    #[error("Variable '{0}' not found")]
    VariableNotFound(String, Pos),

    #[error("Fragment definition '{0}' not found")]
    FragmentDefinitionNotFound(String, Pos),

    #[error("Fragment '{0}' refers to itself")]
    FragmentCycle(String, Pos),

    #[error("Type condition '{0}' does not name an object, interface, or union type")]
    InvalidTypeCondition(String, Pos),

    #[error("Field '{0}' is not valid for type '{1}'")]
    InvalidField(String, String, Pos),

    #[error("Field '{0}' cannot be subscribed to")]
    InvalidSubscriptionField(String, Pos),

    #[error("Field '{0}' is of a scalar type, which should not specify fields")]
    ScalarWithField(String, Pos),

    #[error("Field '{0}' is of an object type, which must specify fields")]
    ObjectWithoutFields(String, Pos),

    #[error("Field type '{0}' is not valid")]
    InvalidFieldType(String, Pos),

    #[error("Required argument '{0}' not found")]
    RequiredArgumentNotFound(String, Pos),

    #[error("Argument(s) '{0:?}' invalid for '{1}'")]
    StrayArguments(Vec<String>, String, Pos),
}

impl ValidationError {
    pub fn positions(&self) -> Vec<Pos> {
        match self {
            ValidationError::QueryParsingFailed(_, pos1, pos2) => {
                std::iter::once(*pos1).chain(*pos2).collect()
            }
            ValidationError::NotSingleSubscription
            | ValidationError::SubscriptionsNotSupported => vec![],
            ValidationError::VariableNotFound(_, pos)
            | ValidationError::FragmentDefinitionNotFound(_, pos)
            | ValidationError::FragmentCycle(_, pos)
            | ValidationError::InvalidTypeCondition(_, pos)
            | ValidationError::InvalidField(_, _, pos)
            | ValidationError::InvalidSubscriptionField(_, pos)
            | ValidationError::ScalarWithField(_, pos)
            | ValidationError::ObjectWithoutFields(_, pos)
            | ValidationError::InvalidFieldType(_, pos)
            | ValidationError::RequiredArgumentNotFound(_, pos)
            | ValidationError::StrayArguments(_, _, pos) => vec![*pos],
        }
    }
}

impl From<async_graphql_parser::Error> for ValidationError {
    fn from(error: async_graphql_parser::Error) -> Self {
        let (message, pos1, pos2) = match error {
            async_graphql_parser::Error::Syntax {
                message,
                start,
                end,
            } => (format!("Syntax error: {message}"), start, end),
            async_graphql_parser::Error::MultipleOperations {
                anonymous,
                operation,
            } => (
                "Multiple operations".to_string(),
                anonymous,
                Some(operation),
            ),
            async_graphql_parser::Error::OperationDuplicated {
                operation,
                first,
                second,
            } => (
                format!("Operation {operation} duplicated"),
                first,
                Some(second),
            ),
            async_graphql_parser::Error::FragmentDuplicated {
                fragment,
                first,
                second,
            } => (
                format!("Fragment {fragment} duplicated"),
                first,
                Some(second),
            ),
            async_graphql_parser::Error::MissingOperation => {
                ("Missing operation".to_string(), Pos::default(), None)
            }
            other => (other.to_string(), Pos::default(), None),
        };

        ValidationError::QueryParsingFailed(message, pos1, pos2)
    }
}
