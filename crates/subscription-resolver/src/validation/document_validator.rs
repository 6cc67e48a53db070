// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::{
    Positioned,
    types::{DocumentOperations, ExecutableDocument, VariableDefinition},
};
use async_graphql_value::{ConstValue, Name};
use tracing::instrument;

use crate::schema::Schema;

use super::{
    document::is_single_subscription, operation::ValidatedSubscription,
    selection_set_validator::SelectionSetValidator, validation_error::ValidationError,
};

/// Context for validating a subscription document.
pub struct DocumentValidator<'a> {
    schema: &'a Schema,
}

impl<'a> DocumentValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validate the subscription document.
    ///
    /// Validations performed:
    /// - The document holds exactly one operation, a subscription with a single selection
    ///   (fragments definitions may accompany it)
    /// - The schema supports subscriptions
    /// - The selection (with fragments inlined) is a single field that fits the schema
    #[instrument(
        name = "DocumentValidator::validate"
        skip_all
        )]
    pub fn validate(
        self,
        document: ExecutableDocument,
    ) -> Result<ValidatedSubscription, ValidationError> {
        if !is_single_subscription(&document) {
            return Err(ValidationError::NotSingleSubscription);
        }

        let (operation_name, operation) = match document.operations {
            DocumentOperations::Single(operation) => (None, operation),
            DocumentOperations::Multiple(operations) => operations
                .into_iter()
                .next()
                .map(|(name, operation)| (Some(name.to_string()), operation))
                .ok_or(ValidationError::NotSingleSubscription)?,
        };

        let subscription_type = self
            .schema
            .subscription_type()
            .ok_or(ValidationError::SubscriptionsNotSupported)?;

        let variables = Self::default_variables(&operation.node.variable_definitions)?;

        let selection_set_validator = SelectionSetValidator::new(
            self.schema,
            subscription_type,
            &variables,
            &document.fragments,
        );

        let mut fields = selection_set_validator.validate(&operation.node.selection_set)?;

        // A fragment spread counts as one selection but may expand to any number of fields
        let field = match (fields.pop(), fields.is_empty()) {
            (Some(field), true) => field,
            _ => return Err(ValidationError::NotSingleSubscription),
        };

        // Introspection fields (and fields of fragments that never apply to the root) validate
        // fine but cannot produce an event
        let subscription_type_name = subscription_type.name.node.as_str();
        let subscribable = !field.is_introspection()
            && self
                .schema
                .field_definition(subscription_type, field.name.as_str())
                .is_some()
            && field
                .type_conditions
                .iter()
                .all(|condition| {
                    self.schema
                        .is_possible_type(condition.as_str(), subscription_type_name)
                });

        if !subscribable {
            return Err(ValidationError::InvalidSubscriptionField(
                field.name.to_string(),
                field.pos,
            ));
        }

        Ok(ValidatedSubscription {
            name: operation_name,
            field,
        })
    }

    /// Stored subscriptions are executed without variable values, so a variable is usable only
    /// through its default (or as `null`, when nullable).
    fn default_variables(
        variable_definitions: &[Positioned<VariableDefinition>],
    ) -> Result<HashMap<Name, ConstValue>, ValidationError> {
        variable_definitions
            .iter()
            .map(|definition| {
                let definition_node = &definition.node;
                let value = match &definition_node.default_value {
                    Some(default) => default.node.clone(),
                    None if definition_node.var_type.node.nullable => ConstValue::Null,
                    None => {
                        return Err(ValidationError::VariableNotFound(
                            definition_node.name.node.to_string(),
                            definition.pos,
                        ));
                    }
                };
                Ok((definition_node.name.node.clone(), value))
            })
            .collect()
    }
}
