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
    types::{Field, InputValueDefinition},
};
use async_graphql_value::{ConstValue, Name, indexmap::IndexMap};

use crate::validation::validation_error::ValidationError;

pub struct ArgumentValidator<'a> {
    variables: &'a HashMap<Name, ConstValue>,
    field: &'a Positioned<Field>,
}

impl<'a> ArgumentValidator<'a> {
    #[must_use]
    pub fn new(variables: &'a HashMap<Name, ConstValue>, field: &'a Positioned<Field>) -> Self {
        Self { variables, field }
    }

    /// Validations performed:
    /// - Ensure that all required arguments are provided (defaults fill in omitted ones)
    /// - Ensure that there are no stray arguments (arguments that are not defined in the field)
    /// - Ensure that every variable used is defined
    pub(super) fn validate(
        &self,
        argument_definitions: &[Positioned<InputValueDefinition>],
    ) -> Result<IndexMap<String, ConstValue>, ValidationError> {
        // Stray arguments tracking: 1. Collect all the arguments supplied in the query
        let mut supplied: IndexMap<&Name, &Positioned<async_graphql_value::Value>> = self
            .field
            .node
            .arguments
            .iter()
            .map(|(name, value)| (&name.node, value))
            .collect();

        let mut validated = IndexMap::new();

        for definition in argument_definitions {
            let definition = &definition.node;
            let argument_name = &definition.name.node;

            // Stray arguments tracking: 2. Remove the argument being processed
            let value = match supplied.shift_remove(argument_name) {
                Some(value) => Some(self.resolve_variables(value)?),
                None => definition
                    .default_value
                    .as_ref()
                    .map(|default| default.node.clone()),
            };

            match value {
                Some(ConstValue::Null) | None if !definition.ty.node.nullable => {
                    return Err(ValidationError::RequiredArgumentNotFound(
                        argument_name.to_string(),
                        self.field.pos,
                    ));
                }
                Some(value) => {
                    validated.insert(argument_name.to_string(), value);
                }
                None => {}
            }
        }

        // Stray arguments tracking: 3. Anything left over is not defined by the field
        if !supplied.is_empty() {
            return Err(ValidationError::StrayArguments(
                supplied.keys().map(|name| name.to_string()).collect(),
                self.field.node.name.node.to_string(),
                self.field.pos,
            ));
        }

        Ok(validated)
    }

    fn resolve_variables(
        &self,
        value: &Positioned<async_graphql_value::Value>,
    ) -> Result<ConstValue, ValidationError> {
        value.node.clone().into_const_with(|name| {
            self.variables
                .get(&name)
                .cloned()
                .ok_or_else(|| ValidationError::VariableNotFound(name.to_string(), value.pos))
        })
    }
}
