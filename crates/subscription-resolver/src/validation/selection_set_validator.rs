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
    Pos, Positioned,
    types::{
        Field, FieldDefinition, FragmentDefinition, FragmentSpread, Selection, SelectionSet,
        TypeDefinition,
    },
};
use async_graphql_value::{ConstValue, Name, indexmap::IndexMap};

use crate::schema::{Schema, is_composite, is_leaf};
use crate::validation::{field::ValidatedField, validation_error::ValidationError};

use super::{arguments_validator::ArgumentValidator, underlying_type};

/// Context for validating a selection set.
pub struct SelectionSetValidator<'a> {
    schema: &'a Schema,
    /// The parent type of this field.
    container_type: &'a TypeDefinition,
    variables: &'a HashMap<Name, ConstValue>,
    fragment_definitions: &'a HashMap<Name, Positioned<FragmentDefinition>>,
}

impl<'a> SelectionSetValidator<'a> {
    #[must_use]
    pub fn new(
        schema: &'a Schema,
        container_type: &'a TypeDefinition,
        variables: &'a HashMap<Name, ConstValue>,
        fragment_definitions: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    ) -> Self {
        Self {
            schema,
            container_type,
            variables,
            fragment_definitions,
        }
    }

    /// Validate selection set.
    ///
    /// Validations performed:
    /// - Each field is defined in the `container_type`
    /// - Each fragment referred is defined, is not (directly or indirectly) recursive, and has a
    ///   composite type condition
    /// - Arguments to each field are valid (see [ArgumentValidator] for details)
    ///
    /// # Returns
    ///   A vector of validated fields (any fragment is resolved and inlined, thus normalizing the
    ///   fields)
    pub(super) fn validate(
        &self,
        selection_set: &Positioned<SelectionSet>,
    ) -> Result<Vec<ValidatedField>, ValidationError> {
        self.validate_selections(selection_set, &[], &mut vec![])
    }

    fn with_container(&self, container_type: &'a TypeDefinition) -> SelectionSetValidator<'a> {
        SelectionSetValidator::new(
            self.schema,
            container_type,
            self.variables,
            self.fragment_definitions,
        )
    }

    fn validate_selections(
        &self,
        selection_set: &Positioned<SelectionSet>,
        type_conditions: &[Name],
        active_fragments: &mut Vec<Name>,
    ) -> Result<Vec<ValidatedField>, ValidationError> {
        let mut fields = vec![];

        for selection in &selection_set.node.items {
            match &selection.node {
                Selection::Field(field) => {
                    let mut field = self.validate_field(field, active_fragments)?;
                    field.type_conditions = type_conditions.to_vec();
                    fields.push(field);
                }
                Selection::FragmentSpread(fragment_spread) => {
                    let fragment_name = &fragment_spread.node.fragment_name.node;
                    if active_fragments.contains(fragment_name) {
                        return Err(ValidationError::FragmentCycle(
                            fragment_name.to_string(),
                            fragment_spread.pos,
                        ));
                    }

                    let fragment_definition = self.fragment_definition(fragment_spread)?;
                    let condition = &fragment_definition.type_condition.node.on;

                    active_fragments.push(fragment_name.clone());
                    let fragment_fields = self.validate_conditional_selections(
                        &fragment_definition.selection_set,
                        condition,
                        type_conditions,
                        active_fragments,
                    );
                    active_fragments.pop();

                    fields.extend(fragment_fields?);
                }
                Selection::InlineFragment(inline_fragment) => {
                    let fragment_fields = match &inline_fragment.node.type_condition {
                        Some(condition) => self.validate_conditional_selections(
                            &inline_fragment.node.selection_set,
                            &condition.node.on,
                            type_conditions,
                            active_fragments,
                        )?,
                        None => self.validate_selections(
                            &inline_fragment.node.selection_set,
                            type_conditions,
                            active_fragments,
                        )?,
                    };
                    fields.extend(fragment_fields);
                }
            }
        }

        Ok(fields)
    }

    /// Validate the selections of a fragment whose type condition is `condition`, using the
    /// condition's type as the container. Nested fragments accumulate their conditions.
    fn validate_conditional_selections(
        &self,
        selection_set: &Positioned<SelectionSet>,
        condition: &Positioned<Name>,
        outer_conditions: &[Name],
        active_fragments: &mut Vec<Name>,
    ) -> Result<Vec<ValidatedField>, ValidationError> {
        let condition_type = self
            .schema
            .get_type_definition(condition.node.as_str())
            .filter(|td| is_composite(td))
            .ok_or_else(|| {
                ValidationError::InvalidTypeCondition(condition.node.to_string(), condition.pos)
            })?;

        // A condition on the container type itself always holds, so it need not be recorded
        let mut conditions = outer_conditions.to_vec();
        if condition.node != self.container_type.name.node {
            conditions.push(condition.node.clone());
        }

        self.with_container(condition_type).validate_selections(
            selection_set,
            &conditions,
            active_fragments,
        )
    }

    fn validate_field(
        &self,
        field: &Positioned<Field>,
        active_fragments: &mut Vec<Name>,
    ) -> Result<ValidatedField, ValidationError> {
        let alias = field.node.alias.as_ref().map(|alias| alias.node.clone());
        let name = field.node.name.node.clone();

        // __typename is available on every composite type without being declared
        if name.as_str() == "__typename" {
            return if !field.node.arguments.is_empty() {
                Err(ValidationError::StrayArguments(
                    field
                        .node
                        .arguments
                        .iter()
                        .map(|arg| arg.0.node.to_string())
                        .collect(),
                    name.to_string(),
                    field.pos,
                ))
            } else if !field.node.selection_set.node.items.is_empty() {
                Err(ValidationError::ScalarWithField(name.to_string(), field.pos))
            } else {
                Ok(ValidatedField {
                    alias,
                    name,
                    arguments: IndexMap::new(),
                    subfields: vec![],
                    type_conditions: vec![],
                    pos: field.pos,
                })
            };
        }

        let field_definition = self.get_field_definition(field)?;
        let field_type_definition = self.get_type_definition(field_definition, field)?;
        let has_selection = !field.node.selection_set.node.items.is_empty();

        let subfields = if is_leaf(field_type_definition) {
            if has_selection {
                return Err(ValidationError::ScalarWithField(name.to_string(), field.pos));
            }
            vec![]
        } else if !has_selection {
            return Err(ValidationError::ObjectWithoutFields(
                name.to_string(),
                field.pos,
            ));
        } else {
            self.with_container(field_type_definition).validate_selections(
                &field.node.selection_set,
                &[],
                active_fragments,
            )?
        };

        let arguments =
            ArgumentValidator::new(self.variables, field).validate(&field_definition.arguments)?;

        Ok(ValidatedField {
            alias,
            name,
            arguments,
            subfields,
            type_conditions: vec![],
            pos: field.pos,
        })
    }

    fn fragment_definition(
        &self,
        fragment: &Positioned<FragmentSpread>,
    ) -> Result<&'a FragmentDefinition, ValidationError> {
        self.fragment_definitions
            .get(&fragment.node.fragment_name.node)
            .map(|v| &v.node)
            .ok_or_else(|| {
                ValidationError::FragmentDefinitionNotFound(
                    fragment.node.fragment_name.node.as_str().to_string(),
                    fragment.pos,
                )
            })
    }

    fn get_type_definition(
        &self,
        field_definition: &FieldDefinition,
        field: &Positioned<Field>,
    ) -> Result<&'a TypeDefinition, ValidationError> {
        let type_name = underlying_type(&field_definition.ty.node);

        self.schema
            .get_type_definition(type_name.as_str())
            .filter(|td| is_leaf(td) || is_composite(td))
            .ok_or_else(|| ValidationError::InvalidFieldType(type_name.to_string(), field.pos))
    }

    fn get_field_definition(
        &self,
        field: &Positioned<Field>,
    ) -> Result<&'a FieldDefinition, ValidationError> {
        self.schema
            .field_definition(self.container_type, field.node.name.node.as_str())
            .ok_or_else(|| {
                ValidationError::InvalidField(
                    field.node.name.node.to_string(),
                    self.container_type.name.node.to_string(),
                    field.pos,
                )
            })
    }
}
