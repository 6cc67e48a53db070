// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::{
    Pos, Positioned,
    types::{FieldDefinition, TypeDefinition, TypeKind, TypeSystemDefinition},
};
use async_graphql_value::Name;
use thiserror::Error;

pub const QUERY_ROOT_TYPENAME: &str = "Query";
pub const SUBSCRIPTION_ROOT_TYPENAME: &str = "Subscription";

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// The schema that subscription queries are validated and executed against.
///
/// Built once from SDL and then shared read-only by every payload generation.
#[derive(Debug, Clone)]
pub struct Schema {
    pub type_definitions: Vec<TypeDefinition>,
    query_root: String,
    subscription_root: Option<String>,
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Could not parse schema: {0}")]
    Parse(#[from] async_graphql_parser::Error),

    #[error("Type '{0}' is defined more than once")]
    DuplicateType(String, Pos),

    #[error("Type extension '{0}' does not match an object or interface definition")]
    InvalidExtension(String, Pos),

    #[error("Root type '{0}' is not defined")]
    MissingRootType(String),
}

impl Schema {
    pub fn parse(sdl: &str) -> Result<Schema, SchemaError> {
        let document = async_graphql_parser::parse_schema(sdl)?;

        let mut type_definitions: Vec<TypeDefinition> = vec![];
        let mut extensions = vec![];
        let mut query_root = None;
        let mut subscription_root = None;

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    let schema = schema.node;
                    query_root = schema.query.map(|name| name.node.to_string()).or(query_root);
                    subscription_root = schema
                        .subscription
                        .map(|name| name.node.to_string())
                        .or(subscription_root);
                }
                TypeSystemDefinition::Type(typ) if typ.node.extend => extensions.push(typ),
                TypeSystemDefinition::Type(typ) => {
                    let name = typ.node.name.node.as_str();
                    if type_definitions.iter().any(|td| td.name.node == name) {
                        return Err(SchemaError::DuplicateType(name.to_string(), typ.pos));
                    }
                    type_definitions.push(typ.node);
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        for extension in extensions {
            Self::apply_extension(&mut type_definitions, extension)?;
        }

        for scalar in BUILTIN_SCALARS {
            if !type_definitions.iter().any(|td| td.name.node == scalar) {
                type_definitions.push(TypeDefinition {
                    extend: false,
                    description: None,
                    name: Positioned::new(Name::new(scalar), Pos::default()),
                    directives: vec![],
                    kind: TypeKind::Scalar,
                });
            }
        }

        let is_defined = |name: &str| type_definitions.iter().any(|td| td.name.node == name);

        // Explicitly named roots must exist; the default names are optional
        for root in [query_root.as_deref(), subscription_root.as_deref()]
            .into_iter()
            .flatten()
        {
            if !is_defined(root) {
                return Err(SchemaError::MissingRootType(root.to_string()));
            }
        }

        let subscription_root = subscription_root.or_else(|| {
            is_defined(SUBSCRIPTION_ROOT_TYPENAME).then(|| SUBSCRIPTION_ROOT_TYPENAME.to_string())
        });

        Ok(Schema {
            type_definitions,
            query_root: query_root.unwrap_or_else(|| QUERY_ROOT_TYPENAME.to_string()),
            subscription_root,
        })
    }

    fn apply_extension(
        type_definitions: &mut [TypeDefinition],
        extension: Positioned<TypeDefinition>,
    ) -> Result<(), SchemaError> {
        let invalid = || {
            SchemaError::InvalidExtension(extension.node.name.node.to_string(), extension.pos)
        };

        let base = type_definitions
            .iter_mut()
            .find(|td| td.name.node == extension.node.name.node)
            .ok_or_else(invalid)?;

        match (&mut base.kind, extension.node.kind) {
            (TypeKind::Object(base), TypeKind::Object(ext)) => {
                base.fields.extend(ext.fields);
                base.implements.extend(ext.implements);
            }
            (TypeKind::Interface(base), TypeKind::Interface(ext)) => {
                base.fields.extend(ext.fields);
            }
            _ => return Err(invalid()),
        }

        Ok(())
    }

    pub fn get_type_definition(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.type_definitions
            .iter()
            .find(|td| td.name.node.as_str() == type_name)
    }

    pub fn query_type_name(&self) -> &str {
        &self.query_root
    }

    /// The root type of subscription operations, if the schema supports them.
    pub fn subscription_type(&self) -> Option<&TypeDefinition> {
        self.subscription_root
            .as_deref()
            .and_then(|name| self.get_type_definition(name))
    }

    pub fn field_definition<'a>(
        &'a self,
        container_type: &'a TypeDefinition,
        field_name: &str,
    ) -> Option<&'a FieldDefinition> {
        let fields = match &container_type.kind {
            TypeKind::Object(object) => &object.fields,
            TypeKind::Interface(interface) => &interface.fields,
            _ => return None,
        };

        fields
            .iter()
            .find(|field| field.node.name.node.as_str() == field_name)
            .map(|field| &field.node)
    }

    /// Whether a value of the object type `concrete` may appear where `abstract_type` is expected
    /// (the type itself, an interface it implements, or a union it belongs to).
    pub fn is_possible_type(&self, abstract_type: &str, concrete: &str) -> bool {
        if abstract_type == concrete {
            return true;
        }

        match self.get_type_definition(abstract_type).map(|td| &td.kind) {
            Some(TypeKind::Union(union)) => union.members.iter().any(|m| m.node == concrete),
            Some(TypeKind::Interface(_)) => match self.get_type_definition(concrete) {
                Some(TypeDefinition {
                    kind: TypeKind::Object(object),
                    ..
                }) => object.implements.iter().any(|i| i.node == abstract_type),
                _ => false,
            },
            _ => false,
        }
    }
}

pub(crate) fn is_leaf(type_definition: &TypeDefinition) -> bool {
    matches!(type_definition.kind, TypeKind::Scalar | TypeKind::Enum(_))
}

pub(crate) fn is_composite(type_definition: &TypeDefinition) -> bool {
    matches!(
        type_definition.kind,
        TypeKind::Object(_) | TypeKind::Interface(_) | TypeKind::Union(_)
    )
}
