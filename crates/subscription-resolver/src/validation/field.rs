// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Pos;
use async_graphql_value::{ConstValue, Name, indexmap::IndexMap};

#[derive(Debug, Clone)]
pub struct ValidatedField {
    pub alias: Option<Name>,
    /// The name of the field.
    pub name: Name,
    /// The arguments to the field (including defaulted ones), empty if there are none.
    pub arguments: IndexMap<String, ConstValue>,

    /// The subfields being selected in this field, if it is an object. Empty if no fields are
    /// being selected.
    pub subfields: Vec<ValidatedField>,

    /// The type conditions of the fragments (narrower than the container) the field was selected
    /// through, outermost first. The field applies only to objects matching every one of them.
    pub type_conditions: Vec<Name>,

    pub pos: Pos,
}

impl ValidatedField {
    pub fn output_name(&self) -> String {
        self.alias.as_ref().unwrap_or(&self.name).to_string()
    }

    pub fn argument(&self, name: &str) -> Option<&ConstValue> {
        self.arguments.get(name)
    }

    pub fn is_introspection(&self) -> bool {
        self.name.as_str().starts_with("__")
    }
}
