// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Validate stored subscription queries.
//!
//! Take a query authored by a webhook owner and transform it into a validated form (in the
//! process, check that it is a single-field subscription that fits the schema).

use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::Name;

pub mod document;
pub mod document_validator;
pub mod field;
pub mod operation;
pub mod validation_error;

mod arguments_validator;
mod selection_set_validator;

pub fn underlying_type(typ: &Type) -> &Name {
    match &typ.base {
        BaseType::Named(name) => name,
        BaseType::List(typ) => underlying_type(typ),
    }
}
