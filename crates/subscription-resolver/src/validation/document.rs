// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::{
    Positioned,
    types::{
        DocumentOperations, ExecutableDocument, FragmentDefinition, OperationDefinition,
        OperationType,
    },
};
use async_graphql_value::Name;

/// A top-level definition of a query document, classified for the single-subscription check.
#[derive(Debug)]
pub enum Definition<'a> {
    Fragment(&'a Name, &'a Positioned<FragmentDefinition>),
    SubscriptionOperation(Option<&'a Name>, &'a Positioned<OperationDefinition>),
    OtherOperation(Option<&'a Name>, &'a Positioned<OperationDefinition>),
}

pub fn definitions(document: &ExecutableDocument) -> Vec<Definition<'_>> {
    let operations: Vec<(Option<&Name>, &Positioned<OperationDefinition>)> =
        match &document.operations {
            DocumentOperations::Single(operation) => vec![(None, operation)],
            DocumentOperations::Multiple(operations) => operations
                .iter()
                .map(|(name, operation)| (Some(name), operation))
                .collect(),
        };

    operations
        .into_iter()
        .map(|(name, operation)| match operation.node.ty {
            OperationType::Subscription => Definition::SubscriptionOperation(name, operation),
            OperationType::Query | OperationType::Mutation => {
                Definition::OtherOperation(name, operation)
            }
        })
        .chain(
            document
                .fragments
                .iter()
                .map(|(name, fragment)| Definition::Fragment(name, fragment)),
        )
        .collect()
}

/// Check that the document holds a single subscription selecting a single field.
///
/// Fragment definitions may accompany the subscription; any other operation disqualifies the
/// document.
pub fn is_single_subscription(document: &ExecutableDocument) -> bool {
    let mut subscriptions = 0;

    for definition in definitions(document) {
        match definition {
            Definition::Fragment(..) => {}
            Definition::SubscriptionOperation(_, operation) => {
                if operation.node.selection_set.node.items.len() != 1 {
                    return false;
                }
                subscriptions += 1;
            }
            Definition::OtherOperation(..) => return false,
        }
    }

    subscriptions == 1
}
