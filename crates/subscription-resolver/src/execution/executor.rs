// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::borrow::Cow;

use async_graphql_parser::types::{BaseType, Type, TypeDefinition, TypeKind};
use async_graphql_value::indexmap::{IndexMap, map::Entry};
use async_recursion::async_recursion;
use common::context::ExecutionContext;
use futures::StreamExt;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::{ExecutionError, FieldError, PathSegment};
use crate::resolver::{EventRoot, FieldValue, Resolvers};
use crate::schema::Schema;
use crate::validation::{field::ValidatedField, operation::ValidatedSubscription};

/// The first result of a subscription.
#[derive(Debug)]
pub struct ExecutionResult {
    /// `None` when a `null` reached the (non-null) subscription field.
    pub data: Option<Map<String, Value>>,
    pub errors: Vec<ExecutionError>,
}

pub struct SubscriptionExecutor<'a> {
    schema: &'a Schema,
    resolvers: &'a Resolvers,
    context: &'a ExecutionContext,
}

impl<'a> SubscriptionExecutor<'a> {
    pub fn new(schema: &'a Schema, resolvers: &'a Resolvers, context: &'a ExecutionContext) -> Self {
        Self {
            schema,
            resolvers,
            context,
        }
    }

    /// Execute the subscription with `root` as the root value.
    ///
    /// Subscribing may produce a stream of results, but only the first one is used (the others are
    /// never polled). Returns `Ok(None)` if the stream ends without producing anything.
    ///
    /// Errors in fields are collected in the result; only a failure to subscribe is returned as an
    /// error.
    #[instrument(
        name = "SubscriptionExecutor::execute"
        skip_all
        fields(event_type = %root.event_type)
        )]
    pub async fn execute(
        &self,
        subscription: &ValidatedSubscription,
        root: &EventRoot,
    ) -> Result<Option<ExecutionResult>, ExecutionError> {
        let field = &subscription.field;
        let path = vec![PathSegment::Field(field.output_name())];
        let top_level_error =
            |error: FieldError| ExecutionError::new(error, path.clone(), vec![field.pos]);

        let field_definition = self
            .schema
            .subscription_type()
            .and_then(|subscription_type| {
                self.schema
                    .field_definition(subscription_type, field.name.as_str())
            })
            .ok_or_else(|| {
                top_level_error(FieldError::graphql(format!(
                    "Subscription field '{}' is not defined",
                    field.name
                )))
            })?;

        let mut source = self
            .resolvers
            .subscription_resolver(field.name.as_str())
            .subscribe(root, field, self.context)
            .await
            .map_err(top_level_error)?;

        let Some(first) = source.next().await else {
            debug!("Subscription produced no results");
            return Ok(None);
        };

        let mut errors = vec![];
        let data = self
            .complete_value(&field_definition.ty.node, first, field, &path, &mut errors)
            .await
            .map(|value| Map::from_iter([(field.output_name(), value)]));

        Ok(Some(ExecutionResult { data, errors }))
    }

    /// Complete the value of `field`, recording any error in `errors`.
    ///
    /// Returns `None` if the field's value is invalid, which means that `null` must propagate to
    /// the nearest nullable ancestor.
    #[async_recursion]
    async fn complete_value(
        &self,
        ty: &Type,
        value: Result<FieldValue, FieldError>,
        field: &ValidatedField,
        path: &[PathSegment],
        errors: &mut Vec<ExecutionError>,
    ) -> Option<Value> {
        let completed = match value {
            Ok(value) => match value.resolve().await {
                Ok(value) => self.complete_base(&ty.base, value, field, path, errors).await,
                Err(error) => {
                    errors.push(Self::field_error(error, field, path));
                    None
                }
            },
            Err(error) => {
                errors.push(Self::field_error(error, field, path));
                None
            }
        };

        match completed {
            Some(Value::Null) if !ty.nullable => {
                errors.push(Self::field_error(
                    FieldError::graphql(format!(
                        "Cannot return null for non-nullable field '{}'",
                        field.name
                    )),
                    field,
                    path,
                ));
                None
            }
            None if ty.nullable => Some(Value::Null),
            completed => completed,
        }
    }

    #[async_recursion]
    async fn complete_base(
        &self,
        base: &BaseType,
        value: FieldValue,
        field: &ValidatedField,
        path: &[PathSegment],
        errors: &mut Vec<ExecutionError>,
    ) -> Option<Value> {
        if matches!(value, FieldValue::Value(Value::Null)) {
            return Some(Value::Null);
        }

        let type_name = match base {
            BaseType::List(item_type) => {
                let items = match value {
                    FieldValue::List(items) => items,
                    FieldValue::Value(Value::Array(items)) => {
                        items.into_iter().map(FieldValue::Value).collect()
                    }
                    _ => {
                        return self.invalid_value(field, path, errors, "Expected a list");
                    }
                };

                let mut completed = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let item_path = [path, &[PathSegment::Index(index)]].concat();
                    completed.push(
                        self.complete_value(item_type, Ok(item), field, &item_path, errors)
                            .await?,
                    );
                }
                return Some(Value::Array(completed));
            }
            BaseType::Named(type_name) => type_name,
        };

        let Some(type_definition) = self.schema.get_type_definition(type_name.as_str()) else {
            return self.invalid_value(field, path, errors, "Unknown type");
        };

        match (&type_definition.kind, value) {
            (TypeKind::Scalar | TypeKind::Enum(_), FieldValue::Value(value))
            | (TypeKind::Scalar | TypeKind::Enum(_), FieldValue::Typed { value, .. }) => {
                Some(value)
            }
            (TypeKind::Object(_), FieldValue::Value(value))
            | (TypeKind::Object(_), FieldValue::Typed { value, .. }) => self
                .execute_selection_set(type_definition, &value, &field.subfields, path, errors)
                .await
                .map(Value::Object),
            (TypeKind::Interface(_) | TypeKind::Union(_), value) => {
                let (concrete_name, value) = match value {
                    FieldValue::Typed { type_name, value } => (Some(type_name), value),
                    FieldValue::Value(value) => (
                        value
                            .get("__typename")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        value,
                    ),
                    _ => (None, Value::Null),
                };

                match concrete_name
                    .filter(|concrete| self.schema.is_possible_type(type_name.as_str(), concrete))
                    .and_then(|concrete| self.schema.get_type_definition(&concrete))
                    .filter(|td| matches!(td.kind, TypeKind::Object(_)))
                {
                    Some(concrete_type) => self
                        .execute_selection_set(concrete_type, &value, &field.subfields, path, errors)
                        .await
                        .map(Value::Object),
                    None => self.invalid_value(
                        field,
                        path,
                        errors,
                        &format!("Could not determine the concrete type of '{type_name}'"),
                    ),
                }
            }
            _ => self.invalid_value(field, path, errors, "Value does not match the field type"),
        }
    }

    /// Resolve the fields selected on an object of type `object_type`.
    ///
    /// Fields whose type conditions do not apply to the object are skipped. A field selected more
    /// than once (through fragments) is resolved once, with the subfields of every selection.
    #[async_recursion]
    async fn execute_selection_set(
        &self,
        object_type: &TypeDefinition,
        parent: &Value,
        fields: &[ValidatedField],
        path: &[PathSegment],
        errors: &mut Vec<ExecutionError>,
    ) -> Option<Map<String, Value>> {
        let type_name = object_type.name.node.as_str();
        let mut result = Map::new();

        for field in self.collect_fields(type_name, fields) {
            let field = field.as_ref();
            let output_name = field.output_name();

            let value = if field.name.as_str() == "__typename" {
                Value::String(type_name.to_string())
            } else {
                let field_path = [path, &[PathSegment::Field(output_name.clone())]].concat();

                match self
                    .schema
                    .field_definition(object_type, field.name.as_str())
                {
                    Some(field_definition) => {
                        let resolved = self
                            .resolvers
                            .field_resolver(type_name, field.name.as_str())
                            .resolve_field(parent, field, self.context)
                            .await;
                        self.complete_value(
                            &field_definition.ty.node,
                            resolved,
                            field,
                            &field_path,
                            errors,
                        )
                        .await?
                    }
                    None => {
                        errors.push(Self::field_error(
                            FieldError::graphql(format!(
                                "Field '{}' is not defined on type '{type_name}'",
                                field.name
                            )),
                            field,
                            &field_path,
                        ));
                        Value::Null
                    }
                }
            };

            result.insert(output_name, value);
        }

        Some(result)
    }

    /// The fields applying to objects of type `type_name`, one per output name (in order of first
    /// selection).
    fn collect_fields<'f>(
        &self,
        type_name: &str,
        fields: &'f [ValidatedField],
    ) -> Vec<Cow<'f, ValidatedField>> {
        let mut collected: IndexMap<String, Cow<'f, ValidatedField>> = IndexMap::new();

        let applicable = fields.iter().filter(|field| {
            field
                .type_conditions
                .iter()
                .all(|condition| self.schema.is_possible_type(condition.as_str(), type_name))
        });

        for field in applicable {
            match collected.entry(field.output_name()) {
                Entry::Occupied(mut entry) => entry
                    .get_mut()
                    .to_mut()
                    .subfields
                    .extend(field.subfields.iter().cloned()),
                Entry::Vacant(entry) => {
                    entry.insert(Cow::Borrowed(field));
                }
            }
        }

        collected.into_values().collect()
    }

    fn invalid_value(
        &self,
        field: &ValidatedField,
        path: &[PathSegment],
        errors: &mut Vec<ExecutionError>,
        reason: &str,
    ) -> Option<Value> {
        errors.push(Self::field_error(
            FieldError::graphql(format!("{reason} for field '{}'", field.name)),
            field,
            path,
        ));
        None
    }

    fn field_error(error: FieldError, field: &ValidatedField, path: &[PathSegment]) -> ExecutionError {
        ExecutionError::new(error, path.to_vec(), vec![field.pos])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_graphql_parser::parse_query;
    use async_trait::async_trait;
    use common::context::build_context;
    use common::settings::PayloadSettings;
    use futures::stream::{self, BoxStream};
    use insta::assert_json_snapshot;
    use serde_json::json;

    use super::*;
    use crate::error::{RECOGNIZED_ERROR_KINDS, format_errors};
    use crate::resolver::SubscriptionResolver;
    use crate::test_support::test_schema;
    use crate::validation::document_validator::DocumentValidator;

    fn context() -> ExecutionContext {
        let settings = PayloadSettings::new(vec![], false, Arc::new(|| "localhost".into()));
        build_context(&settings, None, false)
    }

    async fn execute(
        resolvers: &Resolvers,
        query: &str,
        root: EventRoot,
    ) -> Result<Option<ExecutionResult>, ExecutionError> {
        let schema = test_schema();
        let subscription = DocumentValidator::new(&schema)
            .validate(parse_query(query).unwrap())
            .unwrap();
        let context = context();

        SubscriptionExecutor::new(&schema, resolvers, &context)
            .execute(&subscription, &root)
            .await
    }

    async fn execute_to_json(resolvers: &Resolvers, query: &str, root: EventRoot) -> Value {
        let result = execute(resolvers, query, root).await.unwrap().unwrap();
        json!({
            "data": result.data,
            "errors": format_errors(&result.errors, &RECOGNIZED_ERROR_KINDS),
        })
    }

    fn order_created() -> EventRoot {
        EventRoot::new(
            "ORDER_CREATED",
            json!({
                "issuedAt": "2026-01-02T10:00:00Z",
                "version": "3.20",
                "issuer": { "__typename": "Staff", "id": "9", "email": "staff@example.com" },
                "order": { "id": "T3JkZXI6MQ==", "number": "1001", "total": 20.5 },
            }),
        )
    }

    #[tokio::test]
    async fn event_with_fragments() {
        let result = execute_to_json(
            &Resolvers::new(),
            r#"
            subscription {
                event {
                    __typename
                    issuedAt
                    issuer {
                        ... on App { name }
                        ... on Staff { email }
                    }
                    ... on ProductCreated { product { id } }
                    ... on OrderCreated { order { id number } }
                    ... on OrderCreated { order { total } }
                }
            }
            "#,
            order_created(),
        )
        .await;

        assert_json_snapshot!(result, @r###"
        {
          "data": {
            "event": {
              "__typename": "OrderCreated",
              "issuedAt": "2026-01-02T10:00:00Z",
              "issuer": {
                "email": "staff@example.com"
              },
              "order": {
                "id": "T3JkZXI6MQ==",
                "number": "1001",
                "total": 20.5
              }
            }
          },
          "errors": []
        }
        "###);
    }

    #[tokio::test]
    async fn null_propagates_to_the_nearest_nullable_field() {
        let root = EventRoot::new("ORDER_CREATED", json!({ "order": { "id": "1" } }));

        let result = execute_to_json(
            &Resolvers::new(),
            "subscription { event { version ... on OrderCreated { order { id number } } } }",
            root,
        )
        .await;

        assert_json_snapshot!(result, @r###"
        {
          "data": {
            "event": {
              "version": null,
              "order": null
            }
          },
          "errors": [
            {
              "message": "Cannot return null for non-nullable field 'number'",
              "locations": [
                {
                  "line": 1,
                  "column": 65
                }
              ],
              "path": [
                "event",
                "order",
                "number"
              ],
              "extensions": {
                "exception": {
                  "code": "GraphQLError"
                }
              }
            }
          ]
        }
        "###);
    }

    #[tokio::test]
    async fn unresolvable_abstract_types_are_errors() {
        let root = EventRoot::new(
            "ORDER_CREATED",
            json!({ "issuer": { "__typename": "Order", "id": "1" } }),
        );

        let result = execute(
            &Resolvers::new(),
            "subscription { event { issuer { ... on App { id } } } }",
            root,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(result.data, Some(Map::from_iter([(
            "event".to_string(),
            json!({ "issuer": null })
        )])));
        assert_eq!(
            result.errors[0].to_string(),
            "Could not determine the concrete type of 'Issuer' for field 'issuer'"
        );
    }

    #[tokio::test]
    async fn resolvers_and_deferred_values() {
        let resolvers = Resolvers::new()
            .with_field(
                "ProductCreated",
                "product",
                |_parent: &Value, _field: &ValidatedField, _context: &ExecutionContext| -> Result<FieldValue, FieldError> {
                    Ok(FieldValue::deferred(async {
                        tokio::task::yield_now().await;
                        Ok(json!({ "id": "UHJvZHVjdDox" }).into())
                    }))
                },
            )
            .with_field(
                "Product",
                "variants",
                |parent: &Value, _field: &ValidatedField, _context: &ExecutionContext| -> Result<FieldValue, FieldError> {
                    let product_id = parent["id"].clone();
                    Ok(FieldValue::List(
                        (1..=2)
                            .map(|n| {
                                let product_id = product_id.clone();
                                FieldValue::deferred(async move {
                                    Ok(json!({ "id": format!("{}-{n}", product_id.as_str().unwrap_or_default()) }).into())
                                })
                            })
                            .collect(),
                    ))
                },
            )
            .with_field(
                "Product",
                "thumbnail",
                |_parent: &Value, field: &ValidatedField, _context: &ExecutionContext| -> Result<FieldValue, FieldError> {
                    Ok(json!(format!(
                        "thumbnail-{}.{}",
                        field.argument("size").map(|s| s.to_string()).unwrap_or_default(),
                        match field.argument("format") {
                            Some(async_graphql_value::ConstValue::Enum(format)) => format.to_lowercase(),
                            _ => "png".to_string(),
                        }
                    ))
                    .into())
                },
            );

        let result = execute_to_json(
            &resolvers,
            r#"
            subscription {
                event {
                    ... on ProductCreated {
                        product {
                            id
                            thumbnail(format: WEBP)
                            variants { id }
                        }
                    }
                }
            }
            "#,
            EventRoot::new("PRODUCT_CREATED", json!({})),
        )
        .await;

        assert_json_snapshot!(result, @r###"
        {
          "data": {
            "event": {
              "product": {
                "id": "UHJvZHVjdDox",
                "thumbnail": "thumbnail-256.webp",
                "variants": [
                  {
                    "id": "UHJvZHVjdDox-1"
                  },
                  {
                    "id": "UHJvZHVjdDox-2"
                  }
                ]
              }
            }
          },
          "errors": []
        }
        "###);
    }

    #[tokio::test]
    async fn failed_list_item_nulls_non_null_list() {
        let resolvers = Resolvers::new().with_field(
            "Product",
            "variants",
            |_parent: &Value, _field: &ValidatedField, _context: &ExecutionContext| -> Result<FieldValue, FieldError> {
                Ok(FieldValue::List(vec![
                    json!({ "id": "1" }).into(),
                    FieldValue::deferred(async { Err(FieldError::graphql("Variant unavailable")) }),
                ]))
            },
        );

        let result = execute(
            &resolvers,
            "subscription { event { ... on ProductCreated { product { id variants { id } } } } }",
            EventRoot::new("PRODUCT_CREATED", json!({ "product": { "id": "1" } })),
        )
        .await
        .unwrap()
        .unwrap();

        // [ProductVariant!]! cannot hold the failed item, so the (nullable) product becomes null
        assert_eq!(
            Value::Object(result.data.unwrap()),
            json!({ "event": { "product": null } })
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].path,
            vec![
                PathSegment::from("event"),
                PathSegment::from("product"),
                PathSegment::from("variants"),
                PathSegment::Index(1),
            ]
        );
    }

    struct Replay(Vec<Value>);

    #[async_trait]
    impl SubscriptionResolver for Replay {
        async fn subscribe<'a>(
            &'a self,
            _root: &'a EventRoot,
            _field: &'a ValidatedField,
            _context: &'a ExecutionContext,
        ) -> Result<BoxStream<'a, Result<FieldValue, FieldError>>, FieldError> {
            if self.0.is_empty() {
                return Err(FieldError::graphql("Nothing to replay"));
            }
            Ok(stream::iter(self.0.iter().map(|order| Ok(order.clone().into()))).boxed())
        }
    }

    #[tokio::test]
    async fn only_the_first_result_is_used() {
        let resolvers = Resolvers::new().with_subscription(
            "orderUpdated",
            Replay(vec![
                json!({ "id": "1", "number": "1001" }),
                json!({ "id": "2", "number": "1002" }),
            ]),
        );

        let result = execute(
            &resolvers,
            r#"subscription { orderUpdated(channel: "default") { number } }"#,
            order_created(),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(
            Value::Object(result.data.unwrap()),
            json!({ "orderUpdated": { "number": "1001" } })
        );
    }

    #[tokio::test]
    async fn empty_and_failed_subscriptions() {
        struct Silent;

        #[async_trait]
        impl SubscriptionResolver for Silent {
            async fn subscribe<'a>(
                &'a self,
                _root: &'a EventRoot,
                _field: &'a ValidatedField,
                _context: &'a ExecutionContext,
            ) -> Result<BoxStream<'a, Result<FieldValue, FieldError>>, FieldError> {
                Ok(stream::empty().boxed())
            }
        }

        let query = r#"subscription { orderUpdated(channel: "default") { id } }"#;

        let silent = Resolvers::new().with_subscription("orderUpdated", Silent);
        assert!(execute(&silent, query, order_created()).await.unwrap().is_none());

        let failing = Resolvers::new().with_subscription("orderUpdated", Replay(vec![]));
        let error = execute(&failing, query, order_created()).await.unwrap_err();
        assert_eq!(error.to_string(), "Nothing to replay");
        assert_eq!(error.path, vec![PathSegment::from("orderUpdated")]);
    }

    #[tokio::test]
    async fn nested_type_conditions_must_all_apply() {
        let root = EventRoot::new("ORDER_CREATED", json!({ "version": "3.20" }));

        let result = execute_to_json(
            &Resolvers::new(),
            "subscription { event { ... on ProductCreated { ... on Event { version } } } }",
            root,
        )
        .await;

        assert_json_snapshot!(result, @r###"
        {
          "data": {
            "event": {}
          },
          "errors": []
        }
        "###);
    }

    #[tokio::test]
    async fn repeated_fields_are_resolved_once_with_all_subfields() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counted = calls.clone();
        let resolvers = Resolvers::new().with_field(
            "OrderCreated",
            "order",
            move |parent: &Value, _field: &ValidatedField, _context: &ExecutionContext| -> Result<FieldValue, FieldError> {
                counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(parent["order"].clone().into())
            },
        );
        let root = EventRoot::new("ORDER_CREATED", json!({ "order": { "id": "1" } }));

        let result = execute(
            &resolvers,
            "subscription { event { ... on OrderCreated { order { number } } ... on OrderCreated { order { id } } } }",
            root,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(
            Value::Object(result.data.unwrap()),
            json!({ "event": { "order": null } })
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].to_string(),
            "Cannot return null for non-nullable field 'number'"
        );
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
