// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Schema and query fixtures shared by the unit tests.

use crate::schema::Schema;

pub(crate) const TEST_SCHEMA: &str = r#"
    interface Event {
        issuedAt: String
        version: String
        issuer: Issuer
    }

    union Issuer = App | Staff

    type App {
        id: ID!
        name: String
    }

    type Staff {
        id: ID!
        email: String
    }

    type ProductCreated implements Event {
        issuedAt: String
        version: String
        issuer: Issuer
        product: Product
    }

    type OrderCreated implements Event {
        issuedAt: String
        version: String
        issuer: Issuer
        order: Order
    }

    type Product {
        id: ID!
        name: String
        privateMetadata: [MetadataItem!]
        thumbnail(size: Int = 256, format: ThumbnailFormat): String
        variants: [ProductVariant!]!
    }

    enum ThumbnailFormat {
        WEBP
        AVIF
    }

    type ProductVariant {
        id: ID!
        sku: String
    }

    type MetadataItem {
        key: String!
        value: String!
    }

    type Order {
        id: ID!
        number: String!
        total: Float
    }

    type Query {
        product(id: ID!): Product
    }

    type Subscription {
        event: Event
        orderUpdated(channel: String!): Order
    }
"#;

pub(crate) fn test_schema() -> Schema {
    Schema::parse(TEST_SCHEMA).unwrap()
}
