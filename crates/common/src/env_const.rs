// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

pub const WEBHOOK_PLUGINS: &str = "WEBHOOK_PLUGINS";
pub const WEBHOOK_ENABLE_SSL: &str = "WEBHOOK_ENABLE_SSL";
pub const WEBHOOK_PUBLIC_HOST: &str = "WEBHOOK_PUBLIC_HOST";
pub const WEBHOOK_LOG: &str = "WEBHOOK_LOG";

pub const DEFAULT_PUBLIC_HOST: &str = "localhost";

pub const INSECURE_PORT: u16 = 80;
pub const SECURE_PORT: u16 = 443;
