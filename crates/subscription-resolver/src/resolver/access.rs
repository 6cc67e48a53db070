// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use common::context::ExecutionContext;

use crate::error::FieldError;

/// Ensure the app owning the payload holds at least one of `permissions`.
///
/// Payloads generated without an owner may not include protected fields.
pub fn ensure_app_permissions(
    context: &ExecutionContext,
    permissions: &[&str],
) -> Result<(), FieldError> {
    match &context.app {
        Some(app) if app.has_any_permission(permissions) => Ok(()),
        _ => Err(FieldError::PermissionDenied {
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }),
    }
}
