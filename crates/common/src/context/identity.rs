// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::Serialize;

/// Who (or what) caused the event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requestor {
    User { id: String, email: String },
    App(App),
}

impl Requestor {
    pub fn identity(&self) -> String {
        match self {
            Requestor::User { id, .. } => format!("user:{id}"),
            Requestor::App(app) => format!("app:{}", app.id),
        }
    }
}

/// An installed app. As the owner of a webhook, its permissions decide which protected fields
/// can appear in the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct App {
    pub id: String,
    pub name: String,
    pub permissions: Vec<String>,
}

impl App {
    pub fn new(id: impl Into<String>, name: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions,
        }
    }

    /// An empty `permissions` list is trivially satisfied.
    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions.is_empty()
            || permissions
                .iter()
                .any(|required| self.permissions.iter().any(|p| p == required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities() {
        let user = Requestor::User {
            id: "7".into(),
            email: "staff@example.com".into(),
        };
        let app = Requestor::App(App::new("3", "Invoicing", vec![]));

        assert_eq!(user.identity(), "user:7");
        assert_eq!(app.identity(), "app:3");
    }

    #[test]
    fn permissions() {
        let app = App::new("1", "Orders", vec!["MANAGE_ORDERS".into()]);

        assert!(app.has_any_permission(&[]));
        assert!(app.has_any_permission(&["MANAGE_USERS", "MANAGE_ORDERS"]));
        assert!(!app.has_any_permission(&["MANAGE_USERS"]));
    }
}
