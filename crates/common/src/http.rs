// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::OnceLock;

use crate::env_const::{INSECURE_PORT, SECURE_PORT};
use crate::settings::{HostResolver, PayloadSettings};

pub const WEBHOOK_REQUEST_PATH: &str = "/graphql/";

/// Represents a HTTP request from which information can be extracted
pub trait RequestHead {
    // return all header values that have the following key
    fn get_headers(&self, key: &str) -> Vec<String>;

    // return the first header
    fn get_header(&self, key: &str) -> Option<String> {
        self.get_headers(&key.to_lowercase()).first().cloned()
    }

    fn get_path(&self) -> String;

    fn get_method(&self) -> http::Method;
}

/// The request that webhook payloads are generated under.
///
/// No client actually sent it: it only gives resolvers the usual request shape (for example, to
/// build absolute URLs). The host name is discovered on first use.
pub struct WebhookRequest {
    secure: bool,
    host_resolver: HostResolver,
    server_name: OnceLock<String>,
}

impl WebhookRequest {
    pub fn new(settings: &PayloadSettings) -> Self {
        Self {
            secure: settings.enable_ssl,
            host_resolver: settings.host_resolver.clone(),
            server_name: OnceLock::new(),
        }
    }

    pub fn server_name(&self) -> &str {
        self.server_name.get_or_init(|| (self.host_resolver)())
    }

    pub fn server_port(&self) -> u16 {
        if self.secure {
            SECURE_PORT
        } else {
            INSECURE_PORT
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Absolute URL for `location` (which must start with `/`) on the public host.
    pub fn build_absolute_uri(&self, location: &str) -> String {
        // The port always matches the scheme's default, so it is never spelled out
        format!("{}://{}{}", self.scheme(), self.server_name(), location)
    }
}

impl RequestHead for WebhookRequest {
    fn get_headers(&self, key: &str) -> Vec<String> {
        match key.to_lowercase().as_str() {
            "host" => vec![self.server_name().to_string()],
            "x-forwarded-proto" if self.secure => vec!["https".to_string()],
            _ => vec![],
        }
    }

    fn get_path(&self) -> String {
        WEBHOOK_REQUEST_PATH.to_string()
    }

    fn get_method(&self) -> http::Method {
        http::Method::GET
    }
}
