// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::http::WebhookRequest;
use crate::settings::PayloadSettings;

use super::{App, Requestor, Services};

/// Everything resolvers may consult while generating one payload.
///
/// A context is built fresh for every payload generation and dropped afterwards; nothing in it is
/// shared between generations.
pub struct ExecutionContext {
    pub request: WebhookRequest,
    pub requestor: Option<Requestor>,
    /// Whether the payload is for a synchronous webhook (whose response the caller waits on).
    pub sync_event: bool,
    pub request_time: DateTime<Utc>,
    /// The owner of the payload. Attached right before execution.
    pub app: Option<App>,

    enabled_plugins: Vec<String>,
    services: OnceCell<Services>,
}

/// Build the context for a payload generation. Performs no I/O: the host name and the services
/// are set up only when first needed.
pub fn build_context(
    settings: &PayloadSettings,
    requestor: Option<Requestor>,
    sync_event: bool,
) -> ExecutionContext {
    ExecutionContext {
        request: WebhookRequest::new(settings),
        requestor,
        sync_event,
        request_time: Utc::now(),
        app: None,
        enabled_plugins: settings.enabled_plugins.clone(),
        services: OnceCell::new(),
    }
}

impl ExecutionContext {
    pub async fn services(&self) -> &Services {
        self.services
            .get_or_init(|| async {
                debug!(plugins = ?self.enabled_plugins, "Initializing services");
                let requestor = self.requestor.clone();
                Services::new(
                    self.enabled_plugins.clone(),
                    Box::new(move || requestor.as_ref().map(Requestor::identity)),
                )
            })
            .await
    }

    pub fn services_initialized(&self) -> bool {
        self.services.initialized()
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app.as_ref().map(|app| app.id.as_str())
    }
}
