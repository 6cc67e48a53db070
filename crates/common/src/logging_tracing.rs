// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! # Tracing setup
//!
//! Payload generation is instrumented with Rust's `tracing` framework. Libraries in this workspace
//! only emit events; calling [`init`] installs a global subscriber that prints them to the console.
//!
//! The filter is read from the `WEBHOOK_LOG` environment variable, which follows the same
//! conventions as `RUST_LOG` (for example `WEBHOOK_LOG=subscription_resolver=debug`). Without it,
//! only warnings and errors are shown.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, prelude::*};

use crate::env_const::WEBHOOK_LOG;

/// Initialize the tracing subscriber.
///
/// Fails if a global subscriber has already been installed (for example, by the embedding
/// application).
pub fn init() -> Result<(), LoggingError> {
    let fmt_layer = tracing_subscriber::fmt::layer().compact();
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(WEBHOOK_LOG)
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Could not install the tracing subscriber: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}
