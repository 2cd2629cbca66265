// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tracing setup.
//!
//! ```rust,ignore
//! use warden::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::for_cli(1, false))?;
//! ```
//!
//! Library code only emits `tracing` events: `info!` for lifecycle
//! transitions, `debug!` for authorization decisions, `warn!` for denials and
//! swallowed failures. The durable record of those events is the
//! [`EventLog`](crate::events::EventLog), which is independent of this module.

mod init;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
