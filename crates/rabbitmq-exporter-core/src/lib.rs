//! rabbitmq-exporter core: the broker wire model and the shared error surface.
//!
//! This crate holds what both the exporter runtime and its tests agree on: the
//! shape of a queue entry returned by the management API and the error type
//! every fallible path reports through. It carries no runtime, transport, or
//! metrics dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! A malformed broker response must surface as `ExporterError::Decode`, never
//! take the exporter down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod queue;

/// Shared result type.
pub use error::{ErrorClass, ExporterError, Result};
pub use queue::{decode_queue_list, QueueRecord};
