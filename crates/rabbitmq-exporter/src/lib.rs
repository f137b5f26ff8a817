//! RabbitMQ queue-depth exporter library entry.
//!
//! This crate wires the management API client, the poll loop, the metrics
//! registry and the scrape routes together. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod broker;
pub mod config;
pub mod obs;
pub mod ops;
pub mod poller;
pub mod router;
