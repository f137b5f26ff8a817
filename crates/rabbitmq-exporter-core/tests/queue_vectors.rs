//! Management API response vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use rabbitmq_exporter_core::{decode_queue_list, ExporterError};

fn load(name: &str) -> Vec<u8> {
    fs::read(format!("tests/vectors/{name}")).unwrap()
}

#[test]
fn parse_single_queue() {
    let queues = decode_queue_list(&load("queues_single.json")).unwrap();
    assert_eq!(queues.len(), 1);
    let q = &queues[0];
    assert_eq!(q.name, "q1");
    assert_eq!(q.vhost, "/");
    assert_eq!(q.total_messages, 5);
    assert_eq!(q.ready_messages, 3);
    assert_eq!(q.unacknowledged_messages, 2);
}

#[test]
fn parse_full_management_payload() {
    let queues = decode_queue_list(&load("queues_management_full.json")).unwrap();
    assert_eq!(queues.len(), 2);

    assert_eq!(queues[0].name, "orders.created");
    assert_eq!(queues[0].vhost, "shop");
    assert_eq!(queues[0].total_messages, 17);
    assert_eq!(queues[0].ready_messages, 12);
    assert_eq!(queues[0].unacknowledged_messages, 5);

    // no stats reported yet
    assert_eq!(queues[1].name, "audit");
    assert_eq!(queues[1].total_messages, 0);
}

#[test]
fn parse_empty_list() {
    let queues = decode_queue_list(&load("queues_empty.json")).unwrap();
    assert!(queues.is_empty());
}

#[test]
fn negative_counter_is_rejected() {
    let err = decode_queue_list(&load("queues_negative.json")).expect_err("must fail");
    assert!(matches!(err, ExporterError::Decode(_)));
    assert_eq!(err.outcome(), "decode");
}

#[test]
fn truncated_body_is_rejected() {
    let err = decode_queue_list(br#"[{"name":"q1","vhost":"/","#).expect_err("must fail");
    assert!(matches!(err, ExporterError::Decode(_)));
}
