//! End-to-end tests over a realistic device message catalog.
//!
//! The catalog models a small battery-powered device with a command/response
//! frame family: every frame starts with a 1-byte command discriminant, and
//! the top-level `message` field dispatches on it.

use bytepattern::{CodecError, ErrorKind, Schema, Value};
use serde_json::json;
use std::sync::Once;
use tracing::Level;

static INIT_TRACING: Once = Once::new();

/// Install a compact tracing subscriber once for the whole test binary.
fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .without_time()
            .try_init();
    });
}

/// Message catalog for the test device.
///
/// - command 1: status report (battery level, BCD production year, uptime)
/// - command 2: rename request (15-byte zero-padded item name)
/// - command 3: schedule upload (up to four hour/minute slots)
fn device_schema() -> Schema {
    init_tracing();
    Schema::from_json(
        &json!([
            {
                "id": "message", "name": "command",
                "type": "index", "length": 1, "format": "int",
                "value": [
                    {"value": 1, "id": "status-report"},
                    {"value": 2, "id": "rename"},
                    {"value": 3, "id": "schedule-upload"}
                ]
            },
            {
                "id": "command-byte", "as-template": "command-byte",
                "type": "fixed", "length": 1, "format": "int", "value": [0]
            },
            {
                "id": "status-report", "type": "combination", "length": 7,
                "value": [
                    {"template": "command-byte", "value": [1]},
                    {"name": "battery-level", "type": "variable", "length": 1, "format": "int"},
                    {"name": "year", "type": "variable", "length": 1, "format": "bcd"},
                    {"name": "uptime", "type": "variable", "length": 4, "format": "int.le"}
                ]
            },
            {
                "id": "rename", "type": "combination", "length": 16,
                "value": [
                    {"template": "command-byte", "value": [2]},
                    {"name": "name", "type": "variable", "length": 15, "format": "string"}
                ]
            },
            {
                "id": "schedule-upload", "type": "combination", "length": 9,
                "value": [
                    {"template": "command-byte", "value": [3]},
                    {"name": "slots", "type": "array", "length": 8,
                     "value": [{
                         "type": "combination", "length": 2,
                         "value": [
                             {"name": "hour", "type": "variable", "length": 1, "format": "bcd"},
                             {"name": "minute", "type": "variable", "length": 1, "format": "bcd"}
                         ]
                     }]}
                ]
            }
        ])
        .to_string(),
    )
    .expect("device catalog compiles")
}

#[test]
fn status_report_round_trips_through_dispatch() {
    let schema = device_schema();
    let report = Value::from_json(&json!({
        "command": 1,
        "battery-level": 87,
        "year": 17,
        "uptime": 3600
    }))
    .unwrap();

    let bytes = schema.encode(Some(&report), None).unwrap();
    assert_eq!(bytes.as_ref(), &[1, 87, 0x17, 0x10, 0x0E, 0, 0]);

    let decoded = schema.decode(&bytes, 0, Some(bytes.len()), None).unwrap();
    assert_eq!(
        decoded,
        Value::from_json(&json!({
            "battery-level": 87,
            "year": 17,
            "uptime": 3600
        }))
        .unwrap()
    );
}

#[test]
fn rename_frame_matches_wire_layout() {
    let schema = device_schema();
    let request = Value::from_json(&json!({"command": 2, "name": "item name"})).unwrap();

    let bytes = schema.encode(Some(&request), None).unwrap();
    assert_eq!(bytes.len(), 16);
    assert_eq!(
        bytes.as_ref(),
        [
            2, b'i', b't', b'e', b'm', b' ', b'n', b'a', b'm', b'e',
            0, 0, 0, 0, 0, 0
        ]
    );

    let decoded = schema.decode(&bytes, 0, None, None).unwrap();
    assert_eq!(
        decoded.get("name").and_then(Value::as_str),
        Some("item name")
    );
}

#[test]
fn index_decode_matches_direct_target_decode() {
    // The discriminant byte stays included in both the outer bound and the
    // target's own decode: dispatching through the index and decoding the
    // target directly see the same bytes.
    let schema = device_schema();
    let frame = [2u8, b'a', b'b', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

    let via_index = schema.decode(&frame, 0, Some(frame.len()), None).unwrap();
    let direct = schema
        .decode(&frame, 0, Some(frame.len()), Some("rename"))
        .unwrap();
    assert_eq!(via_index, direct);
}

#[test]
fn unregistered_discriminant_is_a_mismatch() {
    let schema = device_schema();
    let err = schema.decode(&[0xEE, 0, 0], 0, None, None).unwrap_err();
    assert!(matches!(err, CodecError::UnmatchedDiscriminant(_)));
    assert_eq!(err.kind(), ErrorKind::Mismatch);
}

#[test]
fn schedule_slots_fan_out_and_bound() {
    let schema = device_schema();
    let upload = Value::from_json(&json!({
        "command": 3,
        "slots": [
            {"hour": 9, "minute": 30},
            {"hour": 17, "minute": 45}
        ]
    }))
    .unwrap();

    let bytes = schema.encode(Some(&upload), None).unwrap();
    assert_eq!(bytes.as_ref(), &[3, 0x09, 0x30, 0x17, 0x45, 0, 0, 0, 0]);

    // Bounded decode: the slots array stops at its declared width, the
    // zero-padding decoding as 00:00 slots.
    let decoded = schema.decode(&bytes, 0, Some(bytes.len()), None).unwrap();
    let slots = decoded.get("slots").and_then(Value::as_seq).unwrap();
    assert_eq!(slots.len(), 4);
    assert_eq!(
        slots[1],
        Value::from_json(&json!({"hour": 17, "minute": 45})).unwrap()
    );
    assert_eq!(
        slots[3],
        Value::from_json(&json!({"hour": 0, "minute": 0})).unwrap()
    );

    // Five slots exceed the declared 8-byte capacity.
    let oversized = Value::from_json(&json!({
        "command": 3,
        "slots": [
            {"hour": 1, "minute": 0}, {"hour": 2, "minute": 0},
            {"hour": 3, "minute": 0}, {"hour": 4, "minute": 0},
            {"hour": 5, "minute": 0}
        ]
    }))
    .unwrap();
    let err = schema.encode(Some(&oversized), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Length);
}

#[test]
fn template_consumers_keep_local_attributes() {
    // Each frame body re-declares its own `value` literal while inheriting
    // type/length/format from the shared command-byte template.
    let schema = device_schema();
    let status = schema
        .encode(
            Some(&Value::from_json(&json!({"command": 1, "battery-level": 1, "year": 1, "uptime": 1})).unwrap()),
            None,
        )
        .unwrap();
    let rename = schema
        .encode(
            Some(&Value::from_json(&json!({"command": 2, "name": "x"})).unwrap()),
            None,
        )
        .unwrap();
    assert_eq!(status[0], 1);
    assert_eq!(rename[0], 2);
}

#[test]
fn repeated_calls_are_deterministic() {
    let schema = device_schema();
    let report = Value::from_json(&json!({
        "command": 1, "battery-level": 50, "year": 24, "uptime": 12345
    }))
    .unwrap();

    let first = schema.encode(Some(&report), None).unwrap();
    let second = schema.encode(Some(&report), None).unwrap();
    assert_eq!(first, second);

    let d1 = schema.decode(&first, 0, None, None).unwrap();
    let d2 = schema.decode(&second, 0, None, None).unwrap();
    assert_eq!(d1, d2);
}

#[test]
fn decoded_frames_render_as_json_for_hosts() {
    let schema = device_schema();
    let bytes = schema
        .encode(
            Some(&Value::from_json(&json!({"command": 2, "name": "cam"})).unwrap()),
            None,
        )
        .unwrap();

    assert_eq!(
        bytepattern::hex::bytes_to_hex_string(&bytes[..4], "-"),
        "02-63-61-6D"
    );

    let decoded = schema.decode(&bytes, 0, None, None).unwrap();
    assert_eq!(decoded.to_json(), json!({"name": "cam"}));
}

#[test]
fn every_catalog_entry_is_addressable() {
    let schema = device_schema();
    let mut ids: Vec<&str> = schema.field_ids().collect();
    ids.sort_unstable();
    assert_eq!(
        ids,
        [
            "command-byte",
            "message",
            "rename",
            "schedule-upload",
            "status-report"
        ]
    );
}
