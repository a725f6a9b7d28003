use idl_decoder::{extract_log_events, DecodedValue, DecoderConfig, IdlDecoder, SchemaRegistry};
use idl_decoder_tests::{
    counter_changed_fields, counter_registry, data_line, event_payload, failed_line, invoke_line,
    success_line, test_key, COUNTER_PROGRAM_ID,
};
use pretty_assertions::assert_eq;
use solana_pubkey::Pubkey;

fn counter_changed(old_value: u64, new_value: u64) -> String {
    let fields = counter_changed_fields(&test_key(2), old_value, new_value, &[1]);
    data_line(&event_payload("CounterChanged", &fields))
}

fn decoder() -> IdlDecoder {
    IdlDecoder::new(counter_registry(), DecoderConfig::default())
}

#[test]
fn test_single_event_in_first_instruction() {
    let logs = [
        invoke_line(&COUNTER_PROGRAM_ID, 1),
        counter_changed(5, 4),
        success_line(&COUNTER_PROGRAM_ID),
    ];
    let events = decoder().extract_log_events(&logs);

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.name.as_deref(), Some("CounterChanged"));
    assert_eq!(event.program_id, COUNTER_PROGRAM_ID);
    assert_eq!(event.instruction_index, 0);
    assert!(!event.is_cpi);
    assert_eq!(event.decode_error, None);

    insta::assert_json_snapshot!(event.data, @r###"
    {
      "counter": "8qbHbw2BbbTHBW1sbeqakYXVKRQM8Ne7pLK7m6CVfeR",
      "old_value": 5,
      "new_value": 4,
      "mode": {
        "Decrement": null
      }
    }
    "###);
}

#[test]
fn test_data_outside_invocation_is_dropped() {
    let logs = [counter_changed(1, 2)];
    assert!(decoder().extract_log_events(&logs).is_empty());

    let logs = [
        invoke_line(&COUNTER_PROGRAM_ID, 1),
        success_line(&COUNTER_PROGRAM_ID),
        counter_changed(1, 2),
    ];
    assert!(decoder().extract_log_events(&logs).is_empty());
}

#[test]
fn test_empty_data_line_is_an_event() {
    let logs = [
        invoke_line(&COUNTER_PROGRAM_ID, 1),
        "Program data: ".to_string(),
        success_line(&COUNTER_PROGRAM_ID),
    ];
    let events = decoder().extract_log_events(&logs);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].program_id, COUNTER_PROGRAM_ID);
    assert_eq!(events[0].name, None);
    assert!(events[0]
        .decode_error
        .as_deref()
        .unwrap()
        .starts_with("discriminator  not found in schema counter"));
}

#[test]
fn test_instruction_index_follows_outermost_success() {
    let other = test_key(9);
    let logs = [
        invoke_line(&COUNTER_PROGRAM_ID, 1),
        counter_changed(0, 1),
        success_line(&COUNTER_PROGRAM_ID),
        invoke_line(&COUNTER_PROGRAM_ID, 1),
        invoke_line(&other, 2),
        success_line(&other),
        counter_changed(1, 2),
        success_line(&COUNTER_PROGRAM_ID),
        invoke_line(&COUNTER_PROGRAM_ID, 1),
        counter_changed(2, 3),
        failed_line(&COUNTER_PROGRAM_ID, "custom program error: 0x1"),
        invoke_line(&COUNTER_PROGRAM_ID, 1),
        counter_changed(3, 4),
        success_line(&COUNTER_PROGRAM_ID),
    ];
    let events = decoder().extract_log_events(&logs);
    let indices: Vec<usize> = events.iter().map(|e| e.instruction_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 2]);
}

#[test]
fn test_nested_event_is_attributed_to_inner_program() {
    let outer = test_key(7);
    let logs = [
        invoke_line(&outer, 1),
        invoke_line(&COUNTER_PROGRAM_ID, 2),
        counter_changed(10, 11),
        success_line(&COUNTER_PROGRAM_ID),
        counter_changed(11, 12),
        success_line(&outer),
    ];
    let events = decoder().extract_log_events(&logs);

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].program_id, COUNTER_PROGRAM_ID);
    assert_eq!(events[0].name.as_deref(), Some("CounterChanged"));
    // `outer` has no schema bound.
    assert_eq!(events[1].program_id, outer);
    assert_eq!(events[1].name, None);
    assert_eq!(events[1].decode_error, None);
}

#[test]
fn test_event_classification() {
    let mut failed_fields = counter_changed_fields(&test_key(2), 1, 2, &[]);
    failed_fields.truncate(40);
    let logs = [
        invoke_line(&COUNTER_PROGRAM_ID, 1),
        data_line(&event_payload("Unknown", &[0; 4])),
        data_line(&event_payload("CounterChanged", &failed_fields)),
        data_line(&event_payload("Configured", &[3, 0, 1, 2, 0, 0, 0, b'h', b'i'])),
        success_line(&COUNTER_PROGRAM_ID),
    ];
    let events = decoder().extract_log_events(&logs);
    assert_eq!(events.len(), 3);

    let unmatched = &events[0];
    assert_eq!(unmatched.name, None);
    assert!(unmatched
        .decode_error
        .as_deref()
        .unwrap()
        .contains("known: CounterChanged:62359db0c1a747f2, Configured:2136500eb18952eb"));

    let failed = &events[1];
    assert_eq!(failed.name.as_deref(), Some("CounterChanged"));
    assert_eq!(failed.data, None);
    assert!(failed
        .decode_error
        .as_deref()
        .unwrap()
        .starts_with("CounterChanged discriminator matched; argument decode failed: field `new_value`"));

    let decoded = &events[2];
    let data = decoded.data.as_ref().unwrap();
    assert_eq!(data.get("multiplier").and_then(DecodedValue::as_u64), Some(3));
    assert_eq!(
        data.get("note"),
        Some(&DecodedValue::Option(Some(Box::new(DecodedValue::String(
            "hi".to_string()
        )))))
    );
}

#[test]
fn test_works_with_any_resolver() {
    let logs = [
        invoke_line(&COUNTER_PROGRAM_ID, 1),
        counter_changed(1, 0),
        success_line(&COUNTER_PROGRAM_ID),
    ];
    let empty = extract_log_events(&logs, &SchemaRegistry::new(), &DecoderConfig::default());
    assert_eq!(empty.len(), 1);
    assert_eq!(empty[0].name, None);

    let shared = std::sync::Arc::new(counter_registry());
    let events = extract_log_events(&logs, &shared, &DecoderConfig::default());
    assert_eq!(events[0].name.as_deref(), Some("CounterChanged"));
    assert_ne!(events[0].program_id, Pubkey::default());
}
