use idl_decoder::{
    event::EVENT_IX_TAG, probe_cpi_event, schema::Schema, CpiEventProbe, DecodedValue,
    DecoderConfig, IdlDecoder,
};
use idl_decoder_tests::{
    anchor_discriminator, counter_changed_fields, counter_registry, counter_schema, cpi_event_data,
    test_key, COUNTER_PROGRAM_ID,
};
use pretty_assertions::assert_eq;
use solana_pubkey::Pubkey;

fn decoder() -> IdlDecoder {
    IdlDecoder::new(counter_registry(), DecoderConfig::default())
}

#[test]
fn test_short_payloads_are_not_events() {
    let schema = counter_schema();
    let config = DecoderConfig::default();
    let mut full = EVENT_IX_TAG.to_vec();
    full.extend_from_slice(&anchor_discriminator("event", "CounterChanged"));

    for len in 0..16 {
        let data = bs58::encode(&full[..len]).into_string();
        assert_eq!(
            probe_cpi_event(&COUNTER_PROGRAM_ID, &data, Some(&schema), &config),
            CpiEventProbe::NotAnEvent,
            "payload of {len} bytes"
        );
    }
}

#[test]
fn test_decodes_embedded_event() {
    let fields = counter_changed_fields(&test_key(2), 41, 42, &[0]);
    let payload = cpi_event_data("CounterChanged", &fields);
    let bytes = bs58::decode(&payload).into_vec().unwrap();
    assert_eq!(bytes[..8], [0xe4, 0x45, 0xa5, 0x2e, 0x51, 0xcb, 0x9a, 0x1d]);
    assert_eq!(bytes[8..16], anchor_discriminator("event", "CounterChanged"));

    let probe = decoder().probe_cpi_event(&COUNTER_PROGRAM_ID, &payload);

    let CpiEventProbe::Event(event) = probe else {
        panic!("expected an event, got {probe:?}");
    };
    assert_eq!(event.name.as_deref(), Some("CounterChanged"));
    assert_eq!(event.decode_error, None);
    let data = event.data.unwrap();
    assert_eq!(data.get("new_value").and_then(DecodedValue::as_u64), Some(42));
    assert_eq!(
        data.get("mode"),
        Some(&DecodedValue::Enum {
            variant: "Increment".to_string(),
            fields: None
        })
    );
}

#[test]
fn test_instruction_tag_is_not_checked() {
    let mut bytes = vec![0u8; 8];
    bytes.extend_from_slice(&anchor_discriminator("event", "Configured"));
    bytes.extend_from_slice(&[7, 0, 0]);
    let probe = decoder().probe_cpi_event(&COUNTER_PROGRAM_ID, &bs58::encode(bytes).into_string());
    assert!(probe.is_event());
}

#[test]
fn test_failed_fields_still_classify_as_event() {
    let probe = decoder().probe_cpi_event(
        &COUNTER_PROGRAM_ID,
        &cpi_event_data("CounterChanged", &[1, 2, 3]),
    );
    assert_eq!(
        probe,
        CpiEventProbe::Event(idl_decoder::EventDecode {
            name: Some("CounterChanged".to_string()),
            data: None,
            decode_error: Some(
                "CounterChanged discriminator matched; argument decode failed".to_string()
            ),
        })
    );
}

#[test]
fn test_ordinary_instructions_are_not_events() {
    let decoder = decoder();

    // A regular `set` instruction long enough to be probed.
    let mut set = anchor_discriminator("global", "set").to_vec();
    set.extend_from_slice(&5u64.to_le_bytes());
    set.extend_from_slice(&[0; 8]);
    let data = bs58::encode(&set).into_string();
    assert_eq!(
        decoder.probe_cpi_event(&COUNTER_PROGRAM_ID, &data),
        CpiEventProbe::NotAnEvent
    );

    let fields = counter_changed_fields(&test_key(2), 0, 1, &[0]);
    let event = cpi_event_data("CounterChanged", &fields);
    assert_eq!(
        decoder.probe_cpi_event(&Pubkey::new_unique(), &event),
        CpiEventProbe::NotAnEvent
    );
    assert_eq!(
        decoder.probe_cpi_event(&COUNTER_PROGRAM_ID, "0OIl"),
        CpiEventProbe::NotAnEvent
    );

    let no_events = Schema {
        events: Vec::new(),
        ..counter_schema()
    };
    assert_eq!(
        probe_cpi_event(
            &COUNTER_PROGRAM_ID,
            &event,
            Some(&no_events),
            &DecoderConfig::default()
        ),
        CpiEventProbe::NotAnEvent
    );
}
