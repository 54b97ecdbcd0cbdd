//! Dispatch-table tests: response/event lookup, envelope shape checks, the
//! event framing offset, and opcode collision behavior in both modes.

use opcodec::{
    CodecError, CommandDescriptor, DispatchTableBuilder, EventDescriptor, ParameterDescriptor,
    ResponseDescriptor, ResponseOutcome, Strictness, TypeMapper, Value,
};

fn param(name: &str, type_name: &str, length: usize, array_len: usize) -> ParameterDescriptor {
    ParameterDescriptor::new(name, type_name, length, array_len, "")
}

fn builder() -> DispatchTableBuilder {
    DispatchTableBuilder::new(TypeMapper::new(), Strictness::Lenient)
}

fn echo_command() -> CommandDescriptor {
    CommandDescriptor::new("echo", 0x02, vec![param("value", "uint8_t", 1, 1)]).with_response(
        ResponseDescriptor::new("echo", 0x02, vec![param("value", "uint8_t", 1, 1)]),
    )
}

fn started_event() -> EventDescriptor {
    EventDescriptor::new(
        "started",
        0x81,
        "Device started.",
        vec![
            param("count", "uint16_t", 2, 1),
            param("data", "uint8_t", 1, 4),
        ],
    )
}

#[test]
fn event_dispatch_scenario() {
    // Byte 0 is framing, byte 1 the opcode, the rest the payload.
    let generated = builder().build(&[], &[started_event()]).expect("build");
    let record = generated
        .events
        .dispatch(&[0xAA, 0x81, 0x05, 0x00, 0x01, 0x02])
        .expect("dispatch")
        .expect("known opcode");
    assert_eq!(record.name(), "Started");
    assert_eq!(record.opcode(), 0x81);
    assert_eq!(record.get("count"), Some(&Value::U16(5)));
    assert_eq!(record.get("data"), Some(&Value::Bytes(vec![0x01, 0x02])));
}

#[test]
fn unknown_event_opcode_is_not_an_error() {
    let generated = builder().build(&[], &[started_event()]).expect("build");
    assert!(generated.events.dispatch(&[0xAA, 0x7F]).expect("dispatch").is_none());
}

#[test]
fn short_event_buffer_is_type_mismatch() {
    let generated = builder().build(&[], &[started_event()]).expect("build");
    for buf in [&[][..], &[0xAA][..]] {
        let err = generated.events.dispatch(buf).expect_err("shape");
        assert!(matches!(err, CodecError::TypeMismatch(_)));
    }
}

#[test]
fn response_dispatch_scenario() {
    // Empty payload returns the bare name; a non-empty payload decodes.
    let generated = builder().build(&[echo_command()], &[]).expect("build");

    let outcome = generated
        .responses
        .dispatch(&[0x02])
        .expect("dispatch")
        .expect("known opcode");
    assert_eq!(outcome, ResponseOutcome::Status("Echo".to_string()));

    let outcome = generated
        .responses
        .dispatch(&[0x02, 0x07])
        .expect("dispatch")
        .expect("known opcode");
    match outcome {
        ResponseOutcome::Record(record) => {
            assert_eq!(record.name(), "Echo");
            assert_eq!(record.get("value"), Some(&Value::U8(7)));
        }
        other => panic!("expected decoded record, got {:?}", other),
    }
}

#[test]
fn unknown_response_opcode_is_not_an_error() {
    let generated = builder().build(&[echo_command()], &[]).expect("build");
    assert!(generated.responses.dispatch(&[0x55, 0x01]).expect("dispatch").is_none());
}

#[test]
fn empty_envelope_is_type_mismatch() {
    let generated = builder().build(&[echo_command()], &[]).expect("build");
    let err = generated.responses.dispatch(&[]).expect_err("shape");
    assert!(matches!(err, CodecError::TypeMismatch(_)));
}

#[test]
fn response_table_skips_commands_without_response_params() {
    // No response at all, and a zero-parameter response: neither gets an
    // entry, so dispatch reports "nothing to decode".
    let bare = CommandDescriptor::new("radio reset", 0x0E, vec![]);
    let status_only = CommandDescriptor::new("enable", 0x0F, vec![])
        .with_response(ResponseDescriptor::new("enable", 0x0F, vec![]));
    let generated = builder().build(&[bare, status_only], &[]).expect("build");

    assert!(generated.responses.is_empty());
    assert!(generated.responses.dispatch(&[0x0E]).expect("dispatch").is_none());
    assert!(generated.responses.dispatch(&[0x0F]).expect("dispatch").is_none());
}

#[test]
fn command_encoders_are_generated_in_order() {
    let generated = builder()
        .build(&[echo_command(), CommandDescriptor::new("radio reset", 0x0E, vec![])], &[])
        .expect("build");
    let names: Vec<&str> = generated.commands.iter().map(|c| c.name()).collect();
    assert_eq!(names, ["Echo", "RadioReset"]);
    assert_eq!(generated.command("RadioReset").map(|c| c.opcode()), Some(0x0E));
}

#[test]
fn event_listing_is_sorted_by_name() {
    let generated = builder()
        .build(
            &[],
            &[
                EventDescriptor::new("tx complete", 0x83, "", vec![]),
                EventDescriptor::new("started", 0x81, "", vec![]),
            ],
        )
        .expect("build");
    let names: Vec<&str> = generated.events.opcodes().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["Started", "TxComplete"]);
    assert_eq!(generated.events.opcode_by_name("TxComplete"), Some(0x83));
    assert_eq!(generated.events.opcode_by_name("Missing"), None);
}

#[test]
fn lenient_event_collision_keeps_later_entry() {
    let first = EventDescriptor::new("first", 0x90, "", vec![param("a", "uint8_t", 1, 1)]);
    let second = EventDescriptor::new("second", 0x90, "", vec![param("b", "uint8_t", 1, 1)]);
    let generated = builder().build(&[], &[first, second]).expect("build");

    assert_eq!(generated.events.len(), 1);
    let record = generated
        .events
        .dispatch(&[0x00, 0x90, 0x07])
        .expect("dispatch")
        .expect("known opcode");
    assert_eq!(record.name(), "Second");
    assert_eq!(record.get("b"), Some(&Value::U8(7)));
}

#[test]
fn strict_event_collision_is_an_error() {
    let first = EventDescriptor::new("first", 0x90, "", vec![]);
    let second = EventDescriptor::new("second", 0x90, "", vec![]);
    let err = DispatchTableBuilder::new(TypeMapper::new(), Strictness::Strict)
        .build(&[], &[first, second])
        .expect_err("collision");
    assert!(matches!(
        err,
        CodecError::OpcodeCollision { opcode: 0x90, .. }
    ));
}

#[test]
fn lenient_response_collision_keeps_later_entry() {
    let a = CommandDescriptor::new("get a", 0x40, vec![])
        .with_response(ResponseDescriptor::new("get a", 0x40, vec![param("a", "uint8_t", 1, 1)]));
    let b = CommandDescriptor::new("get b", 0x40, vec![])
        .with_response(ResponseDescriptor::new("get b", 0x40, vec![param("b", "uint8_t", 1, 1)]));
    let generated = builder().build(&[a, b], &[]).expect("build");

    assert_eq!(generated.responses.len(), 1);
    assert_eq!(generated.responses.get(0x40).map(|e| e.name.as_str()), Some("GetB"));
}

#[test]
fn strict_command_collision_is_an_error() {
    let a = CommandDescriptor::new("get a", 0x40, vec![]);
    let b = CommandDescriptor::new("get b", 0x40, vec![]);
    let err = DispatchTableBuilder::new(TypeMapper::new(), Strictness::Strict)
        .build(&[a, b], &[])
        .expect_err("collision");
    assert!(matches!(
        err,
        CodecError::OpcodeCollision { opcode: 0x40, .. }
    ));
}

#[test]
fn response_decode_error_propagates_through_dispatch() {
    // Payload shorter than the response layout: the decoder's short read
    // surfaces instead of being swallowed as "no decoded value".
    let cmd = CommandDescriptor::new("state get", 0x42, vec![]).with_response(
        ResponseDescriptor::new("state get", 0x42, vec![param("count", "uint32_t", 4, 1)]),
    );
    let generated = builder().build(&[cmd], &[]).expect("build");
    let err = generated.responses.dispatch(&[0x42, 0x01]).expect_err("short");
    assert!(matches!(err, CodecError::Io(_)));
}
