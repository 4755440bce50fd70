//! ACK and NACK construction

mod common;

use common::{ADT, WITH_NULLS, parse};
use octofhir_hl7::{AckCode, AckConfig, Message, MshHeader, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn assert_swapped(source: &Message, ack: &Message) {
    assert_eq!(source.get_value("MSH.3"), ack.get_value("MSH.5"));
    assert_eq!(source.get_value("MSH.4"), ack.get_value("MSH.6"));
    assert_eq!(source.get_value("MSH.5"), ack.get_value("MSH.3"));
    assert_eq!(source.get_value("MSH.6"), ack.get_value("MSH.4"));
    assert_eq!(source.get_value("MSH.10"), ack.get_value("MSH.10"));
    assert_eq!(source.get_value("MSH.10"), ack.get_value("MSA.2"));
}

#[test]
fn test_get_ack() {
    let message = parse(ADT);
    let ack = message.get_ack().unwrap();

    assert_swapped(&message, &ack);
    assert_eq!(ack.get_value("MSA.1"), "AA");
    assert_eq!(ack.get_value("MSH.9"), "ACK^O01");
    assert_eq!(ack.get_value("MSH.12"), "2.3");
    assert_eq!(ack.segment_count(), 2);
}

#[rstest]
#[case(AckCode::AR, "Error message")]
#[case(AckCode::AE, "Missing PID~segment")]
fn test_get_nack(#[case] code: AckCode, #[case] error: &str) {
    let message = parse(ADT);
    let nack = message.get_nack(code, error).unwrap();

    assert_swapped(&message, &nack);
    assert_eq!(nack.get_value("MSA.1"), code.as_str());
    assert_eq!(nack.get_value("MSA.3"), error);
}

#[test]
fn test_ack_keeps_source_profile() {
    let message = parse(WITH_NULLS);
    let ack = message.get_ack().unwrap();
    let wire = ack.serialize(false);

    assert!(wire.starts_with("MSH|^~\\&|RA|RF|SA|SF|"));
    assert!(wire.ends_with("MSA|AA|123\r\n"));
}

#[test]
fn test_ack_round_trips_through_parser() {
    let message = parse(ADT);
    let nack = message.get_nack(AckCode::AR, "Bad & worse").unwrap();
    let reparsed = parse(&nack.serialize(false));

    assert_eq!(reparsed.get_value("MSA.3"), "Bad & worse");
    assert_eq!(reparsed.get_value("MSA.2"), "934576120110613083617");
}

#[test]
fn test_configured_ack() {
    let message = parse(ADT);
    let config = AckConfig {
        message_type: "ACK".into(),
        echo_trigger_event: false,
    };
    let ack = message.build_ack(AckCode::CA, None, &config).unwrap();
    assert_eq!(ack.get_value("MSH.9"), "ACK");
    assert_eq!(ack.get_value("MSA.1"), "CA");
    assert_eq!(ack.get_value("MSA.3"), Value::Absent);
}

#[test]
fn test_add_segment_msh() {
    let mut message = Message::new();
    message
        .add_segment_msh(&MshHeader {
            sending_application: "test".into(),
            sending_facility: "sendingFacility".into(),
            receiving_application: "test".into(),
            receiving_facility: "test".into(),
            security: "test".into(),
            message_type: "ADR^A19".into(),
            message_control_id: "test".into(),
            processing_id: "D".into(),
            version: "2.5".into(),
        })
        .unwrap();

    assert_eq!(message.get_value("MSH.4"), "sendingFacility");
    assert_eq!(message.get_value("MSH.8"), "test");
    assert_eq!(message.get_value("MSH.9.1"), "ADR");
    assert_eq!(message.get_value("MSH.11"), "D");
    assert!(message.has_value("MSH.7"));
}
