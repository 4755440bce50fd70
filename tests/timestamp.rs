//! HL7 timestamp parsing through the public API

mod common;

use chrono::{FixedOffset, NaiveDate};
use common::{ADT, parse};
use octofhir_hl7::temporal::{
    format_timestamp, long_date_with_fraction_of_second, parse_datetime,
    parse_datetime_with_offset,
};
use octofhir_hl7::{Hl7Error, TemporalPrecision, parse_timestamp};
use pretty_assertions::assert_eq;

#[test]
fn test_timestamp_from_message_field() {
    let message = parse(ADT);
    let text = message.get_value("MSH.7").into_string().unwrap();
    let ts = parse_timestamp(&text).unwrap();

    assert_eq!(ts.precision, TemporalPrecision::Second);
    assert_eq!(
        ts.datetime,
        NaiveDate::from_ymd_opt(2011, 6, 13)
            .unwrap()
            .and_hms_opt(8, 36, 17)
            .unwrap()
    );
    assert_eq!(format_timestamp(&ts.datetime), text);
}

#[test]
fn test_offset_and_fraction() {
    let (datetime, offset) = parse_datetime_with_offset("20151231234500.1234-2358").unwrap();
    assert_eq!(
        datetime,
        NaiveDate::from_ymd_opt(2015, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 45, 0, 123)
            .unwrap()
    );
    assert_eq!(offset, FixedOffset::west_opt(23 * 3600 + 58 * 60));
}

#[test]
fn test_strict_parse_reports_input() {
    match parse_timestamp("201") {
        Err(Hl7Error::InvalidTimestamp { input }) => assert_eq!(input, "201"),
        other => panic!("expected invalid timestamp, got {other:?}"),
    }
    assert_eq!(parse_datetime("201"), None);
}

#[test]
fn test_generated_timestamps_parse_back() {
    let now = chrono::Local::now().naive_local();
    let text = long_date_with_fraction_of_second(&now);
    let ts = parse_timestamp(&text).unwrap();
    assert_eq!(format_timestamp(&ts.datetime), format_timestamp(&now));
}
