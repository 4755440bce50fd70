// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Precision-aware HL7 timestamps
//!
//! Parses the HL7 `TS` grammar
//!
//! ```text
//! YYYY[MM[DD[HH[MM[SS[.S[S[S[S]]]]]]]]][+/-ZZZZ]
//! ```
//!
//! and formats date-times back into HL7 text. The lenient entry points
//! return `None` on invalid input; the strict ones return
//! [`Hl7Error::InvalidTimestamp`].

use crate::error::{Hl7Error, Result};
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
};
use nom::{
    IResult, Parser,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, opt},
    sequence::preceded,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Precision levels for timestamp values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum TemporalPrecision {
    /// Year precision (YYYY)
    Year,
    /// Month precision (YYYYMM)
    Month,
    /// Day precision (YYYYMMDD)
    Day,
    /// Hour precision (YYYYMMDDHH)
    Hour,
    /// Minute precision (YYYYMMDDHHMM)
    Minute,
    /// Second precision (YYYYMMDDHHMMSS)
    Second,
    /// Fractional second precision (YYYYMMDDHHMMSS.S to .SSSS)
    Millisecond,
}

impl TemporalPrecision {
    /// Number of date/time digits before any fraction
    pub fn date_digits(&self) -> usize {
        match self {
            Self::Year => 4,
            Self::Month => 6,
            Self::Day => 8,
            Self::Hour => 10,
            Self::Minute => 12,
            Self::Second | Self::Millisecond => 14,
        }
    }

    /// Precision implied by a run of date/time digits
    pub fn from_date_digits(digits: usize) -> Option<Self> {
        match digits {
            4 => Some(Self::Year),
            6 => Some(Self::Month),
            8 => Some(Self::Day),
            10 => Some(Self::Hour),
            12 => Some(Self::Minute),
            14 => Some(Self::Second),
            _ => None,
        }
    }
}

impl fmt::Display for TemporalPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year => write!(f, "year"),
            Self::Month => write!(f, "month"),
            Self::Day => write!(f, "day"),
            Self::Hour => write!(f, "hour"),
            Self::Minute => write!(f, "minute"),
            Self::Second => write!(f, "second"),
            Self::Millisecond => write!(f, "millisecond"),
        }
    }
}

/// A parsed HL7 timestamp
///
/// Components missing at the given precision are filled with their lowest
/// value (month and day 1, time 00:00:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hl7Timestamp {
    /// Local calendar value
    pub datetime: NaiveDateTime,
    /// UTC offset, when the text carried one
    pub offset: Option<FixedOffset>,
    /// Precision of the source text
    pub precision: TemporalPrecision,
}

impl Hl7Timestamp {
    /// Attach the offset to the calendar value
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        self.offset?.from_local_datetime(&self.datetime).single()
    }
}

impl FromStr for Hl7Timestamp {
    type Err = Hl7Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_timestamp(s)
    }
}

impl fmt::Display for Hl7Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern = match self.precision {
            TemporalPrecision::Year => "%Y",
            TemporalPrecision::Month => "%Y%m",
            TemporalPrecision::Day => "%Y%m%d",
            TemporalPrecision::Hour => "%Y%m%d%H",
            TemporalPrecision::Minute => "%Y%m%d%H%M",
            TemporalPrecision::Second => "%Y%m%d%H%M%S",
            TemporalPrecision::Millisecond => "%Y%m%d%H%M%S%.3f",
        };
        write!(f, "{}", self.datetime.format(pattern))?;
        if let Some(offset) = self.offset {
            let seconds = offset.local_minus_utc();
            let sign = if seconds < 0 { '-' } else { '+' };
            let minutes = seconds.abs() / 60;
            write!(f, "{sign}{:02}{:02}", minutes / 60, minutes % 60)?;
        }
        Ok(())
    }
}

type RawTimestamp<'a> = (&'a str, Option<&'a str>, Option<(char, &'a str)>);

fn timestamp_parts(input: &str) -> IResult<&str, RawTimestamp<'_>> {
    (
        digit1,
        opt(preceded(char('.'), digit1)),
        opt((one_of("+-"), digit1)),
    )
        .parse(input)
}

fn field(digits: &str, range: std::ops::Range<usize>, default: u32) -> u32 {
    digits
        .get(range)
        .and_then(|part| part.parse().ok())
        .unwrap_or(default)
}

fn build(input: &str) -> Option<Hl7Timestamp> {
    let (_, (date, fraction, offset)) = all_consuming(timestamp_parts).parse(input.trim()).ok()?;

    let mut precision = TemporalPrecision::from_date_digits(date.len())?;
    let millis = match fraction {
        Some(fraction) if precision == TemporalPrecision::Second && fraction.len() <= 4 => {
            precision = TemporalPrecision::Millisecond;
            // Sub-millisecond digits are truncated
            let mut padded: String = fraction.chars().take(3).collect();
            while padded.len() < 3 {
                padded.push('0');
            }
            padded.parse().ok()?
        }
        Some(_) => return None,
        None => 0,
    };

    let year: i32 = date.get(0..4)?.parse().ok()?;
    let day = NaiveDate::from_ymd_opt(year, field(date, 4..6, 1), field(date, 6..8, 1))?;
    let time = NaiveTime::from_hms_milli_opt(
        field(date, 8..10, 0),
        field(date, 10..12, 0),
        field(date, 12..14, 0),
        millis,
    )?;

    let offset = match offset {
        Some((sign, digits)) if digits.len() == 4 => {
            let hours = field(digits, 0..2, 0) as i32;
            let minutes = field(digits, 2..4, 0) as i32;
            // Out-of-range minutes carry into hours; only a full day is rejected
            let seconds = hours * 3600 + minutes * 60;
            Some(if sign == '-' {
                FixedOffset::west_opt(seconds)?
            } else {
                FixedOffset::east_opt(seconds)?
            })
        }
        Some(_) => return None,
        None => None,
    };

    Some(Hl7Timestamp {
        datetime: NaiveDateTime::new(day, time),
        offset,
        precision,
    })
}

/// Parse an HL7 timestamp, failing on any grammar or calendar violation
pub fn parse_timestamp(input: &str) -> Result<Hl7Timestamp> {
    build(input).ok_or_else(|| Hl7Error::invalid_timestamp(input))
}

/// Parse an HL7 timestamp into its calendar value, `None` when invalid
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    build(input).map(|ts| ts.datetime)
}

/// Parse an HL7 timestamp, failing when invalid
pub fn parse_datetime_strict(input: &str) -> Result<NaiveDateTime> {
    parse_timestamp(input).map(|ts| ts.datetime)
}

/// Parse an HL7 timestamp into its calendar value and UTC offset, `None` when invalid
pub fn parse_datetime_with_offset(input: &str) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
    build(input).map(|ts| (ts.datetime, ts.offset))
}

/// Format a date-time as `yyyyMMddHHmmss`
pub fn format_timestamp(datetime: &NaiveDateTime) -> String {
    datetime.format("%Y%m%d%H%M%S").to_string()
}

/// Format a date-time as `yyyyMMddHHmmss.FFFF`
///
/// Up to four fraction digits are written; trailing zeros are dropped, and
/// the dot with them when nothing remains.
pub fn long_date_with_fraction_of_second(datetime: &NaiveDateTime) -> String {
    let mut out = format_timestamp(datetime);
    let ten_thousandths = (datetime.nanosecond() / 100_000).min(9_999);
    let fraction = format!("{ten_thousandths:04}");
    let fraction = fraction.trim_end_matches('0');
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("   20151231234500.1234+2358   ", TemporalPrecision::Millisecond)]
    #[case("20151231234500.1234+2358", TemporalPrecision::Millisecond)]
    #[case("20151231234500.1234-2358", TemporalPrecision::Millisecond)]
    #[case("20151231234500.1234", TemporalPrecision::Millisecond)]
    #[case("20151231234500.12", TemporalPrecision::Millisecond)]
    #[case("20151231234500", TemporalPrecision::Second)]
    #[case("201512312345", TemporalPrecision::Minute)]
    #[case("2015123123", TemporalPrecision::Hour)]
    #[case("20151231", TemporalPrecision::Day)]
    #[case("201512", TemporalPrecision::Month)]
    #[case("2015", TemporalPrecision::Year)]
    #[case("20151231+0575", TemporalPrecision::Day)]
    fn test_accepted_precisions(#[case] input: &str, #[case] precision: TemporalPrecision) {
        let ts = parse_timestamp(input).unwrap();
        assert_eq!(ts.precision, precision);
        assert!(parse_datetime(input).is_some());
    }

    #[rstest]
    #[case("   20151231234500.1234+23581")]
    #[case("20151231234500.1234+23")]
    #[case("20151231234500.12345")]
    #[case("20151231234500.")]
    #[case("2015123123450")]
    #[case("20151231234")]
    #[case("201512312")]
    #[case("2015123")]
    #[case("20151")]
    #[case("201")]
    #[case("201512.5")]
    #[case("20151331")]
    #[case("20151231+2400")]
    #[case("")]
    fn test_rejected_inputs(#[case] input: &str) {
        assert_eq!(parse_datetime(input), None);
        assert!(matches!(
            parse_timestamp(input),
            Err(Hl7Error::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_fraction_and_offset_values() {
        let (datetime, offset) = parse_datetime_with_offset("20151231234500.1234-2358").unwrap();
        let expected = NaiveDate::from_ymd_opt(2015, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 45, 0, 123)
            .unwrap();
        assert_eq!(datetime, expected);
        assert_eq!(offset, FixedOffset::west_opt(23 * 3600 + 58 * 60));
    }

    #[test]
    fn test_offset_minutes_carry_into_hours() {
        let (_, offset) = parse_datetime_with_offset("20151231+0575").unwrap();
        assert_eq!(offset, FixedOffset::east_opt(6 * 3600 + 15 * 60));
        let (_, offset) = parse_datetime_with_offset("20151231-2359").unwrap();
        assert_eq!(offset, FixedOffset::west_opt(23 * 3600 + 59 * 60));
    }

    #[test]
    fn test_missing_parts_default_to_start() {
        let datetime = parse_datetime("201512").unwrap();
        assert_eq!(
            datetime,
            NaiveDate::from_ymd_opt(2015, 12, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(parse_datetime_with_offset("2015").unwrap().1, None);
    }

    #[test]
    fn test_display_round_trip() {
        for input in ["2015", "20151231", "20151231234500.120+0100", "201512312345-0030"] {
            let ts: Hl7Timestamp = input.parse().unwrap();
            assert_eq!(ts.to_string(), input);
        }
    }

    #[test]
    fn test_to_datetime_requires_offset() {
        assert!(parse_timestamp("20151231").unwrap().to_datetime().is_none());
        let aware = parse_timestamp("20151231120000+0200").unwrap().to_datetime().unwrap();
        assert_eq!(aware.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_strict_failure() {
        assert!(parse_datetime_strict("201").is_err());
        assert!(parse_datetime_strict("2015").is_ok());
    }

    #[test]
    fn test_long_date_with_fraction() {
        let base = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let whole = base.and_hms_opt(8, 9, 10).unwrap();
        assert_eq!(long_date_with_fraction_of_second(&whole), "20240305080910");

        let fractional = base.and_hms_micro_opt(8, 9, 10, 120_000).unwrap();
        assert_eq!(long_date_with_fraction_of_second(&fractional), "20240305080910.12");
        assert!(parse_datetime(&long_date_with_fraction_of_second(&fractional)).is_some());
        assert_eq!(format_timestamp(&fractional), "20240305080910");
    }
}
