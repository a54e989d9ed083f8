//! Raw string → typed value conversion.
//!
//! Static dispatch goes through [`FromField`], implemented here for every
//! primitive kind, `String`, the `chrono` temporal types and `Option<T>`.
//! Any other type opts in through [`TextDecodable`]. The parsers below are
//! shared with schema-driven conversion in [`crate::dynamic`].

use std::{borrow::Cow, error::Error, num::ParseIntError, str::FromStr};

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc,
    format::{self, ParseResult, Parsed, StrftimeItems},
};
use rowbind_common::{ConvertError, FieldKind};

use crate::layout;

/// A type a raw cell can be converted into.
pub trait FromField: Sized {
    /// Reported in conversion errors.
    const KIND: FieldKind;

    /// `format` is the directive's `format:` pattern, possibly empty.
    fn from_field(raw: &str, format: &str) -> Result<Self, ConvertError>;
}

/// Capability for types that can be built from trimmed text.
///
/// An empty cell produces `Default::default()` without calling the
/// decoder; for an `Option<T>` field it produces `None`. Non-empty cells
/// are trimmed before decoding and decoder errors are reported unchanged.
pub trait TextDecodable: Default {
    type Error: Error + Send + Sync + 'static;

    fn decode_text(text: &str) -> Result<Self, Self::Error>;
}

impl<T: TextDecodable> FromField for T {
    const KIND: FieldKind = FieldKind::Decodable;

    fn from_field(raw: &str, _format: &str) -> Result<Self, ConvertError> {
        if raw.is_empty() {
            return Ok(T::default());
        }
        decode(raw)
    }
}

impl<T: FromField> FromField for Option<T> {
    const KIND: FieldKind = T::KIND;

    fn from_field(raw: &str, format: &str) -> Result<Self, ConvertError> {
        if raw.is_empty() {
            return Ok(None);
        }
        T::from_field(raw, format).map(Some)
    }
}

pub(crate) fn decode<T: TextDecodable>(raw: &str) -> Result<T, ConvertError> {
    T::decode_text(raw.trim()).map_err(ConvertError::decode)
}

/* ───────────────────────────── primitives ───────────────────────────── */

pub(crate) fn parse_int<T>(raw: &str) -> Result<T, ConvertError>
where
    T: FromStr<Err = ParseIntError>,
{
    Ok(raw.parse::<T>()?)
}

pub(crate) fn parse_f64(raw: &str) -> Result<f64, ConvertError> {
    let value: f64 = raw.parse()?;
    if value.is_infinite() && !is_infinity_literal(raw) {
        return Err(ConvertError::FloatOverflow {
            kind: FieldKind::Float { bits: 64 },
        });
    }
    Ok(value)
}

pub(crate) fn parse_f32(raw: &str) -> Result<f32, ConvertError> {
    let value: f32 = raw.parse()?;
    if value.is_infinite() && !is_infinity_literal(raw) {
        return Err(ConvertError::FloatOverflow {
            kind: FieldKind::Float { bits: 32 },
        });
    }
    Ok(value)
}

fn is_infinity_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    digits.eq_ignore_ascii_case("inf") || digits.eq_ignore_ascii_case("infinity")
}

/// Accepts `true`, `t`, `1`, `false`, `f` and `0`, ignoring ASCII case.
pub(crate) fn parse_bool(raw: &str) -> Result<bool, ConvertError> {
    const TRUE: [&str; 3] = ["true", "t", "1"];
    const FALSE: [&str; 3] = ["false", "f", "0"];

    if TRUE.iter().any(|lit| raw.eq_ignore_ascii_case(lit)) {
        Ok(true)
    } else if FALSE.iter().any(|lit| raw.eq_ignore_ascii_case(lit)) {
        Ok(false)
    } else {
        Err(ConvertError::InvalidBool)
    }
}

/* ───────────────────────────── temporal ─────────────────────────────── */

fn pattern(format: &str) -> Result<Cow<'_, str>, ConvertError> {
    if format.is_empty() {
        return Err(ConvertError::EmptyFormat);
    }
    Ok(layout::to_strftime(format))
}

/// Parse `raw` against `format` and fill the fields the pattern omits:
/// year 0, January, day 1, midnight. A 12-hour clock without AM/PM is read
/// as AM.
fn parse_fields(raw: &str, format: &str) -> Result<Parsed, ConvertError> {
    let pattern = pattern(format)?;
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, raw, StrftimeItems::new(&pattern))?;
    if parsed.timestamp().is_none() {
        default_date(&mut parsed)?;
        default_time(&mut parsed)?;
    }
    Ok(parsed)
}

fn default_date(parsed: &mut Parsed) -> ParseResult<()> {
    if parsed.year().is_none()
        && parsed.year_div_100().is_none()
        && parsed.year_mod_100().is_none()
        && parsed.isoyear().is_none()
    {
        parsed.set_year(0)?;
    }
    let by_week = parsed.isoweek().is_some()
        || parsed.week_from_sun().is_some()
        || parsed.week_from_mon().is_some();
    if parsed.ordinal().is_some() || by_week {
        return Ok(());
    }
    if parsed.month().is_none() {
        parsed.set_month(1)?;
    }
    if parsed.day().is_none() {
        parsed.set_day(1)?;
    }
    Ok(())
}

fn default_time(parsed: &mut Parsed) -> ParseResult<()> {
    match (parsed.hour_div_12(), parsed.hour_mod_12()) {
        (None, None) => parsed.set_hour(0)?,
        (None, Some(_)) => parsed.set_ampm(false)?,
        (Some(_), None) => parsed.set_hour12(12)?,
        (Some(_), Some(_)) => {}
    }
    if parsed.minute().is_none() {
        parsed.set_minute(0)?;
    }
    if parsed.second().is_none() && parsed.nanosecond().is_some() {
        parsed.set_second(0)?;
    }
    Ok(())
}

pub(crate) fn parse_date(raw: &str, format: &str) -> Result<NaiveDate, ConvertError> {
    Ok(parse_fields(raw, format)?.to_naive_date()?)
}

pub(crate) fn parse_time(raw: &str, format: &str) -> Result<NaiveTime, ConvertError> {
    Ok(parse_fields(raw, format)?.to_naive_time()?)
}

pub(crate) fn parse_datetime(raw: &str, format: &str) -> Result<NaiveDateTime, ConvertError> {
    Ok(parse_fields(raw, format)?.to_naive_datetime_with_offset(0)?)
}

/// Input without an offset is read as UTC.
pub(crate) fn parse_timestamp(
    raw: &str,
    format: &str,
) -> Result<DateTime<FixedOffset>, ConvertError> {
    let parsed = parse_fields(raw, format)?;
    if parsed.offset().is_some() {
        return Ok(parsed.to_datetime()?);
    }
    Ok(parsed
        .to_naive_datetime_with_offset(0)?
        .and_utc()
        .fixed_offset())
}

/* ──────────────────────────── FromField impls ───────────────────────── */

macro_rules! int_fields {
    ($variant:ident: $($ty:ty),* $(,)?) => {
        $(
            impl FromField for $ty {
                const KIND: FieldKind = FieldKind::$variant { bits: <$ty>::BITS };

                fn from_field(raw: &str, _format: &str) -> Result<Self, ConvertError> {
                    parse_int(raw)
                }
            }
        )*
    };
}

int_fields!(Int: i8, i16, i32, i64, i128, isize);
int_fields!(Uint: u8, u16, u32, u64, u128, usize);

impl FromField for f32 {
    const KIND: FieldKind = FieldKind::Float { bits: 32 };

    fn from_field(raw: &str, _format: &str) -> Result<Self, ConvertError> {
        parse_f32(raw)
    }
}

impl FromField for f64 {
    const KIND: FieldKind = FieldKind::Float { bits: 64 };

    fn from_field(raw: &str, _format: &str) -> Result<Self, ConvertError> {
        parse_f64(raw)
    }
}

impl FromField for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn from_field(raw: &str, _format: &str) -> Result<Self, ConvertError> {
        parse_bool(raw)
    }
}

impl FromField for String {
    const KIND: FieldKind = FieldKind::String;

    fn from_field(raw: &str, _format: &str) -> Result<Self, ConvertError> {
        Ok(raw.to_string())
    }
}

impl FromField for NaiveDate {
    const KIND: FieldKind = FieldKind::Date;

    fn from_field(raw: &str, format: &str) -> Result<Self, ConvertError> {
        parse_date(raw, format)
    }
}

impl FromField for NaiveTime {
    const KIND: FieldKind = FieldKind::Time;

    fn from_field(raw: &str, format: &str) -> Result<Self, ConvertError> {
        parse_time(raw, format)
    }
}

impl FromField for NaiveDateTime {
    const KIND: FieldKind = FieldKind::DateTime;

    fn from_field(raw: &str, format: &str) -> Result<Self, ConvertError> {
        parse_datetime(raw, format)
    }
}

impl FromField for DateTime<FixedOffset> {
    const KIND: FieldKind = FieldKind::Timestamp;

    fn from_field(raw: &str, format: &str) -> Result<Self, ConvertError> {
        parse_timestamp(raw, format)
    }
}

impl FromField for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::Timestamp;

    fn from_field(raw: &str, format: &str) -> Result<Self, ConvertError> {
        parse_timestamp(raw, format).map(|ts| ts.with_timezone(&Utc))
    }
}

/* ───────────────────────── optional decodables ──────────────────────── */

#[cfg(feature = "decimal")]
impl TextDecodable for rust_decimal::Decimal {
    type Error = rust_decimal::Error;

    fn decode_text(text: &str) -> Result<Self, Self::Error> {
        text.parse()
    }
}

#[cfg(feature = "uuid")]
impl TextDecodable for uuid::Uuid {
    type Error = uuid::Error;

    fn decode_text(text: &str) -> Result<Self, Self::Error> {
        uuid::Uuid::parse_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[derive(Debug, Default, PartialEq)]
    struct Code(String);

    #[derive(Debug, thiserror::Error)]
    #[error("code must be three letters, got {0:?}")]
    struct CodeError(String);

    impl TextDecodable for Code {
        type Error = CodeError;

        fn decode_text(text: &str) -> Result<Self, Self::Error> {
            if text.len() == 3 && text.chars().all(|c| c.is_ascii_alphabetic()) {
                Ok(Code(text.to_string()))
            } else {
                Err(CodeError(text.to_string()))
            }
        }
    }

    #[test]
    fn integers_respect_bit_width() {
        assert_eq!(i8::from_field("-128", "").unwrap(), -128);
        assert!(matches!(
            i8::from_field("128", ""),
            Err(ConvertError::Int(_))
        ));
        assert_eq!(u16::from_field("65535", "").unwrap(), u16::MAX);
        assert!(u16::from_field("-1", "").is_err());
        assert_eq!(i64::from_field("+42", "").unwrap(), 42);
        assert!(i32::from_field(" 42", "").is_err());
        assert!(i32::from_field("4.2", "").is_err());
        assert_eq!(<i32 as FromField>::KIND, FieldKind::Int { bits: 32 });
        assert_eq!(<usize as FromField>::KIND, FieldKind::Uint { bits: usize::BITS });
    }

    #[test]
    fn floats_reject_overflow_but_accept_infinity() {
        assert_eq!(f64::from_field("2.5", "").unwrap(), 2.5);
        assert!(matches!(
            f64::from_field("1e400", ""),
            Err(ConvertError::FloatOverflow { .. })
        ));
        assert!(matches!(
            f32::from_field("1e39", ""),
            Err(ConvertError::FloatOverflow { kind: FieldKind::Float { bits: 32 } })
        ));
        assert_eq!(f32::from_field("1e38", "").unwrap(), 1e38_f32);
        assert!(f64::from_field("-inf", "").unwrap().is_infinite());
        assert!(f64::from_field("NaN", "").unwrap().is_nan());
        // hexadecimal float literals are not accepted
        assert!(matches!(f64::from_field("0x1p-2", ""), Err(ConvertError::Float(_))));
        assert!(matches!(
            f64::from_field("abc", ""),
            Err(ConvertError::Float(_))
        ));
    }

    #[test]
    fn boolean_literals() {
        for lit in ["true", "TRUE", "True", "t", "T", "1"] {
            assert!(bool::from_field(lit, "").unwrap(), "{lit}");
        }
        for lit in ["false", "FALSE", "f", "F", "0"] {
            assert!(!bool::from_field(lit, "").unwrap(), "{lit}");
        }
        for lit in ["yes", "", "2", " true"] {
            assert!(matches!(
                bool::from_field(lit, ""),
                Err(ConvertError::InvalidBool)
            ));
        }
    }

    #[test]
    fn strings_are_verbatim() {
        assert_eq!(String::from_field("  padded ", "").unwrap(), "  padded ");
    }

    #[test]
    fn temporal_requires_format() {
        assert!(matches!(
            NaiveDate::from_field("2023-12-04", ""),
            Err(ConvertError::EmptyFormat)
        ));
        assert!(matches!(
            DateTime::<Utc>::from_field("2023-12-04", ""),
            Err(ConvertError::EmptyFormat)
        ));
    }

    #[test]
    fn dates_from_layout_and_strftime() {
        let d = NaiveDate::from_field("2023-12-04", "2006-01-02").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2023, 12, 4));
        let d = NaiveDate::from_field("04.12.2023", "%d.%m.%Y").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2023, 12, 4));
        assert!(matches!(
            NaiveDate::from_field("notadate", "2006-01-02"),
            Err(ConvertError::Temporal(_))
        ));
    }

    #[test]
    fn timestamps_keep_offset_or_default_to_utc() {
        let ts = DateTime::<FixedOffset>::from_field(
            "2023/12/04 00:00:27 +0100",
            "2006/01/02 15:04:05 -0700",
        )
        .unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 3600);
        assert_eq!(ts.with_timezone(&Utc).hour(), 23);

        let utc = DateTime::<Utc>::from_field("2023-12-04 08:30", "2006-01-02 15:04").unwrap();
        assert_eq!((utc.day(), utc.hour(), utc.minute()), (4, 8, 30));

        let midnight = DateTime::<Utc>::from_field("2023-12-04", "2006-01-02").unwrap();
        assert_eq!((midnight.day(), midnight.hour()), (4, 0));
    }

    #[test]
    fn naive_datetime_and_time() {
        let dt = NaiveDateTime::from_field("2023-12-04T10:11:12", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 11, 12));
        let t = NaiveTime::from_field("3:04PM", "3:04PM").unwrap();
        assert_eq!((t.hour(), t.minute()), (15, 4));
    }

    #[test]
    fn zulu_offset_layouts_accept_a_literal_z() {
        let layout = "2006-01-02T15:04:05Z07:00";
        let utc = DateTime::<FixedOffset>::from_field("2023-12-04T10:00:00Z", layout).unwrap();
        assert_eq!((utc.offset().local_minus_utc(), utc.hour()), (0, 10));
        let cet = DateTime::<FixedOffset>::from_field("2023-12-04T10:00:00+01:00", layout).unwrap();
        assert_eq!(cet.offset().local_minus_utc(), 3600);
        let compact =
            DateTime::<FixedOffset>::from_field("20231204 1000Z", "20060102 1504Z0700").unwrap();
        assert_eq!(compact.offset().local_minus_utc(), 0);

        assert!(matches!(
            DateTime::<FixedOffset>::from_field("2023-12-04T10:00:00Z", "2006-01-02T15:04:05-07:00"),
            Err(ConvertError::Temporal(_))
        ));
    }

    #[test]
    fn omitted_layout_parts_take_zero_values() {
        let d = NaiveDate::from_field("2023-12", "2006-01").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2023, 12, 1));

        let dt = NaiveDateTime::from_field("10:11", "15:04").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (0, 1, 1));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 11, 0));

        let t = NaiveTime::from_field("7", "3").unwrap();
        assert_eq!((t.hour(), t.minute()), (7, 0));
    }

    #[test]
    fn seconds_accept_an_unlisted_fraction() {
        let dt = NaiveDateTime::from_field("2023-12-04 10:11:12.5", "2006-01-02 15:04:05").unwrap();
        assert_eq!((dt.second(), dt.nanosecond()), (12, 500_000_000));
        let dt = NaiveDateTime::from_field("2023-12-04 10:11:12", "2006-01-02 15:04:05.999").unwrap();
        assert_eq!((dt.second(), dt.nanosecond()), (12, 0));
        assert!(matches!(
            NaiveDateTime::from_field("2023-12-04 10:11:12", "2006-01-02 15:04:05.000"),
            Err(ConvertError::Temporal(_))
        ));
    }

    #[test]
    fn day_of_year_and_weekday_layouts() {
        let d = NaiveDate::from_field("2023.338", "2006.002").unwrap();
        assert_eq!((d.month(), d.day()), (12, 4));
        let d = NaiveDate::from_field("Mon 2023-12-04", "Mon 2006-01-02").unwrap();
        assert_eq!(d.day(), 4);
        // the weekday must agree with the date
        assert!(matches!(
            NaiveDate::from_field("Tue 2023-12-04", "Mon 2006-01-02"),
            Err(ConvertError::Temporal(_))
        ));
    }

    #[test]
    fn decodable_empty_is_default_and_input_is_trimmed() {
        assert_eq!(Code::from_field("", "").unwrap(), Code::default());
        assert_eq!(Code::from_field("  abc\t", "").unwrap(), Code("abc".into()));
        assert_eq!(<Code as FromField>::KIND, FieldKind::Decodable);
    }

    #[test]
    fn decodable_errors_pass_through() {
        let err = Code::from_field("abcd", "").unwrap_err();
        let inner = err.decode_error().expect("decoder error");
        assert!(inner.is::<CodeError>());
        assert_eq!(err.to_string(), "code must be three letters, got \"abcd\"");
    }

    #[test]
    fn optional_fields() {
        assert_eq!(Option::<Code>::from_field("", "").unwrap(), None);
        assert_eq!(
            Option::<Code>::from_field("xyz", "").unwrap(),
            Some(Code("xyz".into()))
        );
        assert!(Option::<Code>::from_field("   ", "").is_err());
        assert_eq!(Option::<i32>::from_field("", "").unwrap(), None);
        assert_eq!(Option::<i32>::from_field("7", "").unwrap(), Some(7));
        assert_eq!(<Option<f32> as FromField>::KIND, FieldKind::Float { bits: 32 });
    }

    #[cfg(feature = "decimal")]
    #[test]
    fn decimal_is_decodable() {
        use rust_decimal::Decimal;

        let d = Decimal::from_field(" 123.456 ", "").unwrap();
        assert_eq!(d, Decimal::new(123_456, 3));
        assert_eq!(Decimal::from_field("", "").unwrap(), Decimal::ZERO);
        assert!(Decimal::from_field("notadec", "").is_err());
    }

    #[cfg(feature = "uuid")]
    #[test]
    fn uuid_is_decodable() {
        let id = uuid::Uuid::from_field("67e55044-10b1-426f-9247-bb680e5fe0c8", "").unwrap();
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert!(uuid::Uuid::from_field("", "").unwrap().is_nil());
    }
}
