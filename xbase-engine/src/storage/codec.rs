//! Per-type value coercion for xBase fields
//!
//! Every field is stored as exactly `width` bytes of single-byte text.
//! Values enter through one of two paths:
//! - the string path ([`encode_text`]), where caller text is parsed into a
//!   validated [`Token`] before anything is laid out, and
//! - the typed path ([`encode_value`]), used by the struct mapper.
//!
//! Both paths end in the same layout step, and both decoders read the same
//! bytes, so the two access paths never disagree about a stored value.

use chrono::NaiveDate;

use crate::error::{DbfError, DbfResult};

use super::field::{FieldDescriptor, FieldType};

const BLANK: u8 = b' ';

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Logical(bool),
    Character(String),
    Integer(i64),
    Float(f64),
    /// `None` is the unset date
    Date(Option<NaiveDate>),
}

impl Value {
    /// Whether this is the zero value of its kind
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Logical(b) => !b,
            Value::Character(s) => s.is_empty(),
            Value::Integer(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Date(d) => d.is_none(),
        }
    }

    /// Zero value a blank field of the given layout decodes to
    pub fn zero_for(field: &FieldDescriptor) -> Value {
        match field.field_type {
            FieldType::Logical => Value::Logical(false),
            FieldType::Character => Value::Character(String::new()),
            FieldType::Numeric if field.decimals == 0 => Value::Integer(0),
            FieldType::Numeric | FieldType::Float => Value::Float(0.0),
            FieldType::Date => Value::Date(None),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Logical(true) => f.write_str("T"),
            Value::Logical(false) => f.write_str("F"),
            Value::Character(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Date(Some(d)) => write!(f, "{}", d.format("%Y%m%d")),
            Value::Date(None) => Ok(()),
        }
    }
}

/// Validated external form of a field value, ready to be laid out
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// All spaces
    Blank,
    /// One logical marker byte, stored as given
    Logical(u8),
    /// Single-byte text
    Text(Vec<u8>),
    /// Canonical number text, already known to fit
    Number(String),
    Date(NaiveDate),
}

/// Blank encoding of a field (all spaces)
pub fn blank(field: &FieldDescriptor) -> Vec<u8> {
    vec![BLANK; field.width as usize]
}

/// Parse caller text into a token for this field
pub fn parse_text(field: &FieldDescriptor, text: &str) -> DbfResult<Token> {
    match field.field_type {
        FieldType::Character => Ok(Token::Text(to_single_byte(field, text)?)),
        FieldType::Logical => parse_logical(field, text.trim()),
        FieldType::Numeric | FieldType::Float => parse_number(field, text.trim()),
        FieldType::Date => parse_date(field, text.trim()),
    }
}

/// String path: validate `text` and encode it into `width` bytes
pub fn encode_text(field: &FieldDescriptor, text: &str) -> DbfResult<Vec<u8>> {
    let token = parse_text(field, text)?;
    lay_out(field, &token)
}

/// Typed path: encode a value into `width` bytes
pub fn encode_value(field: &FieldDescriptor, value: &Value) -> DbfResult<Vec<u8>> {
    let token = value_token(field, value)?;
    lay_out(field, &token)
}

/// Decode stored bytes into the text the string accessors return
pub fn decode_text(field: &FieldDescriptor, bytes: &[u8]) -> String {
    let text = from_single_byte(bytes);
    match field.field_type {
        FieldType::Character => text.trim_end_matches([' ', '\0']).to_string(),
        _ => text.trim_matches([' ', '\0']).to_string(),
    }
}

/// Decode stored bytes into a typed value
pub fn decode_value(field: &FieldDescriptor, bytes: &[u8]) -> DbfResult<Value> {
    let text = decode_text(field, bytes);
    match field.field_type {
        FieldType::Character => Ok(Value::Character(text)),
        FieldType::Logical => Ok(Value::Logical(matches!(
            text.as_bytes().first(),
            Some(b'T' | b't' | b'Y' | b'y')
        ))),
        FieldType::Numeric | FieldType::Float => {
            if text.is_empty() {
                return Ok(Value::zero_for(field));
            }
            let number = split_number(&text)
                .ok_or_else(|| DbfError::mismatch(&field.name, format!("{:?} is not a number", text)))?;
            if field.field_type == FieldType::Numeric && field.decimals == 0 {
                if number.frac.bytes().all(|b| b == b'0') {
                    let int_text = format!("{}{}", number.sign, non_empty(number.int));
                    if let Ok(i) = int_text.parse::<i64>() {
                        return Ok(Value::Integer(i));
                    }
                }
                return Err(DbfError::mismatch(
                    &field.name,
                    format!("{:?} is not an integer", text),
                ));
            }
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| DbfError::mismatch(&field.name, format!("{:?} is not a number", text)))
        }
        FieldType::Date => {
            if text.is_empty() || text.bytes().all(|b| b == b'0') {
                return Ok(Value::Date(None));
            }
            parse_compact_date(&text)
                .map(|d| Value::Date(Some(d)))
                .ok_or_else(|| DbfError::mismatch(&field.name, format!("{:?} is not a date", text)))
        }
    }
}

fn value_token(field: &FieldDescriptor, value: &Value) -> DbfResult<Token> {
    match (field.field_type, value) {
        (FieldType::Character, v) => Ok(Token::Text(to_single_byte(field, &v.to_string())?)),
        (_, Value::Character(s)) => parse_text(field, s),
        (FieldType::Logical, Value::Logical(b)) => Ok(Token::Logical(if *b { b'T' } else { b'F' })),
        (FieldType::Numeric | FieldType::Float, Value::Integer(i)) => integer_token(field, *i),
        (FieldType::Numeric | FieldType::Float, Value::Float(f)) => float_token(field, *f),
        (FieldType::Date, Value::Date(None)) => Ok(Token::Blank),
        (FieldType::Date, Value::Date(Some(d))) => Ok(Token::Date(*d)),
        (field_type, value) => Err(DbfError::mismatch(
            &field.name,
            format!("cannot store {:?} in a {} field", value, field_type),
        )),
    }
}

/// Lay a token out into exactly `width` bytes
fn lay_out(field: &FieldDescriptor, token: &Token) -> DbfResult<Vec<u8>> {
    let width = field.width as usize;
    let mut buf = blank(field);
    match token {
        Token::Blank => {}
        Token::Logical(b) => buf[0] = *b,
        Token::Text(bytes) => {
            let len = bytes.len().min(width);
            buf[..len].copy_from_slice(&bytes[..len]);
        }
        Token::Number(text) => {
            if text.len() > width {
                return Err(overflow(field, text));
            }
            buf[width - text.len()..].copy_from_slice(text.as_bytes());
        }
        Token::Date(d) => {
            let text = d.format("%Y%m%d").to_string();
            if text.len() != width {
                return Err(overflow(field, &text));
            }
            buf.copy_from_slice(text.as_bytes());
        }
    }
    Ok(buf)
}

fn parse_logical(field: &FieldDescriptor, text: &str) -> DbfResult<Token> {
    match text.as_bytes() {
        [] => Ok(Token::Blank),
        [b @ (b'T' | b't' | b'Y' | b'y' | b'F' | b'f' | b'N' | b'n' | b'?')] => Ok(Token::Logical(*b)),
        _ if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("yes") => {
            Ok(Token::Logical(b'T'))
        }
        _ if text.eq_ignore_ascii_case("false") || text.eq_ignore_ascii_case("no") => {
            Ok(Token::Logical(b'F'))
        }
        _ => Err(DbfError::mismatch(&field.name, format!("{:?} is not a logical value", text))),
    }
}

fn parse_date(field: &FieldDescriptor, text: &str) -> DbfResult<Token> {
    if text.is_empty() {
        return Ok(Token::Blank);
    }
    parse_compact_date(text)
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
        .map(Token::Date)
        .ok_or_else(|| DbfError::mismatch(&field.name, format!("{:?} is not a date", text)))
}

/// YYYYMMDD, digits only
fn parse_compact_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = text[0..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

struct NumberParts<'a> {
    sign: &'static str,
    int: &'a str,
    frac: &'a str,
}

/// Split `[+-]?digits[.digits]`, requiring at least one digit
fn split_number(text: &str) -> Option<NumberParts<'_>> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'-' => ("-", &text[1..]),
        b'+' => ("", &text[1..]),
        _ => ("", text),
    };
    let (int, frac) = rest.split_once('.').unwrap_or((rest, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits(int) || !digits(frac) || int.len() + frac.len() == 0 {
        return None;
    }
    Some(NumberParts { sign, int, frac })
}

fn non_empty(digits: &str) -> &str {
    if digits.is_empty() {
        "0"
    } else {
        digits
    }
}

fn parse_number(field: &FieldDescriptor, text: &str) -> DbfResult<Token> {
    if text.is_empty() {
        return Ok(Token::Blank);
    }
    let parts = split_number(text)
        .ok_or_else(|| DbfError::mismatch(&field.name, format!("{:?} is not a number", text)))?;

    let decimals = field.decimals as usize;
    if parts.frac.len() > decimals {
        if decimals == 0 && field.field_type == FieldType::Numeric {
            return Err(DbfError::mismatch(
                &field.name,
                format!("{:?} has decimals but the field holds integers", text),
            ));
        }
        let value: f64 = text
            .parse()
            .map_err(|_| DbfError::mismatch(&field.name, format!("{:?} is not a number", text)))?;
        return float_token(field, value);
    }

    let canonical = if parts.frac.is_empty() {
        format!("{}{}", parts.sign, non_empty(parts.int))
    } else {
        format!("{}{}.{}", parts.sign, non_empty(parts.int), parts.frac)
    };
    if canonical.len() > field.width as usize {
        return Err(overflow(field, &canonical));
    }
    // Integer columns decode to i64, so nothing wider may be stored
    if field.field_type == FieldType::Numeric && decimals == 0 && canonical.parse::<i64>().is_err() {
        return Err(DbfError::mismatch(
            &field.name,
            format!("{:?} is out of range for an integer field", text),
        ));
    }
    Ok(Token::Number(canonical))
}

fn integer_token(field: &FieldDescriptor, value: i64) -> DbfResult<Token> {
    fit_number(field, |decimals| {
        if decimals == 0 {
            value.to_string()
        } else {
            format!("{}.{}", value, "0".repeat(decimals))
        }
    })
}

fn float_token(field: &FieldDescriptor, value: f64) -> DbfResult<Token> {
    if !value.is_finite() {
        return Err(DbfError::mismatch(&field.name, format!("{} is not a finite number", value)));
    }
    if field.field_type == FieldType::Numeric && field.decimals == 0 && value.fract() != 0.0 {
        return Err(DbfError::mismatch(
            &field.name,
            format!("{} has decimals but the field holds integers", value),
        ));
    }
    fit_number(field, |decimals| format!("{:.*}", decimals, value))
}

/// Render with the declared decimals, giving up fractional digits until the
/// text fits. Running out of room in the integer part is an overflow.
fn fit_number(field: &FieldDescriptor, render: impl Fn(usize) -> String) -> DbfResult<Token> {
    let width = field.width as usize;
    let mut decimals = field.decimals as usize;
    loop {
        let text = render(decimals);
        if text.len() <= width {
            return Ok(Token::Number(text));
        }
        if decimals == 0 {
            return Err(overflow(field, &text));
        }
        decimals -= 1;
    }
}

fn overflow(field: &FieldDescriptor, text: &str) -> DbfError {
    DbfError::mismatch(
        &field.name,
        format!("{:?} does not fit in {} bytes", text, field.width),
    )
}

/// Map text to single-byte characters (U+0000..=U+00FF)
fn to_single_byte(field: &FieldDescriptor, text: &str) -> DbfResult<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(c as u32).map_err(|_| {
                DbfError::mismatch(&field.name, format!("character {:?} is not single-byte", c))
            })
        })
        .collect()
}

fn from_single_byte(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn field(field_type: FieldType, width: u8, decimals: u8) -> FieldDescriptor {
        FieldDescriptor::new("f", field_type, width, decimals).unwrap()
    }

    #[test]
    fn test_character_layout() {
        let f = field(FieldType::Character, 8, 0);
        assert_eq!(encode_text(&f, "message").unwrap(), b"message ");
        assert_eq!(encode_text(&f, "much too long").unwrap(), b"much too");
        assert_eq!(decode_text(&f, b"  left  "), "  left");
        assert_eq!(
            encode_text(&f, "\u{263A}").unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(encode_text(&f, "caf\u{e9}").unwrap(), b"caf\xe9    ");
        assert_eq!(decode_text(&f, b"caf\xe9    "), "caf\u{e9}");
    }

    #[test]
    fn test_logical_text_kept_verbatim() {
        let f = field(FieldType::Logical, 1, 0);
        assert_eq!(encode_text(&f, "t").unwrap(), b"t");
        assert_eq!(decode_text(&f, b"t"), "t");
        assert_eq!(decode_value(&f, b"t").unwrap(), Value::Logical(true));
        assert_eq!(decode_value(&f, b"y").unwrap(), Value::Logical(true));
        assert_eq!(decode_value(&f, b"N").unwrap(), Value::Logical(false));
        assert_eq!(decode_value(&f, b" ").unwrap(), Value::Logical(false));
        assert_eq!(decode_value(&f, b"?").unwrap(), Value::Logical(false));
        assert_eq!(encode_text(&f, "True").unwrap(), b"T");
        assert_eq!(encode_text(&f, "no").unwrap(), b"F");
        assert_eq!(encode_text(&f, "").unwrap(), b" ");
        assert!(encode_text(&f, "x").is_err());
    }

    #[test]
    fn test_logical_value() {
        let f = field(FieldType::Logical, 1, 0);
        assert_eq!(encode_value(&f, &Value::Logical(true)).unwrap(), b"T");
        assert_eq!(encode_value(&f, &Value::Logical(false)).unwrap(), b"F");
        assert!(encode_value(&f, &Value::Integer(1)).is_err());
    }

    #[test]
    fn test_numeric_text_path() {
        let f = field(FieldType::Float, 8, 6);
        let bytes = encode_text(&f, "44.123").unwrap();
        assert_eq!(bytes, b"  44.123");
        assert_eq!(decode_text(&f, &bytes), "44.123");

        let int = field(FieldType::Numeric, 10, 0);
        assert_eq!(encode_text(&int, "44").unwrap(), b"        44");
        assert_eq!(encode_text(&int, "+7").unwrap(), b"         7");
        assert_eq!(encode_text(&int, "-12").unwrap(), b"       -12");
        assert!(encode_text(&int, "1.5").is_err());
        assert!(encode_text(&int, "abc").is_err());
        assert!(encode_text(&int, "12345678901").is_err());
        assert_eq!(encode_text(&int, "").unwrap(), b"          ");
    }

    #[test]
    fn test_integer_text_must_fit_i64() {
        let f = field(FieldType::Numeric, 20, 0);
        let err = encode_text(&f, "99999999999999999999").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(encode_text(&f, "-9223372036854775809").is_err());

        let bytes = encode_text(&f, "9223372036854775807").unwrap();
        assert_eq!(decode_value(&f, &bytes).unwrap(), Value::Integer(i64::MAX));
        let bytes = encode_text(&f, "-9223372036854775808").unwrap();
        assert_eq!(decode_value(&f, &bytes).unwrap(), Value::Integer(i64::MIN));

        // Decimal columns decode to f64 and keep accepting wide values
        let wide = field(FieldType::Numeric, 20, 1);
        assert!(encode_text(&wide, "99999999999999999.9").is_ok());
    }

    #[test]
    fn test_numeric_text_rounds_extra_decimals() {
        let f = field(FieldType::Numeric, 8, 2);
        assert_eq!(encode_text(&f, "3.14159").unwrap(), b"    3.14");
        assert_eq!(encode_text(&f, ".5").unwrap(), b"     0.5");
    }

    #[test]
    fn test_float_value_reduces_decimals_to_fit() {
        let f = field(FieldType::Float, 8, 6);
        let bytes = encode_value(&f, &Value::Float(123.56)).unwrap();
        assert_eq!(bytes, b"123.5600");
        assert_eq!(decode_value(&f, &bytes).unwrap(), Value::Float(123.56));

        let bytes = encode_value(&f, &Value::Float(44.34)).unwrap();
        assert_eq!(decode_value(&f, &bytes).unwrap(), Value::Float(44.34));

        let err = encode_value(&f, &Value::Float(123456789.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(encode_value(&f, &Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn test_integer_value() {
        let f = field(FieldType::Numeric, 10, 0);
        let bytes = encode_value(&f, &Value::Integer(-33)).unwrap();
        assert_eq!(bytes, b"       -33");
        assert_eq!(decode_value(&f, &bytes).unwrap(), Value::Integer(-33));
        assert_eq!(decode_value(&f, b"          ").unwrap(), Value::Integer(0));
        assert!(encode_value(&f, &Value::Integer(12_345_678_901)).is_err());
        assert!(encode_value(&f, &Value::Float(1.5)).is_err());
        assert_eq!(encode_value(&f, &Value::Float(2.0)).unwrap(), b"         2");
        assert!(decode_value(&f, b"**********").is_err());

        let decimal = field(FieldType::Numeric, 6, 2);
        assert_eq!(encode_value(&decimal, &Value::Integer(11)).unwrap(), b" 11.00");
    }

    #[test]
    fn test_date_layout() {
        let f = field(FieldType::Date, 8, 0);
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(encode_value(&f, &Value::Date(Some(date))).unwrap(), b"20230101");
        assert_eq!(encode_value(&f, &Value::Date(None)).unwrap(), b"        ");
        assert_eq!(decode_value(&f, b"        ").unwrap(), Value::Date(None));
        assert_eq!(decode_value(&f, b"00000000").unwrap(), Value::Date(None));
        assert_eq!(decode_value(&f, b"20230101").unwrap(), Value::Date(Some(date)));
        assert_eq!(encode_text(&f, "2023-01-01").unwrap(), b"20230101");
        assert!(encode_text(&f, "20231301").is_err());
        assert!(decode_value(&f, b"2023AB01").is_err());
    }

    #[test]
    fn test_string_and_typed_paths_agree() {
        let f = field(FieldType::Numeric, 10, 0);
        let bytes = encode_text(&f, "123").unwrap();
        assert_eq!(decode_value(&f, &bytes).unwrap(), Value::Integer(123));
        assert_eq!(decode_text(&f, &encode_value(&f, &Value::Integer(123)).unwrap()), "123");
    }

    #[test]
    fn test_zero_values() {
        assert!(Value::Logical(false).is_zero());
        assert!(Value::Character(String::new()).is_zero());
        assert!(Value::Float(0.0).is_zero());
        assert!(!Value::Integer(3).is_zero());
        assert_eq!(Value::zero_for(&field(FieldType::Float, 8, 2)), Value::Float(0.0));
    }
}
