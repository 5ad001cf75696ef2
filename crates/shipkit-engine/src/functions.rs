//! Static helper functions
//!
//! These are the only functions config defaults may call. None of them read
//! application state: they depend on the clock, randomness, or their
//! arguments alone.

use std::fmt::Write;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use minijinja::value::ValueKind;
use minijinja::{Environment, Error, ErrorKind, Value};
use rand::Rng;
use rand::distr::Alphanumeric;

/// Names of the static helpers, as registered in templates
pub const STATIC_FUNCTIONS: &[&str] = &[
    "Now",
    "NowFmt",
    "ToLower",
    "ToUpper",
    "TrimSpace",
    "Trim",
    "UrlEncode",
    "Base64Encode",
    "Base64Decode",
    "Split",
    "RandomString",
    "Add",
    "Sub",
    "Mult",
    "Div",
    "ParseBool",
    "ParseInt",
    "ParseFloat",
    "HumanSize",
];

/// Register every static helper on an environment
pub fn register(env: &mut Environment<'static>) {
    env.add_function("Now", now);
    env.add_function("NowFmt", now_fmt);
    env.add_function("ToLower", to_lower);
    env.add_function("ToUpper", to_upper);
    env.add_function("TrimSpace", trim_space);
    env.add_function("Trim", trim);
    env.add_function("UrlEncode", url_encode);
    env.add_function("Base64Encode", base64_encode);
    env.add_function("Base64Decode", base64_decode);
    env.add_function("Split", split);
    env.add_function("RandomString", random_string);
    env.add_function("Add", add);
    env.add_function("Sub", sub);
    env.add_function("Mult", mult);
    env.add_function("Div", div);
    env.add_function("ParseBool", parse_bool);
    env.add_function("ParseInt", parse_int);
    env.add_function("ParseFloat", parse_float);
    env.add_function("HumanSize", human_size);
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

/// Current UTC time in RFC 3339 form
///
/// Usage: {{ Now() }}
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Current UTC time in a strftime format
///
/// Usage: {{ NowFmt("%Y-%m-%d") }}
pub fn now_fmt(format: String) -> Result<String, Error> {
    let mut out = String::new();
    write!(out, "{}", chrono::Utc::now().format(&format))
        .map_err(|_| invalid(format!("invalid time format '{}'", format)))?;
    Ok(out)
}

pub fn to_lower(s: String) -> String {
    s.to_lowercase()
}

pub fn to_upper(s: String) -> String {
    s.to_uppercase()
}

pub fn trim_space(s: String) -> String {
    s.trim().to_string()
}

/// Trim whitespace, or every character of `cutset` from both ends
///
/// Usage: {{ Trim("--name--", "-") }}
pub fn trim(s: String, cutset: Option<String>) -> String {
    match cutset {
        Some(cutset) => s.trim_matches(|c: char| cutset.contains(c)).to_string(),
        None => s.trim().to_string(),
    }
}

/// Query-string escape (spaces become `+`)
pub fn url_encode(s: String) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

pub fn base64_encode(s: String) -> String {
    STANDARD.encode(s.as_bytes())
}

pub fn base64_decode(s: String) -> Result<String, Error> {
    let bytes = STANDARD
        .decode(s.trim())
        .map_err(|e| invalid(format!("base64 decode error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| invalid(format!("invalid UTF-8 in decoded string: {}", e)))
}

/// Usage: {{ Split("a,b,c", ",") }}
pub fn split(s: String, sep: String) -> Vec<String> {
    if sep.is_empty() {
        return s.chars().map(String::from).collect();
    }
    s.split(sep.as_str()).map(String::from).collect()
}

/// Random alphanumeric string
///
/// Usage: {{ RandomString(32) }}
pub fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_value(value: &Value) -> Result<Self, Error> {
        match value.kind() {
            ValueKind::Number => {
                if let Some(i) = value.as_i64() {
                    Ok(Self::Int(i))
                } else {
                    f64::try_from(value.clone())
                        .map(Self::Float)
                        .map_err(|_| invalid(format!("not a number: {}", value)))
                }
            }
            ValueKind::String => {
                let s = value.as_str().unwrap_or_default().trim();
                s.parse::<i64>()
                    .map(Self::Int)
                    .or_else(|_| s.parse::<f64>().map(Self::Float))
                    .map_err(|_| invalid(format!("not a number: {:?}", s)))
            }
            other => Err(invalid(format!("expected a number, got {:?}", other))),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

fn arithmetic(
    a: &Value,
    b: &Value,
    op: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, Error> {
    match (Number::from_value(a)?, Number::from_value(b)?) {
        (Number::Int(x), Number::Int(y)) => int_op(x, y)
            .map(Value::from)
            .ok_or_else(|| invalid(format!("integer overflow in {}", op))),
        (x, y) => Ok(Value::from(float_op(x.as_f64(), y.as_f64()))),
    }
}

/// Integer arithmetic when both operands are integers, float otherwise
///
/// Usage: {{ Add(1, 2) }}
pub fn add(a: Value, b: Value) -> Result<Value, Error> {
    arithmetic(&a, &b, "Add", i64::checked_add, |x, y| x + y)
}

pub fn sub(a: Value, b: Value) -> Result<Value, Error> {
    arithmetic(&a, &b, "Sub", i64::checked_sub, |x, y| x - y)
}

pub fn mult(a: Value, b: Value) -> Result<Value, Error> {
    arithmetic(&a, &b, "Mult", i64::checked_mul, |x, y| x * y)
}

pub fn div(a: Value, b: Value) -> Result<Value, Error> {
    if Number::from_value(&b)?.as_f64() == 0.0 {
        return Err(invalid("division by zero"));
    }
    arithmetic(&a, &b, "Div", i64::checked_div, |x, y| x / y)
}

/// Accepts 1, t, T, TRUE, true, True and their false counterparts
pub fn parse_bool(s: String) -> Result<bool, Error> {
    match s.as_str() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(invalid(format!("cannot parse {:?} as bool", s))),
    }
}

/// Usage: {{ ParseInt("ff", 16) }}
pub fn parse_int(s: String, base: Option<u32>) -> Result<i64, Error> {
    let base = base.unwrap_or(10);
    if !(2..=36).contains(&base) {
        return Err(invalid(format!("invalid base {}", base)));
    }
    i64::from_str_radix(s.trim(), base)
        .map_err(|e| invalid(format!("cannot parse {:?} as int: {}", s, e)))
}

pub fn parse_float(s: String) -> Result<f64, Error> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| invalid(format!("cannot parse {:?} as float: {}", s, e)))
}

const SIZE_UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Decimal (powers of 1000) size with four significant digits
///
/// Usage: {{ HumanSize(1500000) }} -> "1.5MB"
pub fn human_size(size: Value) -> Result<String, Error> {
    let mut size = Number::from_value(&size)?.as_f64();
    if !size.is_finite() {
        return Err(invalid(format!("HumanSize: {} is not a finite size", size)));
    }
    let mut unit = 0;
    while size >= 1000.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }
    Ok(format!("{}{}", four_significant(size), SIZE_UNITS[unit]))
}

fn four_significant(value: f64) -> String {
    let integer_digits = if value.abs() < 1.0 {
        1
    } else {
        value.abs().log10().floor() as usize + 1
    };
    let decimals = 4usize.saturating_sub(integer_digits);
    let formatted = format!("{:.*}", decimals, value);
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        assert_eq!(trim("  a b  ".to_string(), None), "a b");
        assert_eq!(trim("--name-".to_string(), Some("-".to_string())), "name");
        assert_eq!(trim_space("\t x \n".to_string()), "x");
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(url_encode("a b&c=d".to_string()), "a+b%26c%3Dd");
    }

    #[test]
    fn test_base64_round_trip() {
        let encoded = base64_encode("hello".to_string());
        assert_eq!(encoded, "aGVsbG8=");
        assert_eq!(base64_decode(encoded).unwrap(), "hello");
        assert!(base64_decode("%%%".to_string()).is_err());
    }

    #[test]
    fn test_split() {
        assert_eq!(split("a,b,c".to_string(), ",".to_string()), vec!["a", "b", "c"]);
        assert_eq!(split("ab".to_string(), String::new()), vec!["a", "b"]);
    }

    #[test]
    fn test_random_string() {
        let s = random_string(16);
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_string(32), random_string(32));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(add(Value::from(1), Value::from(2)).unwrap(), Value::from(3));
        assert_eq!(sub(Value::from(5), Value::from("2")).unwrap(), Value::from(3));
        assert_eq!(mult(Value::from(2), Value::from(2.5)).unwrap(), Value::from(5.0));
        assert_eq!(div(Value::from(7), Value::from(2)).unwrap(), Value::from(3));
        assert!(div(Value::from(1), Value::from(0)).is_err());
        assert!(add(Value::from(1), Value::from("x")).is_err());
        assert!(add(Value::from(i64::MAX), Value::from(1)).is_err());
    }

    #[test]
    fn test_parse() {
        assert!(parse_bool("True".to_string()).unwrap());
        assert!(!parse_bool("0".to_string()).unwrap());
        assert!(parse_bool("yes".to_string()).is_err());
        assert_eq!(parse_int("42".to_string(), None).unwrap(), 42);
        assert_eq!(parse_int("ff".to_string(), Some(16)).unwrap(), 255);
        assert!(parse_int("1".to_string(), Some(1)).is_err());
        assert_eq!(parse_float("1.5".to_string()).unwrap(), 1.5);
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(Value::from(10)).unwrap(), "10B");
        assert_eq!(human_size(Value::from(1000)).unwrap(), "1kB");
        assert_eq!(human_size(Value::from(1_500_000)).unwrap(), "1.5MB");
        assert_eq!(human_size(Value::from(123_456_789)).unwrap(), "123.5MB");
    }

    #[test]
    fn test_human_size_rejects_non_finite() {
        for input in ["inf", "-inf", "NaN"] {
            let err = human_size(Value::from(input)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        }
        assert_eq!(human_size(Value::from(f64::INFINITY)).unwrap_err().kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_now_fmt() {
        let year = now_fmt("%Y".to_string()).unwrap();
        assert_eq!(year.len(), 4);
        assert!(now_fmt("%Q".to_string()).is_err());
    }
}
