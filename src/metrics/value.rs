//! Optional numeric value threaded through every metric calculation
//!
//! A cell is either a number, missing (the source could not be coerced), or
//! undefined (an arithmetic anomaly such as division by zero). Arithmetic on
//! `Value` never panics:
//!
//! - Missing in, missing out (missing wins over undefined)
//! - Undefined in, undefined out
//! - Division by zero, or any non-finite result, is undefined

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Text rendered for an undefined value
pub const UNDEFINED_LABEL: &str = "N/A";

/// A single metric cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// A finite number
    Number(f64),
    /// Absent or not coercible to a number
    #[default]
    Missing,
    /// Result of a division by zero or numeric overflow
    Undefined,
}

impl Value {
    /// Wrap a float; non-finite inputs become `Undefined`
    pub fn new(x: f64) -> Self {
        if x.is_finite() {
            Value::Number(x)
        } else {
            Value::Undefined
        }
    }

    /// Coerce raw text to a value
    ///
    /// Surrounding whitespace is ignored. Empty, unparsable or non-finite text
    /// (`nan`, `inf`) is missing.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Value::Number(x),
            _ => Value::Missing,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Floor negative numbers at zero; markers pass through
    pub fn clip_negative(self) -> Self {
        match self {
            Value::Number(x) if x < 0.0 => Value::Number(0.0),
            other => other,
        }
    }

    /// Apply `f` to the number, if any
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Value::Number(x) => Value::new(f(x)),
            other => other,
        }
    }

    fn combine(self, rhs: Value, f: impl FnOnce(f64, f64) -> Value) -> Value {
        match (self, rhs) {
            (Value::Missing, _) | (_, Value::Missing) => Value::Missing,
            (Value::Undefined, _) | (_, Value::Undefined) => Value::Undefined,
            (Value::Number(a), Value::Number(b)) => f(a, b),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::new(x)
    }
}

impl From<Option<f64>> for Value {
    fn from(x: Option<f64>) -> Self {
        x.map(Value::new).unwrap_or(Value::Missing)
    }
}

impl Add for Value {
    type Output = Value;

    fn add(self, rhs: Value) -> Value {
        self.combine(rhs, |a, b| Value::new(a + b))
    }
}

impl Sub for Value {
    type Output = Value;

    fn sub(self, rhs: Value) -> Value {
        self.combine(rhs, |a, b| Value::new(a - b))
    }
}

impl Mul for Value {
    type Output = Value;

    fn mul(self, rhs: Value) -> Value {
        self.combine(rhs, |a, b| Value::new(a * b))
    }
}

impl Div for Value {
    type Output = Value;

    fn div(self, rhs: Value) -> Value {
        self.combine(rhs, |a, b| {
            if b == 0.0 {
                Value::Undefined
            } else {
                Value::new(a / b)
            }
        })
    }
}

impl fmt::Display for Value {
    /// Numbers honour precision; width right-aligns every variant
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Value::Number(x) => match f.precision() {
                Some(p) => format!("{:.*}", p, x),
                None => x.to_string(),
            },
            Value::Missing => String::new(),
            Value::Undefined => UNDEFINED_LABEL.to_string(),
        };
        match f.width() {
            Some(width) => write!(f, "{:>width$}", text, width = width),
            None => f.write_str(&text),
        }
    }
}

/// Numbers serialize as numbers, undefined as `"N/A"`, missing as `null`
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(x) => serializer.serialize_f64(*x),
            Value::Missing => serializer.serialize_none(),
            Value::Undefined => serializer.serialize_str(UNDEFINED_LABEL),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<RawValue>::deserialize(deserializer)? {
            Some(RawValue::Number(x)) => Value::new(x),
            Some(RawValue::Text(text)) if text.trim() == UNDEFINED_LABEL => Value::Undefined,
            Some(RawValue::Text(text)) => Value::parse(&text),
            None => Value::Missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coerces_or_goes_missing() {
        assert_eq!(Value::parse("42"), Value::Number(42.0));
        assert_eq!(Value::parse(" 0.25 "), Value::Number(0.25));
        assert_eq!(Value::parse("1e3"), Value::Number(1000.0));
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("abc"), Value::Missing);
        assert_eq!(Value::parse("NaN"), Value::Missing);
        assert_eq!(Value::parse("inf"), Value::Missing);
    }

    #[test]
    fn test_missing_takes_precedence() {
        let n = Value::Number(2.0);
        assert_eq!(n + Value::Missing, Value::Missing);
        assert_eq!(Value::Missing * n, Value::Missing);
        assert_eq!(Value::Undefined - Value::Missing, Value::Missing);
        assert_eq!(Value::Undefined / n, Value::Undefined);
        assert_eq!(n * Value::Undefined, Value::Undefined);
    }

    #[test]
    fn test_division_by_zero_is_undefined() {
        assert_eq!(Value::Number(60.0) / Value::Number(0.0), Value::Undefined);
        assert_eq!(Value::Number(0.0) / Value::Number(0.0), Value::Undefined);
        assert_eq!(Value::Number(60.0) / Value::Number(-0.0), Value::Undefined);
        assert_eq!(Value::Number(60.0) / Value::Number(0.1), Value::new(60.0 / 0.1));
    }

    #[test]
    fn test_overflow_is_undefined() {
        assert_eq!(Value::Number(f64::MAX) * Value::Number(10.0), Value::Undefined);
        assert_eq!(Value::new(f64::NAN), Value::Undefined);
    }

    #[test]
    fn test_clip_negative() {
        assert_eq!(Value::Number(-0.5).clip_negative(), Value::Number(0.0));
        assert_eq!(Value::Number(0.5).clip_negative(), Value::Number(0.5));
        assert_eq!(Value::Undefined.clip_negative(), Value::Undefined);
        assert_eq!(Value::Missing.clip_negative(), Value::Missing);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{:.2}", Value::Number(1.2)), "1.20");
        assert_eq!(format!("{:>6.1}", Value::Number(3.0)), "   3.0");
        assert_eq!(format!("{:>5}", Value::Undefined), "  N/A");
        assert_eq!(format!("{}", Value::Missing), "");
    }

    #[test]
    fn test_json_keeps_missing_and_undefined_apart() {
        let values = vec![Value::Number(1.5), Value::Missing, Value::Undefined];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[1.5,null,"N/A"]"#);

        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_json_text_is_coerced() {
        let back: Vec<Value> = serde_json::from_str(r#"[2023, "42", "abc", " N/A "]"#).unwrap();
        assert_eq!(
            back,
            vec![Value::Number(2023.0), Value::Number(42.0), Value::Missing, Value::Undefined]
        );
    }
}
