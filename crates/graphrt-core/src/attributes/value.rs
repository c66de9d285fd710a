//! Typed attribute values.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Type tag of an [`AttributeValue`], with stable wire values.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// No value.
    Null = 0,
    /// Boolean.
    Boolean = 1,
    /// 32-bit signed integer.
    Int = 2,
    /// 64-bit signed integer.
    Long = 3,
    /// 32-bit float.
    Float = 4,
    /// 64-bit float.
    Double = 5,
    /// Plain text.
    String = 6,
    /// HTML text.
    Html = 7,
    /// Value of unknown type, kept as text.
    Unknown = 8,
    /// Identifier text.
    Identifier = 9,
}

impl AttributeType {
    /// Every type, ordered by wire value.
    pub const ALL: [AttributeType; 10] = [
        AttributeType::Null,
        AttributeType::Boolean,
        AttributeType::Int,
        AttributeType::Long,
        AttributeType::Float,
        AttributeType::Double,
        AttributeType::String,
        AttributeType::Html,
        AttributeType::Unknown,
        AttributeType::Identifier,
    ];

    /// Wire value.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Decode a wire value.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Lower-case name as used by exporters.
    pub const fn name(self) -> &'static str {
        match self {
            AttributeType::Null => "null",
            AttributeType::Boolean => "boolean",
            AttributeType::Int => "int",
            AttributeType::Long => "long",
            AttributeType::Float => "float",
            AttributeType::Double => "double",
            AttributeType::String => "string",
            AttributeType::Html => "html",
            AttributeType::Unknown => "unknown",
            AttributeType::Identifier => "identifier",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttributeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::IllegalArgument(format!("unknown attribute type {s:?}")))
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// No value.
    Null,
    /// Boolean.
    Boolean(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Plain text.
    String(String),
    /// HTML text.
    Html(String),
    /// Value of unknown type, kept as text.
    Unknown(String),
    /// Identifier text.
    Identifier(String),
}

impl AttributeValue {
    /// Type tag of this value.
    pub fn value_type(&self) -> AttributeType {
        match self {
            AttributeValue::Null => AttributeType::Null,
            AttributeValue::Boolean(_) => AttributeType::Boolean,
            AttributeValue::Int(_) => AttributeType::Int,
            AttributeValue::Long(_) => AttributeType::Long,
            AttributeValue::Float(_) => AttributeType::Float,
            AttributeValue::Double(_) => AttributeType::Double,
            AttributeValue::String(_) => AttributeType::String,
            AttributeValue::Html(_) => AttributeType::Html,
            AttributeValue::Unknown(_) => AttributeType::Unknown,
            AttributeValue::Identifier(_) => AttributeType::Identifier,
        }
    }

    /// Build a value of the given type from text.
    ///
    /// Numeric and boolean types parse the text; textual types keep it.
    pub fn parse(value_type: AttributeType, text: &str) -> Result<Self> {
        let number = |target: &'static str| Error::NumberFormat {
            text: text.to_string(),
            target,
        };
        Ok(match value_type {
            AttributeType::Null => AttributeValue::Null,
            AttributeType::Boolean => AttributeValue::Boolean(parse_bool(text).ok_or_else(|| {
                Error::TypeMismatch {
                    expected: "boolean",
                    found: format!("{text:?}"),
                }
            })?),
            AttributeType::Int => {
                AttributeValue::Int(text.trim().parse().map_err(|_| number("int"))?)
            }
            AttributeType::Long => {
                AttributeValue::Long(text.trim().parse().map_err(|_| number("long"))?)
            }
            AttributeType::Float => {
                AttributeValue::Float(text.trim().parse().map_err(|_| number("float"))?)
            }
            AttributeType::Double => {
                AttributeValue::Double(text.trim().parse().map_err(|_| number("double"))?)
            }
            AttributeType::String => AttributeValue::String(text.to_string()),
            AttributeType::Html => AttributeValue::Html(text.to_string()),
            AttributeType::Unknown => AttributeValue::Unknown(text.to_string()),
            AttributeType::Identifier => AttributeValue::Identifier(text.to_string()),
        })
    }

    /// Text form consumed by exporters.
    pub fn render(&self) -> String {
        match self {
            AttributeValue::Null => "null".to_string(),
            AttributeValue::Boolean(b) => b.to_string(),
            AttributeValue::Int(v) => v.to_string(),
            AttributeValue::Long(v) => v.to_string(),
            AttributeValue::Float(v) => v.to_string(),
            AttributeValue::Double(v) => v.to_string(),
            AttributeValue::String(s)
            | AttributeValue::Html(s)
            | AttributeValue::Unknown(s)
            | AttributeValue::Identifier(s) => s.clone(),
        }
    }

    /// Interpret as a boolean.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            AttributeValue::Boolean(b) => Ok(*b),
            AttributeValue::String(s) | AttributeValue::Unknown(s) => {
                parse_bool(s).ok_or_else(|| self.mismatch("boolean"))
            }
            _ => Err(self.mismatch("boolean")),
        }
    }

    /// Interpret as a 64-bit integer, parsing the text form if needed.
    pub fn as_long(&self) -> Result<i64> {
        match self {
            AttributeValue::Int(v) => Ok(i64::from(*v)),
            AttributeValue::Long(v) => Ok(*v),
            other => {
                let text = other.render();
                text.trim().parse().map_err(|_| Error::NumberFormat {
                    text,
                    target: "long",
                })
            }
        }
    }

    /// Interpret as a 32-bit integer. Longs outside the range fail.
    pub fn as_int(&self) -> Result<i32> {
        let long = self.as_long().map_err(|err| match err {
            Error::NumberFormat { text, .. } => Error::NumberFormat {
                text,
                target: "int",
            },
            other => other,
        })?;
        i32::try_from(long).map_err(|_| Error::NumberFormat {
            text: long.to_string(),
            target: "int",
        })
    }

    /// Interpret as a 64-bit float, parsing the text form if needed.
    pub fn as_double(&self) -> Result<f64> {
        match self {
            AttributeValue::Int(v) => Ok(f64::from(*v)),
            // Precision loss above 2^53 matches a C cast.
            AttributeValue::Long(v) => Ok(*v as f64),
            AttributeValue::Float(v) => Ok(f64::from(*v)),
            AttributeValue::Double(v) => Ok(*v),
            other => {
                let text = other.render();
                text.trim().parse().map_err(|_| Error::NumberFormat {
                    text,
                    target: "double",
                })
            }
        }
    }

    /// Text form of the value.
    pub fn as_string(&self) -> String {
        self.render()
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.value_type().name().to_string(),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        t if t.eq_ignore_ascii_case("true") => Some(true),
        t if t.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Boolean(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Long(v)
    }
}

impl From<f32> for AttributeValue {
    fn from(v: f32) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Double(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;

    #[test]
    fn test_type_codes() {
        for (idx, ty) in AttributeType::ALL.iter().enumerate() {
            assert_eq!(ty.code() as usize, idx);
            assert_eq!(AttributeType::from_code(ty.code()), Some(*ty));
        }
        assert_eq!(AttributeType::from_code(10), None);
        assert_eq!("DOUBLE".parse::<AttributeType>().unwrap(), AttributeType::Double);
        assert!("decimal".parse::<AttributeType>().is_err());
    }

    #[test]
    fn test_render() {
        assert_eq!(AttributeValue::Null.render(), "null");
        assert_eq!(AttributeValue::Boolean(true).render(), "true");
        assert_eq!(AttributeValue::Long(-42).render(), "-42");
        assert_eq!(AttributeValue::Double(1.5).render(), "1.5");
        assert_eq!(AttributeValue::Html("<b>x</b>".into()).render(), "<b>x</b>");
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(AttributeValue::Int(7).as_long().unwrap(), 7);
        assert_eq!(AttributeValue::String(" 12 ".into()).as_long().unwrap(), 12);
        assert_eq!(AttributeValue::String("2.5".into()).as_double().unwrap(), 2.5);
        assert_eq!(AttributeValue::Float(0.5).as_double().unwrap(), 0.5);

        let err = AttributeValue::String("red".into()).as_long().unwrap_err();
        assert_eq!(err.status(), Status::NumberFormatError);

        let err = AttributeValue::Long(1 << 40).as_int().unwrap_err();
        assert_eq!(err.status(), Status::NumberFormatError);
        assert_eq!(AttributeValue::Long(-3).as_int().unwrap(), -3);
    }

    #[test]
    fn test_boolean_conversion() {
        assert!(AttributeValue::Boolean(true).as_bool().unwrap());
        assert!(!AttributeValue::String("False".into()).as_bool().unwrap());
        let err = AttributeValue::Int(1).as_bool().unwrap_err();
        assert_eq!(err.status(), Status::ClassCast);
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            AttributeValue::parse(AttributeType::Int, "5").unwrap(),
            AttributeValue::Int(5)
        );
        assert_eq!(
            AttributeValue::parse(AttributeType::Html, "<i/>").unwrap(),
            AttributeValue::Html("<i/>".into())
        );
        let err = AttributeValue::parse(AttributeType::Double, "abc").unwrap_err();
        assert_eq!(err.status(), Status::NumberFormatError);
    }
}
