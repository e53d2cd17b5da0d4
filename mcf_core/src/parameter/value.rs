//! Parameter data types and value conversions.
//!
//! Values are stored as a tagged union. Every setter funnels through
//! [`ParameterType::parse_value`], so the accepted string formats are the
//! same no matter which typed accessor a caller uses:
//!
//! | Type     | Accepted input                                     | Rendered as        |
//! |----------|----------------------------------------------------|--------------------|
//! | `string` | anything                                           | verbatim           |
//! | `int`    | decimal `i64`, surrounding whitespace ignored       | decimal            |
//! | `double` | any `f64` literal                                  | shortest round-trip|
//! | `bool`   | `true`/`false` (any case) or an integer, non-zero = true | `1` / `0`    |
//! | `uuid`   | any UUID form, empty = nil                         | lowercase hyphenated |

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::names::normalize_uuid;

// ─── ParameterType ──────────────────────────────────────────────────

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Int,
    Double,
    Bool,
    Uuid,
}

impl ParameterType {
    /// Type name as used in definition files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::Uuid => "uuid",
        }
    }

    /// Zero value of this type.
    pub fn zero_value(&self) -> ParameterValue {
        match self {
            Self::String => ParameterValue::String(String::new()),
            Self::Int => ParameterValue::Int(0),
            Self::Double => ParameterValue::Double(0.0),
            Self::Bool => ParameterValue::Bool(false),
            Self::Uuid => ParameterValue::Uuid(uuid::Uuid::nil().hyphenated().to_string()),
        }
    }

    /// Parse `text` into a value of this type.
    pub fn parse_value(&self, text: &str) -> CoreResult<ParameterValue> {
        match self {
            Self::String => Ok(ParameterValue::String(text.to_string())),
            Self::Int => parse_int(text).map(ParameterValue::Int),
            Self::Double => parse_double(text).map(ParameterValue::Double),
            Self::Bool => parse_bool(text).map(ParameterValue::Bool),
            Self::Uuid => normalize_uuid(text).map(ParameterValue::Uuid),
        }
    }

    /// Parse a default value. Blank text yields the zero value.
    pub fn parse_default(&self, text: &str) -> CoreResult<ParameterValue> {
        if text.trim().is_empty() {
            Ok(self.zero_value())
        } else {
            self.parse_value(text)
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "int" => Ok(Self::Int),
            "double" => Ok(Self::Double),
            "bool" => Ok(Self::Bool),
            "uuid" => Ok(Self::Uuid),
            _ => Err(CoreError::InvalidParameterType(s.to_string())),
        }
    }
}

// ─── ParameterValue ─────────────────────────────────────────────────

/// Current or default value of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    /// Normalized lowercase hyphenated UUID.
    Uuid(String),
}

impl ParameterValue {
    /// Type tag of this value.
    pub fn data_type(&self) -> ParameterType {
        match self {
            Self::String(_) => ParameterType::String,
            Self::Int(_) => ParameterType::Int,
            Self::Double(_) => ParameterType::Double,
            Self::Bool(_) => ParameterType::Bool,
            Self::Uuid(_) => ParameterType::Uuid,
        }
    }

    /// Integer view. Doubles must be integral.
    pub fn as_int(&self) -> CoreResult<i64> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Bool(b) => Ok(i64::from(*b)),
            Self::Double(d) => {
                if d.fract() == 0.0 && *d >= i64::MIN as f64 && *d < i64::MAX as f64 {
                    Ok(*d as i64)
                } else {
                    Err(invalid(self, "int"))
                }
            }
            Self::String(s) | Self::Uuid(s) => parse_int(s),
        }
    }

    /// Floating point view.
    pub fn as_double(&self) -> CoreResult<f64> {
        match self {
            Self::Double(d) => Ok(*d),
            Self::Int(v) => Ok(*v as f64),
            Self::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::String(s) | Self::Uuid(s) => parse_double(s),
        }
    }

    /// Boolean view. Numbers are true when non-zero.
    pub fn as_bool(&self) -> CoreResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Int(v) => Ok(*v != 0),
            Self::Double(d) => Ok(*d != 0.0),
            Self::String(s) | Self::Uuid(s) => parse_bool(s),
        }
    }

    /// UUID view, normalized.
    pub fn as_uuid(&self) -> CoreResult<String> {
        match self {
            Self::Uuid(s) => Ok(s.clone()),
            Self::String(s) => normalize_uuid(s),
            _ => Err(invalid(self, "uuid")),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Uuid(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

// ─── Parsing ────────────────────────────────────────────────────────

fn invalid(value: &ParameterValue, expected: &'static str) -> CoreError {
    CoreError::InvalidParameterValue {
        value: value.to_string(),
        expected,
    }
}

fn parse_int(text: &str) -> CoreResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| CoreError::InvalidParameterValue {
            value: text.to_string(),
            expected: "int",
        })
}

fn parse_double(text: &str) -> CoreResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| CoreError::InvalidParameterValue {
            value: text.to_string(),
            expected: "double",
        })
}

fn parse_bool(text: &str) -> CoreResult<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(false);
    }
    trimmed
        .parse::<i64>()
        .map(|v| v != 0)
        .map_err(|_| CoreError::InvalidParameterValue {
            value: text.to_string(),
            expected: "bool",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_from_str() {
        assert_eq!("double".parse::<ParameterType>().unwrap(), ParameterType::Double);
        assert_eq!("uuid".parse::<ParameterType>().unwrap(), ParameterType::Uuid);
        assert!(matches!(
            "float".parse::<ParameterType>(),
            Err(CoreError::InvalidParameterType(_))
        ));
    }

    #[test]
    fn type_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            ty: ParameterType,
        }
        let w: Wrapper = toml::from_str("ty = \"bool\"").unwrap();
        assert_eq!(w.ty, ParameterType::Bool);
    }

    #[test]
    fn bool_accepts_words_and_integers() {
        let t = ParameterType::Bool;
        assert_eq!(t.parse_value("true").unwrap(), ParameterValue::Bool(true));
        assert_eq!(t.parse_value("FALSE").unwrap(), ParameterValue::Bool(false));
        assert_eq!(t.parse_value("5").unwrap(), ParameterValue::Bool(true));
        assert_eq!(t.parse_value("-1").unwrap(), ParameterValue::Bool(true));
        assert_eq!(t.parse_value("0").unwrap(), ParameterValue::Bool(false));
        assert!(t.parse_value("yes").is_err());
    }

    #[test]
    fn bool_renders_as_digit() {
        assert_eq!(ParameterValue::Bool(true).to_string(), "1");
        assert_eq!(ParameterValue::Bool(false).to_string(), "0");
    }

    #[test]
    fn int_parse_trims() {
        assert_eq!(
            ParameterType::Int.parse_value(" 42 ").unwrap(),
            ParameterValue::Int(42)
        );
        assert!(ParameterType::Int.parse_value("4.2").is_err());
    }

    #[test]
    fn double_rendering_round_trips() {
        let v = ParameterType::Double.parse_value("5").unwrap();
        assert_eq!(v.to_string(), "5");
        let v = ParameterType::Double.parse_value("0.125").unwrap();
        assert_eq!(v.to_string(), "0.125");
    }

    #[test]
    fn blank_default_is_zero() {
        assert_eq!(
            ParameterType::Int.parse_default("").unwrap(),
            ParameterValue::Int(0)
        );
        assert_eq!(
            ParameterType::Bool.parse_default("  ").unwrap(),
            ParameterValue::Bool(false)
        );
    }

    #[test]
    fn cross_type_views() {
        assert_eq!(ParameterValue::Double(3.0).as_int().unwrap(), 3);
        assert!(ParameterValue::Double(3.5).as_int().is_err());
        assert_eq!(ParameterValue::Int(2).as_double().unwrap(), 2.0);
        assert!(ParameterValue::Double(0.5).as_bool().unwrap());
        assert!(!ParameterValue::String("0".into()).as_bool().unwrap());
        assert!(ParameterValue::Int(1).as_uuid().is_err());
    }

    #[test]
    fn double_outside_int_range_is_rejected() {
        // 2^63 rounds up from i64::MAX and must not saturate.
        assert!(ParameterValue::Double(9.223372036854775807e18).as_int().is_err());
        assert!(ParameterValue::Double(-9.223372036854775808e18).as_int().is_ok());
        assert!(ParameterValue::Double(f64::NAN).as_int().is_err());
    }
}
