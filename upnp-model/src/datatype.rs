//! UPnP datatypes and their wire representation
//!
//! Every action argument and state variable is declared with one of the UPnP
//! built-in datatypes. The datatype decides how a value is written into a SOAP,
//! GENA or form body and how the text found on the wire is turned back into a
//! typed [`Value`].

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{InvalidValue, ModelError};

/// Placeholder written by the form encoding for an empty output value.
///
/// A `key=` pair is indistinguishable from a key whose value was lost on the way,
/// so empty outputs travel as `key=<<NULL>>` instead.
pub const NULL_OUTPUT_VALUE: &str = "<<NULL>>";

const DATE_FORMAT: &str = "%Y-%m-%d";
// `%.f` writes fractional seconds only when they are non-zero
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_TIME_TZ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// UPnP built-in datatypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datatype {
    #[serde(rename = "ui1")]
    Ui1,
    #[serde(rename = "ui2")]
    Ui2,
    #[serde(rename = "ui4")]
    Ui4,
    #[serde(rename = "ui8")]
    Ui8,
    #[serde(rename = "i1")]
    I1,
    #[serde(rename = "i2")]
    I2,
    #[serde(rename = "i4")]
    I4,
    #[serde(rename = "i8")]
    I8,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "r4")]
    R4,
    #[serde(rename = "r8")]
    R8,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "fixed.14.4")]
    Fixed14_4,
    #[serde(rename = "char")]
    Char,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "bin.base64")]
    BinBase64,
    #[serde(rename = "bin.hex")]
    BinHex,
    #[serde(rename = "uri")]
    Uri,
    #[serde(rename = "uuid")]
    Uuid,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "dateTime")]
    DateTime,
    #[serde(rename = "dateTime.tz")]
    DateTimeTz,
    #[serde(rename = "time")]
    Time,
}

impl Datatype {
    /// All built-in datatypes, in the order of the UPnP Device Architecture table.
    pub const ALL: [Datatype; 25] = [
        Datatype::Ui1,
        Datatype::Ui2,
        Datatype::Ui4,
        Datatype::Ui8,
        Datatype::I1,
        Datatype::I2,
        Datatype::I4,
        Datatype::I8,
        Datatype::Int,
        Datatype::R4,
        Datatype::R8,
        Datatype::Number,
        Datatype::Float,
        Datatype::Fixed14_4,
        Datatype::Char,
        Datatype::String,
        Datatype::Boolean,
        Datatype::BinBase64,
        Datatype::BinHex,
        Datatype::Uri,
        Datatype::Uuid,
        Datatype::Date,
        Datatype::DateTime,
        Datatype::DateTimeTz,
        Datatype::Time,
    ];

    /// The name used for this datatype in service descriptors
    pub fn upnp_name(self) -> &'static str {
        match self {
            Datatype::Ui1 => "ui1",
            Datatype::Ui2 => "ui2",
            Datatype::Ui4 => "ui4",
            Datatype::Ui8 => "ui8",
            Datatype::I1 => "i1",
            Datatype::I2 => "i2",
            Datatype::I4 => "i4",
            Datatype::I8 => "i8",
            Datatype::Int => "int",
            Datatype::R4 => "r4",
            Datatype::R8 => "r8",
            Datatype::Number => "number",
            Datatype::Float => "float",
            Datatype::Fixed14_4 => "fixed.14.4",
            Datatype::Char => "char",
            Datatype::String => "string",
            Datatype::Boolean => "boolean",
            Datatype::BinBase64 => "bin.base64",
            Datatype::BinHex => "bin.hex",
            Datatype::Uri => "uri",
            Datatype::Uuid => "uuid",
            Datatype::Date => "date",
            Datatype::DateTime => "dateTime",
            Datatype::DateTimeTz => "dateTime.tz",
            Datatype::Time => "time",
        }
    }

    /// Inclusive bounds of the integer datatypes, as `i128` so both signed and
    /// unsigned widths fit.
    fn integer_bounds(self) -> Option<(i128, i128)> {
        match self {
            Datatype::Ui1 => Some((0, u8::MAX as i128)),
            Datatype::Ui2 => Some((0, u16::MAX as i128)),
            Datatype::Ui4 => Some((0, u32::MAX as i128)),
            Datatype::Ui8 => Some((0, u64::MAX as i128)),
            Datatype::I1 => Some((i8::MIN as i128, i8::MAX as i128)),
            Datatype::I2 => Some((i16::MIN as i128, i16::MAX as i128)),
            Datatype::I4 | Datatype::Int => Some((i32::MIN as i128, i32::MAX as i128)),
            Datatype::I8 => Some((i64::MIN as i128, i64::MAX as i128)),
            _ => None,
        }
    }

    fn is_unsigned(self) -> bool {
        matches!(
            self,
            Datatype::Ui1 | Datatype::Ui2 | Datatype::Ui4 | Datatype::Ui8
        )
    }

    /// Convert wire text into a typed value.
    ///
    /// Empty text is an absent value (`None`) for every datatype except
    /// `string`, where it is the empty string. Surrounding whitespace is
    /// ignored for all other datatypes except `char`, where a lone
    /// whitespace character is the value itself.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidValue`] when the text is not a valid representation of
    /// this datatype, including integers outside the declared width.
    pub fn parse(self, text: &str) -> Result<Option<Value>, InvalidValue> {
        match self {
            Datatype::String => return Ok(Some(Value::String(text.to_string()))),
            Datatype::Uri | Datatype::Uuid if !text.is_empty() => {
                return Ok(Some(Value::String(text.to_string())))
            }
            Datatype::Char if text.chars().count() == 1 => {
                return Ok(text.chars().next().map(Value::Char))
            }
            _ => {}
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if let Some((min, max)) = self.integer_bounds() {
            let parsed: i128 = trimmed
                .parse()
                .map_err(|_| InvalidValue::new(self, text, "not an integer"))?;
            if parsed < min || parsed > max {
                return Err(InvalidValue::new(
                    self,
                    text,
                    format!("outside of range {}..={}", min, max),
                ));
            }
            return Ok(Some(if self.is_unsigned() {
                Value::Unsigned(parsed as u64)
            } else {
                Value::Signed(parsed as i64)
            }));
        }

        let value = match self {
            // r4 and float are held as f64 too
            Datatype::R4
            | Datatype::R8
            | Datatype::Number
            | Datatype::Fixed14_4
            | Datatype::Float => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| InvalidValue::new(self, text, "not a floating point number"))?,
            Datatype::Char => {
                let mut chars = trimmed.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Value::Char(c),
                    _ => return Err(InvalidValue::new(self, text, "expected a single character")),
                }
            }
            Datatype::Boolean => Value::Boolean(parse_boolean(trimmed).ok_or_else(|| {
                InvalidValue::new(self, text, "expected one of 1/0, true/false, yes/no")
            })?),
            Datatype::BinBase64 => Value::Base64(
                BASE64
                    .decode(trimmed)
                    .map_err(|e| InvalidValue::new(self, text, e.to_string()))?,
            ),
            Datatype::BinHex => Value::Hex(
                hex::decode(trimmed).map_err(|e| InvalidValue::new(self, text, e.to_string()))?,
            ),
            Datatype::Date => Value::Date(
                NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                    .map_err(|e| InvalidValue::new(self, text, e.to_string()))?,
            ),
            Datatype::DateTime => Value::DateTime(parse_date_time(trimmed).map_err(|e| {
                InvalidValue::new(self, text, e.to_string())
            })?),
            Datatype::DateTimeTz => Value::DateTimeTz(
                DateTime::parse_from_rfc3339(trimmed)
                    .map_err(|e| InvalidValue::new(self, text, e.to_string()))?,
            ),
            Datatype::Time => Value::Time(
                NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
                    .map_err(|e| InvalidValue::new(self, text, e.to_string()))?,
            ),
            // Handled above
            _ => Value::String(text.to_string()),
        };

        Ok(Some(value))
    }

    /// Check that a typed value belongs to this datatype.
    ///
    /// Integer values are checked against the width of the datatype.
    pub fn accepts(self, value: &Value) -> bool {
        if let Some((min, max)) = self.integer_bounds() {
            let n = match value {
                Value::Unsigned(n) => *n as i128,
                Value::Signed(n) => *n as i128,
                _ => return false,
            };
            return n >= min && n <= max;
        }

        matches!(
            (self, value),
            (
                Datatype::R4
                    | Datatype::R8
                    | Datatype::Number
                    | Datatype::Float
                    | Datatype::Fixed14_4,
                Value::Float(_)
            ) | (Datatype::Char, Value::Char(_))
                | (
                    Datatype::String | Datatype::Uri | Datatype::Uuid,
                    Value::String(_)
                )
                | (Datatype::Boolean, Value::Boolean(_))
                | (Datatype::BinBase64, Value::Base64(_))
                | (Datatype::BinHex, Value::Hex(_))
                | (Datatype::Date, Value::Date(_))
                | (Datatype::DateTime, Value::DateTime(_))
                | (Datatype::DateTimeTz, Value::DateTimeTz(_))
                | (Datatype::Time, Value::Time(_))
        )
    }

    /// Bring a value produced by a generic conversion (`From<u32>`, `From<&str>`, ...)
    /// into the representation this datatype uses.
    ///
    /// `Value::Unsigned` and `Value::Signed` are interchangeable for integer
    /// datatypes, and plain strings are parsed for every non-string datatype.
    pub fn coerce(self, value: Value) -> Result<Value, ModelError> {
        if self.accepts(&value) {
            return Ok(value);
        }

        let coerced = match (&value, self.integer_bounds()) {
            (Value::Unsigned(n), Some(_)) if !self.is_unsigned() => Some(Value::Signed(*n as i64)),
            (Value::Signed(n), Some(_)) if self.is_unsigned() && *n >= 0 => {
                Some(Value::Unsigned(*n as u64))
            }
            (Value::String(s), _) => self.parse(s)?,
            _ => None,
        };

        match coerced {
            Some(v) if self.accepts(&v) => Ok(v),
            _ => Err(ModelError::TypeMismatch {
                datatype: self,
                value: format!("{:?}", value),
            }),
        }
    }
}

fn parse_boolean(text: &str) -> Option<bool> {
    if ["1", "true", "yes"].iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if ["0", "false", "no"].iter().any(|t| text.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

fn parse_date_time(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).or_else(|e| {
        // A bare date is a valid dateTime at midnight
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or(e)
    })
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.upnp_name())
    }
}

impl FromStr for Datatype {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Datatype::ALL
            .iter()
            .copied()
            .find(|d| d.upnp_name() == s)
            .ok_or_else(|| ModelError::UnknownDatatype(s.to_string()))
    }
}

/// A typed argument or state-variable value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Char(char),
    /// Text of `string`, `uri` and `uuid` values
    String(String),
    Base64(Vec<u8>),
    Hex(Vec<u8>),
    Date(NaiveDate),
    /// Written with fractional seconds when the value has any
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Time(NaiveTime),
}

impl Value {
    /// Render the value the way it is written into a message body.
    ///
    /// Booleans are written as `1`/`0`, binary values are re-encoded with
    /// the codec of their datatype and dates use the ISO-8601 forms.
    pub fn to_wire_string(&self) -> String {
        match self {
            Value::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Unsigned(n) => n.to_string(),
            Value::Signed(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Char(c) => c.to_string(),
            Value::String(s) => s.clone(),
            Value::Base64(bytes) => BASE64.encode(bytes),
            Value::Hex(bytes) => hex::encode(bytes),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::DateTime(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
            Value::DateTimeTz(dt) => dt.format(DATE_TIME_TZ_FORMAT).to_string(),
            Value::Time(t) => t.format(TIME_FORMAT).to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Unsigned(n) => Some(*n),
            Value::Signed(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Signed(n) => Some(*n),
            Value::Unsigned(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Unsigned(n as u64)
            }
        })*
    };
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Signed(n as i64)
            }
        })*
    };
}

impl_from_unsigned!(u8, u16, u32, u64);
impl_from_signed!(i8, i16, i32, i64);
