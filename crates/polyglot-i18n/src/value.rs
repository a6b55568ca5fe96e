//! Runtime values supplied to compiled messages

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A single argument value passed to a compiled message.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or explicitly null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Any number; integers are carried as `f64`
    Number(f64),
    /// Text
    Text(String),
    /// Point in time
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Falsy values render as the empty string when interpolated.
    ///
    /// Zero is deliberately not falsy here: a literal `0` must still show up.
    pub fn is_empty_like(&self) -> bool {
        match self {
            Self::Null | Self::Bool(false) => true,
            Self::Number(n) => n.is_nan(),
            Self::Text(s) => s.is_empty(),
            Self::Bool(true) | Self::DateTime(_) => false,
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s.trim().parse().ok(),
            #[allow(clippy::cast_precision_loss)]
            Self::DateTime(dt) => Some(dt.timestamp_millis() as f64),
            Self::Null => None,
        }
    }

    /// Interpret the value as a point in time.
    ///
    /// Numbers are milliseconds since the Unix epoch; text must be RFC 3339.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            #[allow(clippy::cast_possible_truncation)]
            Self::Number(n) if n.is_finite() => Utc.timestamp_millis_opt(*n as i64).single(),
            Self::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }
}

pub(crate) static NULL: Value = Value::Null;

/// Plain rendering of a number: integral values print without a fraction.
pub fn plain_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&plain_number(*n)),
            Self::Text(s) => f.write_str(s),
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
        }
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
                fn from(n: $ty) -> Self {
                    Self::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Named arguments for a compiled message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageValues {
    values: BTreeMap<String, Value>,
}

impl MessageValues {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace an argument in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up an argument; missing arguments read as null
    pub fn get(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&NULL)
    }

    /// Whether an argument is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Build arguments from a JSON object; any other JSON yields an empty set
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect(),
            _ => Self::default(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MessageValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Build [`MessageValues`] from `name => value` pairs.
///
/// ```
/// use polyglot_i18n::values;
///
/// let args = values!("count" => 3, "name" => "Ann");
/// assert_eq!(args.get("name").to_string(), "Ann");
/// ```
#[macro_export]
macro_rules! values {
    () => {
        $crate::MessageValues::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut values = $crate::MessageValues::new();
        $(
            values.insert($key, $value);
        )+
        values
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_number() {
        assert_eq!(plain_number(3.0), "3");
        assert_eq!(plain_number(-0.0), "0");
        assert_eq!(plain_number(2.5), "2.5");
        assert_eq!(plain_number(f64::NAN), "NaN");
        assert_eq!(plain_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_empty_like() {
        assert!(Value::Null.is_empty_like());
        assert!(Value::from("").is_empty_like());
        assert!(Value::from(false).is_empty_like());
        assert!(Value::from(f64::NAN).is_empty_like());
        assert!(!Value::from(0).is_empty_like());
        assert!(!Value::from("x").is_empty_like());
    }

    #[test]
    fn test_builder_and_macro_agree() {
        let built = MessageValues::new().with("count", 3).with("name", "Ann");
        let macroed = values!("count" => 3, "name" => "Ann");
        assert_eq!(built, macroed);
        assert_eq!(built.get("missing"), &Value::Null);
        assert!(built.contains("count"));
    }

    #[test]
    fn test_from_json() {
        let args = MessageValues::from_json(serde_json::json!({
            "count": 4,
            "who": "Bo",
            "flag": null
        }));
        assert_eq!(args.get("count"), &Value::Number(4.0));
        assert_eq!(args.get("who"), &Value::Text("Bo".to_string()));
        assert_eq!(args.get("flag"), &Value::Null);
    }

    #[test]
    fn test_as_datetime() {
        let dt = Value::from(0).as_datetime().unwrap();
        assert_eq!(dt.timestamp(), 0);
        assert!(Value::from("2024-03-01T10:00:00Z").as_datetime().is_some());
        assert!(Value::from("yesterday").as_datetime().is_none());
        assert!(Value::Null.as_datetime().is_none());
    }
}
