use std::fmt;

/// Represents a SQL value in a driver-agnostic way, both as a parameter and
/// as a fetched column value. Native clients convert these to their own types.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SqlValue {
    #[default]
    Null,
    Text(String),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlValue::Int32(_) | SqlValue::Int64(_) | SqlValue::Float64(_)
        )
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int32(v) => Some(*v as i64),
            SqlValue::Int64(v) => Some(*v),
            SqlValue::Bool(v) => Some(*v as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Int32(v) => write!(f, "{}", v),
            SqlValue::Int64(v) => write!(f, "{}", v),
            SqlValue::Float64(v) => write!(f, "{}", v),
            SqlValue::Bool(v) => write!(f, "{}", *v as u8),
            SqlValue::Blob(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int32(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int64(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float64(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Declared type of a bound parameter.
/// The value is coerced to this type when the statement executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    Null,
    Int,
    #[default]
    Str,
    Lob,
    Bool,
}

impl ParamType {
    /// Coerces `value` to the declared type. Values that cannot be coerced
    /// (e.g. non-numeric text declared as `Int`) are passed through unchanged
    /// and left for the engine to reject.
    pub fn coerce(self, value: SqlValue) -> SqlValue {
        match (self, value) {
            (_, SqlValue::Null) | (ParamType::Null, _) => SqlValue::Null,
            (ParamType::Int, SqlValue::Text(s)) => match s.trim().parse::<i64>() {
                Ok(v) => SqlValue::Int64(v),
                Err(_) => SqlValue::Text(s),
            },
            (ParamType::Int, SqlValue::Bool(b)) => SqlValue::Int32(b as i32),
            (ParamType::Bool, SqlValue::Int32(v)) => SqlValue::Bool(v != 0),
            (ParamType::Bool, SqlValue::Int64(v)) => SqlValue::Bool(v != 0),
            (ParamType::Bool, SqlValue::Text(s)) => {
                SqlValue::Bool(!(s.is_empty() || s == "0"))
            }
            (ParamType::Lob, SqlValue::Text(s)) => SqlValue::Blob(s.into_bytes()),
            (_, value) => value,
        }
    }
}
