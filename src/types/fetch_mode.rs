use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{IbrsError, Result};
use crate::types::{ClassObject, SqlValue};

/// Integer codes for fetch modes, as used by host frameworks that pass modes
/// around as plain numbers.
pub mod codes {
    pub const FETCH_ASSOC: i32 = 2;
    pub const FETCH_NUM: i32 = 3;
    pub const FETCH_BOTH: i32 = 4;
    pub const FETCH_OBJ: i32 = 5;
    pub const FETCH_COLUMN: i32 = 7;
    pub const FETCH_CLASS: i32 = 8;
}

/// Shape in which fetched rows are returned.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchMode {
    /// One scalar from the given column position
    Column(usize),
    /// One opaque record with a field per column
    Object,
    /// A record re-mapped onto a declared target shape
    Class(Arc<ObjectSchema>),
    /// Column name to value, in column order
    Associative,
    /// Values in column order
    Numeric,
    /// Numeric values followed by the associative ones
    #[default]
    Mixed,
}

/// Mode-specific arguments accompanying an integer fetch mode code.
#[derive(Debug, Clone, Default)]
pub enum FetchArgs {
    #[default]
    None,
    Column(usize),
    Class(Arc<ObjectSchema>),
}

impl FetchMode {
    /// Resolves an integer mode code and its arguments.
    pub fn from_code(code: i32, args: FetchArgs) -> Result<Self> {
        match (code, args) {
            (codes::FETCH_ASSOC, _) => Ok(FetchMode::Associative),
            (codes::FETCH_NUM, _) => Ok(FetchMode::Numeric),
            (codes::FETCH_BOTH, _) => Ok(FetchMode::Mixed),
            (codes::FETCH_OBJ, _) => Ok(FetchMode::Object),
            (codes::FETCH_COLUMN, FetchArgs::Column(index)) => Ok(FetchMode::Column(index)),
            (codes::FETCH_COLUMN, _) => Ok(FetchMode::Column(0)),
            (codes::FETCH_CLASS, FetchArgs::Class(schema)) => Ok(FetchMode::Class(schema)),
            (codes::FETCH_CLASS, _) => Err(IbrsError::usage(
                "fetch mode FETCH_CLASS requires a target class schema",
            )),
            (code, _) => Err(IbrsError::usage(format!(
                "fetch mode {} not supported",
                code
            ))),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            FetchMode::Column(_) => codes::FETCH_COLUMN,
            FetchMode::Object => codes::FETCH_OBJ,
            FetchMode::Class(_) => codes::FETCH_CLASS,
            FetchMode::Associative => codes::FETCH_ASSOC,
            FetchMode::Numeric => codes::FETCH_NUM,
            FetchMode::Mixed => codes::FETCH_BOTH,
        }
    }
}

/// Declared field set of a custom-object fetch target.
///
/// The case-insensitive lookup table is built once, on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    class: String,
    fields: Vec<String>,
    exact: HashMap<String, usize>,
    folded: HashMap<String, usize>,
    args: Vec<SqlValue>,
}

impl ObjectSchema {
    pub fn new<I, S>(class: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let mut exact = HashMap::with_capacity(fields.len());
        let mut folded = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            exact.entry(field.clone()).or_insert(i);
            // First declaration wins when two fields differ only by case.
            folded.entry(field.to_lowercase()).or_insert(i);
        }
        Self {
            class: class.into(),
            fields,
            exact,
            folded,
            args: Vec::new(),
        }
    }

    /// Attaches constructor arguments handed to every materialized object.
    pub fn with_args(mut self, args: Vec<SqlValue>) -> Self {
        self.args = args;
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }

    /// Finds the declared field for a column name: exact match first, then
    /// case-insensitive.
    pub fn resolve(&self, column: &str) -> Option<&str> {
        self.exact
            .get(column)
            .or_else(|| self.folded.get(&column.to_lowercase()))
            .map(|&i| self.fields[i].as_str())
    }
}

/// A statically declared fetch target.
///
/// ```ignore
/// struct User { id: i64, name: String }
///
/// impl FromRecord for User {
///     const CLASS: &'static str = "User";
///     const FIELDS: &'static [&'static str] = &["id", "name"];
///
///     fn from_object(mut object: ClassObject) -> Result<Self> {
///         Ok(User {
///             id: object.take("id").as_i64().unwrap_or_default(),
///             name: object.take("name").to_string(),
///         })
///     }
/// }
/// ```
pub trait FromRecord: Sized {
    const CLASS: &'static str;
    const FIELDS: &'static [&'static str];

    fn from_object(object: ClassObject) -> Result<Self>;

    fn schema() -> ObjectSchema {
        ObjectSchema::new(Self::CLASS, Self::FIELDS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_known_modes() {
        assert_eq!(
            FetchMode::from_code(codes::FETCH_NUM, FetchArgs::None).unwrap(),
            FetchMode::Numeric
        );
        assert_eq!(
            FetchMode::from_code(codes::FETCH_COLUMN, FetchArgs::Column(2)).unwrap(),
            FetchMode::Column(2)
        );
        assert_eq!(
            FetchMode::from_code(codes::FETCH_COLUMN, FetchArgs::None).unwrap(),
            FetchMode::Column(0)
        );
    }

    #[test]
    fn test_from_code_rejects_unknown_mode() {
        let err = FetchMode::from_code(42, FetchArgs::None).unwrap_err();
        match err {
            IbrsError::Usage(message) => assert!(message.contains("not supported")),
            other => panic!("Expected Usage error, got {:?}", other),
        }
    }

    #[test]
    fn test_class_mode_requires_schema() {
        assert!(FetchMode::from_code(codes::FETCH_CLASS, FetchArgs::None).is_err());
        let schema = Arc::new(ObjectSchema::new("User", ["id"]));
        let mode = FetchMode::from_code(codes::FETCH_CLASS, FetchArgs::Class(schema)).unwrap();
        assert_eq!(mode.code(), codes::FETCH_CLASS);
    }

    #[test]
    fn test_schema_resolve_exact_then_folded() {
        let schema = ObjectSchema::new("User", ["id", "Name", "NAME"]);
        assert_eq!(schema.resolve("id"), Some("id"));
        assert_eq!(schema.resolve("ID"), Some("id"));
        assert_eq!(schema.resolve("NAME"), Some("NAME"));
        assert_eq!(schema.resolve("name"), Some("Name"));
        assert_eq!(schema.resolve("email"), None);
    }
}
