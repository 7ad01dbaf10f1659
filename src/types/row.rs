use std::ops::Index;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::types::SqlValue;

/// A record as handed over by the native cursor: the column labels in
/// result order and one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Column labels, shared by every record of the same cursor
    pub columns: Arc<[String]>,
    /// Values in column order
    pub values: Vec<SqlValue>,
}

impl RawRecord {
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Column name to value, in column order.
pub type Associative = IndexMap<String, SqlValue>;

/// An opaque record with one field per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Associative,
}

impl Record {
    pub(crate) fn new(fields: Associative) -> Self {
        Self { fields }
    }

    /// Gets a field by its exact column name.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.fields.get(name)
    }

    /// Returns all field names in column order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|s| s.as_str()).collect()
    }

    pub fn fields(&self) -> &Associative {
        &self.fields
    }

    pub fn into_fields(self) -> Associative {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A record re-mapped onto a declared target shape.
///
/// Holds exactly the declared fields, in declared order; fields with no
/// matching column are `SqlValue::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassObject {
    class: String,
    fields: Associative,
    args: Vec<SqlValue>,
}

impl ClassObject {
    pub(crate) fn new(class: String, fields: Associative, args: Vec<SqlValue>) -> Self {
        Self {
            class,
            fields,
            args,
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Constructor arguments supplied with the fetch mode.
    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.fields.get(field)
    }

    /// Moves a field's value out, leaving `Null` behind.
    pub fn take(&mut self, field: &str) -> SqlValue {
        self.fields
            .get_mut(field)
            .map(std::mem::take)
            .unwrap_or(SqlValue::Null)
    }

    pub fn fields(&self) -> &Associative {
        &self.fields
    }
}

/// Key of an entry in a [`MixedRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixedKey<'a> {
    Index(usize),
    Name(&'a str),
}

/// One row addressable both by position and by column name.
///
/// Its entries are the numeric sequence followed by the associative values,
/// so a row with `n` distinct column names has `2n` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedRow {
    numeric: Vec<SqlValue>,
    associative: Associative,
}

impl MixedRow {
    pub(crate) fn new(numeric: Vec<SqlValue>, associative: Associative) -> Self {
        Self {
            numeric,
            associative,
        }
    }

    /// Gets a value by column position.
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.numeric.get(index)
    }

    /// Gets a value by column name.
    pub fn get_by_name(&self, name: &str) -> Option<&SqlValue> {
        self.associative.get(name)
    }

    /// Iterates all entries: positions first, then names.
    pub fn entries(&self) -> impl Iterator<Item = (MixedKey<'_>, &SqlValue)> {
        self.numeric
            .iter()
            .enumerate()
            .map(|(i, v)| (MixedKey::Index(i), v))
            .chain(
                self.associative
                    .iter()
                    .map(|(k, v)| (MixedKey::Name(k.as_str()), v)),
            )
    }

    /// All values in entry order.
    pub fn values(&self) -> Vec<&SqlValue> {
        self.entries().map(|(_, v)| v).collect()
    }

    pub fn numeric(&self) -> &[SqlValue] {
        &self.numeric
    }

    pub fn associative(&self) -> &Associative {
        &self.associative
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.associative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty()
    }
}

impl Index<usize> for MixedRow {
    type Output = SqlValue;

    fn index(&self, index: usize) -> &SqlValue {
        &self.numeric[index]
    }
}

impl Index<&str> for MixedRow {
    type Output = SqlValue;

    fn index(&self, name: &str) -> &SqlValue {
        &self.associative[name]
    }
}

/// A row materialized in one of the fetch shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedRow {
    Column(SqlValue),
    Object(Record),
    Class(ClassObject),
    Associative(Associative),
    Numeric(Vec<SqlValue>),
    Mixed(MixedRow),
}

impl FetchedRow {
    pub fn as_column(&self) -> Option<&SqlValue> {
        match self {
            FetchedRow::Column(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Record> {
        match self {
            FetchedRow::Object(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassObject> {
        match self {
            FetchedRow::Class(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_associative(&self) -> Option<&Associative> {
        match self {
            FetchedRow::Associative(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&[SqlValue]> {
        match self {
            FetchedRow::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mixed(&self) -> Option<&MixedRow> {
        match self {
            FetchedRow::Mixed(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> MixedRow {
        let mut assoc = Associative::new();
        assoc.insert("C1".to_string(), SqlValue::Int32(1));
        assoc.insert("C2".to_string(), "two".into());
        MixedRow::new(vec![SqlValue::Int32(1), "two".into()], assoc)
    }

    #[test]
    fn test_mixed_row_entries_are_index_then_name() {
        let row = mixed();
        let keys: Vec<_> = row.entries().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                MixedKey::Index(0),
                MixedKey::Index(1),
                MixedKey::Name("C1"),
                MixedKey::Name("C2"),
            ]
        );
        assert_eq!(row.len(), 4);
    }

    #[test]
    fn test_mixed_row_indexing() {
        let row = mixed();
        assert_eq!(row[1], SqlValue::Text("two".into()));
        assert_eq!(row["C1"], SqlValue::Int32(1));
        assert!(row.get(2).is_none());
        assert!(row.get_by_name("c1").is_none());
    }

    #[test]
    fn test_class_object_take() {
        let mut fields = Associative::new();
        fields.insert("id".to_string(), SqlValue::Int32(3));
        let mut object = ClassObject::new("User".into(), fields, vec![]);
        assert_eq!(object.take("id"), SqlValue::Int32(3));
        assert_eq!(object.get("id"), Some(&SqlValue::Null));
        assert_eq!(object.take("missing"), SqlValue::Null);
    }
}
