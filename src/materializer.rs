//! Pure shaping of raw fetched records into the fetch-mode shapes.

use crate::error::{IbrsError, Result};
use crate::types::{
    Associative, ClassObject, FetchMode, FetchedRow, MixedRow, ObjectSchema, RawRecord, Record,
    SqlValue,
};

/// Shapes one raw record according to `mode`.
pub fn materialize(raw: RawRecord, mode: &FetchMode) -> Result<FetchedRow> {
    Ok(match mode {
        FetchMode::Column(index) => FetchedRow::Column(column(raw, *index)?),
        FetchMode::Object => FetchedRow::Object(object(raw)),
        FetchMode::Class(schema) => FetchedRow::Class(remap(object(raw), schema)?),
        FetchMode::Associative => FetchedRow::Associative(associative(raw)),
        FetchMode::Numeric => FetchedRow::Numeric(raw.values),
        FetchMode::Mixed => FetchedRow::Mixed(mixed(raw)),
    })
}

/// Extracts the value at `index`.
pub fn column(raw: RawRecord, index: usize) -> Result<SqlValue> {
    let len = raw.values.len();
    raw.values.into_iter().nth(index).ok_or_else(|| {
        IbrsError::usage(format!(
            "invalid column index {} (the result has {} columns)",
            index, len
        ))
    })
}

/// Pairs column names with values. A repeated column name keeps its first
/// position and the last value.
pub fn associative(raw: RawRecord) -> Associative {
    raw.columns
        .iter()
        .cloned()
        .zip(raw.values)
        .collect::<Associative>()
}

pub fn object(raw: RawRecord) -> Record {
    Record::new(associative(raw))
}

pub fn mixed(raw: RawRecord) -> MixedRow {
    let numeric = raw.values.clone();
    MixedRow::new(numeric, associative(raw))
}

/// Re-maps a record's fields onto the declared fields of `schema`.
///
/// Each field is matched by exact name, then case-insensitively. A field the
/// schema does not declare is rejected.
pub fn remap(record: Record, schema: &ObjectSchema) -> Result<ClassObject> {
    let mut fields: Associative = schema
        .fields()
        .iter()
        .map(|f| (f.clone(), SqlValue::Null))
        .collect();
    for (name, value) in record.into_fields() {
        let Some(target) = schema.resolve(&name) else {
            return Err(IbrsError::usage(format!(
                "column `{}` has no matching field in `{}`",
                name,
                schema.class()
            )));
        };
        if let Some(slot) = fields.get_mut(target) {
            *slot = value;
        }
    }
    Ok(ClassObject::new(
        schema.class().to_string(),
        fields,
        schema.args().to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn record(values: Vec<SqlValue>) -> RawRecord {
        RawRecord::new(Arc::from(vec!["C1".to_string(), "C2".to_string()]), values)
    }

    fn row1() -> RawRecord {
        record(vec![SqlValue::Int32(1), "a".into()])
    }

    #[test]
    fn test_numeric_shape() {
        let row = materialize(row1(), &FetchMode::Numeric).unwrap();
        assert_eq!(
            row.as_numeric().unwrap(),
            &[SqlValue::Int32(1), SqlValue::Text("a".into())]
        );
    }

    #[test]
    fn test_associative_shape_keeps_column_order() {
        let row = materialize(row1(), &FetchMode::Associative).unwrap();
        let map = row.as_associative().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["C1", "C2"]);
        assert_eq!(map["C2"], SqlValue::Text("a".into()));
    }

    #[test]
    fn test_mixed_shape_is_numeric_then_associative() {
        let row = materialize(row1(), &FetchMode::Mixed).unwrap();
        let mixed = row.as_mixed().unwrap();
        let values: Vec<SqlValue> = mixed.values().into_iter().cloned().collect();
        assert_eq!(
            values,
            vec![
                SqlValue::Int32(1),
                SqlValue::Text("a".into()),
                SqlValue::Int32(1),
                SqlValue::Text("a".into()),
            ]
        );
    }

    #[test]
    fn test_column_shape_and_bad_index() {
        let row = materialize(row1(), &FetchMode::Column(1)).unwrap();
        assert_eq!(row.as_column(), Some(&SqlValue::Text("a".into())));
        assert!(matches!(
            materialize(row1(), &FetchMode::Column(5)),
            Err(IbrsError::Usage(_))
        ));
    }

    #[test]
    fn test_duplicate_column_names_keep_last_value() {
        let raw = RawRecord::new(
            Arc::from(vec!["X".to_string(), "X".to_string()]),
            vec![SqlValue::Int32(1), SqlValue::Int32(2)],
        );
        let map = associative(raw);
        assert_eq!(map.len(), 1);
        assert_eq!(map["X"], SqlValue::Int32(2));
    }

    #[test]
    fn test_remap_exact_and_case_insensitive() {
        let schema = Arc::new(ObjectSchema::new("Pair", ["C1", "c2"]).with_args(vec![7.into()]));
        let row = materialize(row1(), &FetchMode::Class(schema)).unwrap();
        let object = row.as_class().unwrap();
        assert_eq!(object.class(), "Pair");
        assert_eq!(object.get("C1"), Some(&SqlValue::Int32(1)));
        assert_eq!(object.get("c2"), Some(&SqlValue::Text("a".into())));
        assert_eq!(object.args(), &[SqlValue::Int32(7)]);
    }

    #[test]
    fn test_remap_leaves_unmatched_fields_null() {
        let schema = ObjectSchema::new("Wide", ["c1", "c2", "c3"]);
        let object = remap(object(row1()), &schema).unwrap();
        assert_eq!(object.get("c3"), Some(&SqlValue::Null));
    }

    #[test]
    fn test_remap_rejects_unknown_columns() {
        let schema = ObjectSchema::new("Narrow", ["c1"]);
        match remap(object(row1()), &schema) {
            Err(IbrsError::Usage(message)) => assert!(message.contains("C2")),
            other => panic!("Expected Usage error, got {:?}", other),
        }
    }
}
