use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use crate::connection::Connection;
use crate::error::{ErrorInfo, IbrsError, Result};
use crate::guard::Guarded;
use crate::materializer::{self, materialize};
use crate::translator::translate;
use crate::traits::{CursorHandle, ExecuteOutcome, StatementHandle};
use crate::types::{FetchMode, FetchedRow, FromRecord, ParamType, RawRecord, SqlValue};

/// Where a parameter is bound. Only positive positions are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamIndex {
    Position(i64),
    Name(String),
}

impl From<i64> for ParamIndex {
    fn from(position: i64) -> Self {
        ParamIndex::Position(position)
    }
}

impl From<i32> for ParamIndex {
    fn from(position: i32) -> Self {
        ParamIndex::Position(position as i64)
    }
}

impl From<usize> for ParamIndex {
    fn from(position: usize) -> Self {
        ParamIndex::Position(i64::try_from(position).unwrap_or(i64::MAX))
    }
}

impl From<&str> for ParamIndex {
    fn from(name: &str) -> Self {
        ParamIndex::Name(name.to_string())
    }
}

impl ParamIndex {
    fn position(&self) -> Result<usize> {
        match self {
            ParamIndex::Position(n) if *n >= 1 => {
                usize::try_from(*n).map_err(|_| positional_only())
            }
            _ => Err(positional_only()),
        }
    }
}

fn positional_only() -> IbrsError {
    IbrsError::usage("positional parameters only")
}

/// Parameters supplied directly to `execute_with`.
#[derive(Debug, Clone)]
pub enum ExecuteParams {
    /// Values for positions 1, 2, ...
    Sequential(Vec<SqlValue>),
    /// Values keyed by position. Keys are shifted by one when the map
    /// starts at 0, so both 0-based and 1-based maps work.
    Indexed(BTreeMap<i64, SqlValue>),
}

impl From<Vec<SqlValue>> for ExecuteParams {
    fn from(values: Vec<SqlValue>) -> Self {
        ExecuteParams::Sequential(values)
    }
}

impl From<BTreeMap<i64, SqlValue>> for ExecuteParams {
    fn from(values: BTreeMap<i64, SqlValue>) -> Self {
        ExecuteParams::Indexed(values)
    }
}

impl From<HashMap<i64, SqlValue>> for ExecuteParams {
    fn from(values: HashMap<i64, SqlValue>) -> Self {
        ExecuteParams::Indexed(values.into_iter().collect())
    }
}

#[derive(Debug, Clone)]
enum Binding {
    Value(SqlValue),
    /// Read when the statement executes.
    Reference(Rc<RefCell<SqlValue>>, Option<usize>),
}

#[derive(Debug, Clone)]
struct Bound {
    binding: Binding,
    kind: ParamType,
}

impl Bound {
    fn resolve(&self) -> SqlValue {
        let value = match &self.binding {
            Binding::Value(value) => value.clone(),
            Binding::Reference(cell, length) => truncate(cell.borrow().clone(), *length),
        };
        self.kind.coerce(value)
    }
}

fn truncate(value: SqlValue, length: Option<usize>) -> SqlValue {
    match (value, length) {
        (SqlValue::Text(s), Some(n)) => SqlValue::Text(s.chars().take(n).collect()),
        (SqlValue::Blob(mut b), Some(n)) => {
            b.truncate(n);
            SqlValue::Blob(b)
        }
        (value, _) => value,
    }
}

/// A prepared statement and its current result.
///
/// Created by [`Connection::prepare`]. Bind parameters by 1-based position,
/// execute, then fetch rows in any [`FetchMode`]. Dropping the statement
/// closes its cursor, then frees the statement.
pub struct Statement<'c> {
    connection: &'c Connection,
    // Field order is release order: the cursor goes before the statement.
    cursor: Option<Guarded<CursorHandle>>,
    handle: Guarded<StatementHandle>,
    sql: String,
    bindings: BTreeMap<usize, Bound>,
    fetch_mode: FetchMode,
    affected: u64,
    columns: usize,
    error: ErrorInfo,
}

impl<'c> Statement<'c> {
    pub(crate) fn new(connection: &'c Connection, handle: StatementHandle, sql: &str) -> Self {
        Self {
            connection,
            cursor: None,
            handle: Guarded::new(Arc::clone(connection.client()), handle, |c, h| {
                c.free_statement(h)
            }),
            sql: sql.to_string(),
            bindings: BTreeMap::new(),
            fetch_mode: FetchMode::default(),
            affected: 0,
            columns: 0,
            error: ErrorInfo::none(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        self.error = match &result {
            Ok(_) => ErrorInfo::none(),
            Err(e) => e.info(),
        };
        result
    }

    fn bind(&mut self, index: ParamIndex, bound: Bound) -> Result<()> {
        let result = index.position().map(|position| {
            self.bindings.insert(position, bound);
        });
        self.track(result)
    }

    /// Binds a value at a 1-based position.
    pub fn bind_value(
        &mut self,
        index: impl Into<ParamIndex>,
        value: impl Into<SqlValue>,
    ) -> Result<()> {
        self.bind_value_as(index, value, ParamType::default())
    }

    /// Binds a value with a declared type, applied when the statement executes.
    pub fn bind_value_as(
        &mut self,
        index: impl Into<ParamIndex>,
        value: impl Into<SqlValue>,
        kind: ParamType,
    ) -> Result<()> {
        self.bind(
            index.into(),
            Bound {
                binding: Binding::Value(value.into()),
                kind,
            },
        )
    }

    /// Binds a shared variable. Its value is read, truncated to `length`
    /// (characters of text or bytes of a blob) and coerced to `kind` each
    /// time the statement executes.
    pub fn bind_param(
        &mut self,
        index: impl Into<ParamIndex>,
        variable: Rc<RefCell<SqlValue>>,
        kind: ParamType,
        length: Option<usize>,
    ) -> Result<()> {
        self.bind(
            index.into(),
            Bound {
                binding: Binding::Reference(variable, length),
                kind,
            },
        )
    }

    /// Executes with the current bindings.
    pub fn execute(&mut self) -> Result<()> {
        let result = self.run();
        self.track(result)
    }

    /// Merges `params` into the bindings, then executes.
    pub fn execute_with(&mut self, params: impl Into<ExecuteParams>) -> Result<()> {
        let result = self.merge(params.into()).and_then(|_| self.run());
        self.track(result)
    }

    fn merge(&mut self, params: ExecuteParams) -> Result<()> {
        let values: Vec<(i64, SqlValue)> = match params {
            ExecuteParams::Sequential(values) => (1..).zip(values).collect(),
            ExecuteParams::Indexed(values) => {
                let shift = i64::from(values.contains_key(&0));
                values.into_iter().map(|(k, v)| (k + shift, v)).collect()
            }
        };
        for (position, value) in values {
            let position = ParamIndex::Position(position).position()?;
            self.bindings.insert(
                position,
                Bound {
                    binding: Binding::Value(value),
                    kind: ParamType::default(),
                },
            );
        }
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        self.release_cursor()?;
        self.affected = 0;
        self.columns = 0;

        let params: Vec<SqlValue> = self.bindings.values().map(Bound::resolve).collect();
        let connection = self.connection;
        let transaction = connection
            .current_transaction()
            .ok_or_else(|| IbrsError::connection("no active transaction"))?;
        let client = connection.client();
        let outcome = client
            .execute(transaction, self.handle.get(), &params)
            .map_err(translate)?;
        match outcome {
            ExecuteOutcome::Cursor(cursor) => {
                let guard = Guarded::new(Arc::clone(client), cursor, |c, h| {
                    c.free_cursor(h)
                });
                self.affected = client.affected_rows(transaction).map_err(translate)?;
                self.columns = client.column_count(cursor).map_err(translate)?;
                self.cursor = Some(guard);
            }
            ExecuteOutcome::Affected(rows) => self.affected = rows,
            ExecuteOutcome::Done => {}
        }
        tracing::debug!(
            statement = %self.handle.get(),
            ?outcome,
            affected = self.affected,
            columns = self.columns,
            "executed"
        );
        connection.do_auto_commit_if_enabled()
    }

    /// Sets the mode used by `fetch(None)`, `fetch_all(None)` and `rows()`.
    pub fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.fetch_mode = mode;
    }

    pub fn fetch_mode(&self) -> &FetchMode {
        &self.fetch_mode
    }

    fn next_raw(&mut self) -> Result<Option<RawRecord>> {
        let Some(cursor) = &self.cursor else {
            return Ok(None);
        };
        self.connection
            .client()
            .fetch(cursor.get())
            .map_err(translate)
    }

    /// Fetches the next row, or `None` once the result is exhausted or when
    /// there is no result.
    pub fn fetch(&mut self, mode: Option<FetchMode>) -> Result<Option<FetchedRow>> {
        let mode = mode.unwrap_or_else(|| self.fetch_mode.clone());
        let result = self
            .next_raw()
            .and_then(|raw| raw.map(|raw| materialize(raw, &mode)).transpose());
        self.track(result)
    }

    /// Fetches every remaining row in the same mode.
    pub fn fetch_all(&mut self, mode: Option<FetchMode>) -> Result<Vec<FetchedRow>> {
        let mode = mode.unwrap_or_else(|| self.fetch_mode.clone());
        let mut rows = Vec::new();
        while let Some(row) = self.fetch(Some(mode.clone()))? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Fetches one value from the next row by 0-based column position.
    pub fn fetch_column(&mut self, index: usize) -> Result<Option<SqlValue>> {
        let result = self
            .next_raw()
            .and_then(|raw| raw.map(|raw| materializer::column(raw, index)).transpose());
        self.track(result)
    }

    /// Fetches the next row into a declared target type.
    pub fn fetch_into<T: FromRecord>(&mut self) -> Result<Option<T>> {
        let schema = T::schema();
        let result = self.next_raw().and_then(|raw| {
            raw.map(|raw| {
                materializer::remap(materializer::object(raw), &schema).and_then(T::from_object)
            })
            .transpose()
        });
        self.track(result)
    }

    pub fn fetch_all_into<T: FromRecord>(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.fetch_into()? {
            items.push(item);
        }
        Ok(items)
    }

    /// Iterates over the remaining rows in the statement's fetch mode.
    pub fn rows(&mut self) -> Rows<'_, 'c> {
        Rows { statement: self }
    }

    /// Rows affected by the last execute.
    pub fn row_count(&self) -> u64 {
        self.affected
    }

    /// Columns of the current result, 0 without one.
    pub fn column_count(&self) -> usize {
        if self.cursor.is_some() {
            self.columns
        } else {
            0
        }
    }

    /// Releases the current result, if any.
    pub fn close_cursor(&mut self) -> Result<()> {
        let result = self.release_cursor();
        self.track(result)
    }

    fn release_cursor(&mut self) -> Result<()> {
        match self.cursor.take() {
            Some(cursor) => cursor.release().map_err(translate),
            None => Ok(()),
        }
    }

    pub fn error_code(&self) -> Option<i32> {
        self.error.code
    }

    pub fn error_info(&self) -> ErrorInfo {
        self.error.clone()
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("handle", &self.handle.get())
            .field("sql", &self.sql)
            .field("cursor", &self.cursor.as_ref().map(|c| c.get()))
            .finish()
    }
}

/// Iterator over a statement's remaining rows.
pub struct Rows<'s, 'c> {
    statement: &'s mut Statement<'c>,
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<FetchedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.statement.fetch(None).transpose()
    }
}
