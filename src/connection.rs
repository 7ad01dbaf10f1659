use std::cell::RefCell;
use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::config::{ConnectionParams, DriverOptions};
use crate::error::{ErrorInfo, IbrsError, NativeError, Result};
use crate::guard::Guarded;
use crate::statement::Statement;
use crate::transaction::{TransactionManager, TransactionOrigin};
use crate::translator::translate;
use crate::traits::{
    AttachParams, ConnectionHandle, DatabasePlatform, NativeClient, TransactionHandle,
};
use crate::types::SqlValue;

/// A bare identifier or a double-quoted one.
static SEQUENCE_NAME: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r#"^(?:[A-Za-z][A-Za-z0-9_$]*|"[^"]+")$"#));

fn check_sequence_name(name: &str) -> Result<()> {
    let pattern = SEQUENCE_NAME
        .as_ref()
        .map_err(|e| IbrsError::Driver(NativeError::driver(e.to_string())))?;
    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(IbrsError::usage(format!(
            "`{}` is not a valid sequence name",
            name
        )))
    }
}

/// A live link to one database.
///
/// A transaction is always open on the server while the connection lives.
/// With autocommit on, the driver keeps an implicit transaction and commits
/// it (retaining the context) after every successful statement;
/// `begin_transaction` switches to an explicit one until `commit` or
/// `rollback`.
///
/// Dropping the connection rolls back the live transaction and detaches.
pub struct Connection {
    // Field order is release order: transaction, then the attachment.
    transactions: RefCell<TransactionManager>,
    handle: Guarded<ConnectionHandle>,
    client: Arc<dyn NativeClient>,
    platform: Arc<dyn DatabasePlatform>,
    error: RefCell<ErrorInfo>,
    dsn: String,
}

impl Connection {
    pub(crate) fn open(
        client: Arc<dyn NativeClient>,
        platform: Arc<dyn DatabasePlatform>,
        params: &ConnectionParams,
        user: Option<&str>,
        password: Option<&str>,
        options: &DriverOptions,
    ) -> Result<Self> {
        let dsn = params.dsn();
        let attach = AttachParams {
            user: user.map(str::to_string),
            password: password.map(str::to_string),
            charset: params.charset.clone(),
            role: params.role.clone(),
        };
        let raw = client.attach(&dsn, &attach).map_err(IbrsError::Connection)?;
        tracing::debug!(handle = %raw, %dsn, "attached");
        let handle = Guarded::new(Arc::clone(&client), raw, |c, h| c.detach(h));
        let transactions = TransactionManager::start(
            Arc::clone(&client),
            raw,
            options.transaction_options(),
            options.autocommit,
        )?;
        Ok(Self {
            transactions: RefCell::new(transactions),
            handle,
            client,
            platform,
            error: RefCell::new(ErrorInfo::none()),
            dsn,
        })
    }

    /// The target string this connection attached to.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub(crate) fn client(&self) -> &Arc<dyn NativeClient> {
        &self.client
    }

    pub(crate) fn current_transaction(&self) -> Option<TransactionHandle> {
        self.transactions.borrow().handle()
    }

    /// Records the outcome as this connection's last error state.
    fn track<T>(&self, result: Result<T>) -> Result<T> {
        *self.error.borrow_mut() = match &result {
            Ok(_) => ErrorInfo::none(),
            Err(e) => e.info(),
        };
        result
    }

    /// Prepares a statement against the current transaction.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        let result = self.prepare_untracked(sql);
        self.track(result)
    }

    fn prepare_untracked(&self, sql: &str) -> Result<Statement<'_>> {
        let transaction = self
            .current_transaction()
            .ok_or_else(|| IbrsError::connection("no active transaction"))?;
        let handle = self
            .client
            .prepare(self.handle.get(), transaction, sql)
            .map_err(translate)?;
        tracing::debug!(%handle, sql, "prepared");
        Ok(Statement::new(self, handle, sql))
    }

    /// Prepares and executes `sql`, returning the statement for fetching.
    pub fn query(&self, sql: &str) -> Result<Statement<'_>> {
        let result = self.prepare_untracked(sql).and_then(|mut statement| {
            statement.execute()?;
            Ok(statement)
        });
        self.track(result)
    }

    /// Prepares and executes `sql`, returning the number of affected rows.
    pub fn exec(&self, sql: &str) -> Result<u64> {
        let result = self.prepare_untracked(sql).and_then(|mut statement| {
            statement.execute()?;
            Ok(statement.row_count())
        });
        self.track(result)
    }

    /// Renders `value` as a SQL literal.
    ///
    /// Numbers are emitted as-is. Text is single-quoted with quotes doubled
    /// and backslashes and control bytes (NUL, LF, CR, SUB) backslash-escaped.
    /// Blobs become hex literals.
    pub fn quote(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int32(_) | SqlValue::Int64(_) | SqlValue::Float64(_) => value.to_string(),
            SqlValue::Blob(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 3);
                out.push_str("X'");
                for b in bytes {
                    let _ = write!(out, "{:02X}", b);
                }
                out.push('\'');
                out
            }
            SqlValue::Text(_) | SqlValue::Bool(_) => {
                let text = value.to_string();
                let mut out = String::with_capacity(text.len() + 2);
                out.push('\'');
                for c in text.chars() {
                    match c {
                        '\'' => out.push_str("''"),
                        '\\' => out.push_str("\\\\"),
                        '\0' => out.push_str("\\000"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\x1a' => out.push_str("\\032"),
                        c => out.push(c),
                    }
                }
                out.push('\'');
                out
            }
        }
    }

    /// Current value of `sequence`, or `None` without a sequence name: the
    /// engine has no identity value that is not tied to a sequence.
    pub fn last_insert_id(&self, sequence: Option<&str>) -> Result<Option<SqlValue>> {
        let Some(sequence) = sequence else {
            return Ok(None);
        };
        let result = check_sequence_name(sequence).and_then(|()| {
            let sql = self.platform.sequence_current_value_sql(sequence);
            let mut statement = self.prepare_untracked(&sql)?;
            statement.execute()?;
            statement.fetch_column(0)
        });
        self.track(result)
    }

    /// Commits pending work and starts an explicit transaction.
    pub fn begin_transaction(&self) -> Result<()> {
        let result = self.transactions.borrow_mut().begin();
        self.track(result)
    }

    /// Commits the live transaction and starts a new implicit one.
    pub fn commit(&self) -> Result<()> {
        let result = self.transactions.borrow_mut().commit();
        self.track(result)
    }

    /// Rolls back the live transaction and starts a new implicit one.
    pub fn rollback(&self) -> Result<()> {
        let result = self.transactions.borrow_mut().rollback();
        self.track(result)
    }

    /// Whether an explicit transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.transactions.borrow().origin() == Some(TransactionOrigin::Explicit)
    }

    pub fn is_autocommit(&self) -> bool {
        self.transactions.borrow().autocommit()
    }

    /// Turns autocommit on or off. Turning it on commits pending implicit work.
    pub fn set_autocommit(&self, autocommit: bool) -> Result<()> {
        let result = self.transactions.borrow_mut().set_autocommit(autocommit);
        self.track(result)
    }

    pub(crate) fn do_auto_commit_if_enabled(&self) -> Result<()> {
        self.transactions.borrow_mut().auto_commit()
    }

    pub fn server_version(&self) -> Result<String> {
        let result = self
            .client
            .server_version(self.handle.get())
            .map_err(translate);
        self.track(result)
    }

    pub fn database_platform(&self) -> &dyn DatabasePlatform {
        &*self.platform
    }

    /// Code of the last error, if one is pending.
    pub fn error_code(&self) -> Option<i32> {
        self.error.borrow().code
    }

    pub fn error_info(&self) -> ErrorInfo {
        self.error.borrow().clone()
    }

    /// Rolls back the live transaction and detaches, reporting failures that
    /// dropping the connection would suppress.
    pub fn close(self) -> Result<()> {
        let Connection {
            transactions,
            handle,
            ..
        } = self;
        let mut transactions = transactions.into_inner();
        let rolled_back = transactions.close();
        drop(transactions);
        let raw = handle.get();
        let detached = handle.release().map_err(IbrsError::Connection);
        tracing::debug!(handle = %raw, ok = detached.is_ok(), "detached");
        rolled_back.and(detached)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("handle", &self.handle.get())
            .field("dsn", &self.dsn)
            .field("transaction", &self.current_transaction())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{InMemoryTestClient, NativeCall, Operation};
    use crate::error::NativeError;
    use crate::traits::DefaultPlatform;

    fn connect(client: &Arc<InMemoryTestClient>) -> Connection {
        Connection::open(
            Arc::clone(client) as Arc<dyn NativeClient>,
            Arc::new(DefaultPlatform),
            &ConnectionParams::new("conn.fdb"),
            Some("SYSDBA"),
            Some("masterkey"),
            &DriverOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_open_starts_implicit_transaction() {
        let client = Arc::new(InMemoryTestClient::new());
        let conn = connect(&client);
        assert!(conn.current_transaction().is_some());
        assert!(!conn.in_transaction());
        assert!(conn.is_autocommit());
        assert_eq!(conn.dsn(), "conn.fdb");
    }

    #[test]
    fn test_attach_failure_is_connection_error() {
        let client = Arc::new(InMemoryTestClient::new());
        client.fail_next(Operation::Attach, NativeError::new(-923, "unreachable"));
        let err = Connection::open(
            Arc::clone(&client) as Arc<dyn NativeClient>,
            Arc::new(DefaultPlatform),
            &ConnectionParams::new("conn.fdb"),
            None,
            None,
            &DriverOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IbrsError::Connection(_)));
    }

    #[test]
    fn test_failed_initial_transaction_detaches() {
        let client = Arc::new(InMemoryTestClient::new());
        client.fail_next(Operation::StartTransaction, NativeError::new(-902, "gone"));
        let result = Connection::open(
            Arc::clone(&client) as Arc<dyn NativeClient>,
            Arc::new(DefaultPlatform),
            &ConnectionParams::new("conn.fdb"),
            None,
            None,
            &DriverOptions::default(),
        );
        assert!(matches!(result, Err(IbrsError::Transaction(_))));
        assert_eq!(client.live_handles().connections, 0);
    }

    #[test]
    fn test_quote() {
        let client = Arc::new(InMemoryTestClient::new());
        let conn = connect(&client);
        assert_eq!(conn.quote(&SqlValue::Int32(42)), "42");
        assert_eq!(conn.quote(&SqlValue::Float64(1.5)), "1.5");
        assert_eq!(conn.quote(&SqlValue::Null), "NULL");
        assert_eq!(conn.quote(&"O'Reilly".into()), "'O''Reilly'");
        assert_eq!(conn.quote(&"a\nb\0".into()), "'a\\nb\\000'");
        assert_eq!(conn.quote(&"42".into()), "'42'");
        assert_eq!(conn.quote(&SqlValue::Blob(vec![0xde, 0xad])), "X'DEAD'");
    }

    #[test]
    fn test_last_insert_id_without_sequence() {
        let client = Arc::new(InMemoryTestClient::new());
        let conn = connect(&client);
        client.clear_calls();
        assert_eq!(conn.last_insert_id(None).unwrap(), None);
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_last_insert_id_rejects_bad_names() {
        let client = Arc::new(InMemoryTestClient::new());
        let conn = connect(&client);
        let err = conn.last_insert_id(Some("s; DROP TABLE t")).unwrap_err();
        assert!(matches!(err, IbrsError::Usage(_)));
        assert_eq!(conn.error_code(), Some(0));
    }

    #[test]
    fn test_last_insert_id_reads_sequence() {
        let client = Arc::new(InMemoryTestClient::new());
        let conn = connect(&client);
        conn.exec("CREATE SEQUENCE ids").unwrap();
        conn.exec("CREATE TABLE t (id INTEGER)").unwrap();
        conn.exec("INSERT INTO t VALUES (GEN_ID(ids, 1))").unwrap();
        conn.exec("INSERT INTO t VALUES (GEN_ID(ids, 1))").unwrap();
        assert_eq!(
            conn.last_insert_id(Some("ids")).unwrap(),
            Some(SqlValue::Int64(2))
        );
    }

    #[test]
    fn test_prepare_without_transaction_is_connection_error() {
        let client = Arc::new(InMemoryTestClient::new());
        let conn = connect(&client);
        client.fail_next(Operation::StartTransaction, NativeError::new(-902, "gone"));
        assert!(conn.commit().is_err());
        let err = conn.prepare("SELECT * FROM RDB$DATABASE").unwrap_err();
        assert!(matches!(err, IbrsError::Connection(_)));
        assert!(conn.error_info().is_pending());
    }

    #[test]
    fn test_error_state_resets_on_success() {
        let client = Arc::new(InMemoryTestClient::new());
        let conn = connect(&client);
        assert!(conn.exec("SELEC 1").is_err());
        assert_eq!(conn.error_code(), Some(-104));
        conn.exec("CREATE TABLE t (id INTEGER)").unwrap();
        assert_eq!(conn.error_info(), ErrorInfo::none());
    }

    #[test]
    fn test_close_rolls_back_then_detaches() {
        let client = Arc::new(InMemoryTestClient::new());
        let conn = connect(&client);
        let transaction = conn.current_transaction().unwrap();
        client.clear_calls();
        conn.close().unwrap();
        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], NativeCall::Rollback { transaction });
        assert!(matches!(calls[1], NativeCall::Detach { .. }));
    }

    #[test]
    fn test_server_version() {
        let client =
            Arc::new(InMemoryTestClient::new().with_server_version("WI-V4.0.2 Firebird 4.0"));
        let conn = connect(&client);
        assert_eq!(conn.server_version().unwrap(), "WI-V4.0.2 Firebird 4.0");
    }
}
