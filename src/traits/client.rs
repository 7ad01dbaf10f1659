use crate::config::TransactionOptions;
use crate::error::NativeError;
use crate::types::{RawRecord, SqlValue};

/// Result of a native client call.
pub type NativeResult<T> = std::result::Result<T, NativeError>;

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

native_handle!(
    /// An attached database.
    ConnectionHandle
);
native_handle!(
    /// A started transaction.
    TransactionHandle
);
native_handle!(
    /// A prepared statement.
    StatementHandle
);
native_handle!(
    /// An open result cursor.
    CursorHandle
);

/// Credentials and session settings handed to the client on attach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachParams {
    pub user: Option<String>,
    pub password: Option<String>,
    pub charset: Option<String>,
    pub role: Option<String>,
}

/// What a successful native execute produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// A result set is available through the cursor
    Cursor(CursorHandle),
    /// The statement changed this many rows
    Affected(u64),
    /// The statement succeeded without a countable effect
    Done,
}

/// Trait for native client implementations.
///
/// This is the narrow surface of the vendor client library the driver relies
/// on. Clients are responsible for:
/// - Attaching to databases and starting transactions
/// - Preparing and executing statements, converting `SqlValue` parameters to
///   native types
/// - Streaming result rows as `RawRecord`s
///
/// Every call either succeeds or reports the engine's pending error.
/// Handles are only meaningful to the client that issued them.
pub trait NativeClient: Send + Sync {
    fn attach(&self, dsn: &str, params: &AttachParams) -> NativeResult<ConnectionHandle>;

    fn detach(&self, connection: ConnectionHandle) -> NativeResult<()>;

    fn server_version(&self, connection: ConnectionHandle) -> NativeResult<String>;

    fn start_transaction(
        &self,
        connection: ConnectionHandle,
        options: &TransactionOptions,
    ) -> NativeResult<TransactionHandle>;

    /// Commits and ends the transaction.
    fn commit(&self, transaction: TransactionHandle) -> NativeResult<()>;

    /// Commits the transaction's work and keeps the transaction open.
    fn commit_retaining(&self, transaction: TransactionHandle) -> NativeResult<()>;

    /// Rolls back and ends the transaction.
    fn rollback(&self, transaction: TransactionHandle) -> NativeResult<()>;

    fn prepare(
        &self,
        connection: ConnectionHandle,
        transaction: TransactionHandle,
        sql: &str,
    ) -> NativeResult<StatementHandle>;

    /// Executes a prepared statement. `params` are in placeholder order.
    fn execute(
        &self,
        transaction: TransactionHandle,
        statement: StatementHandle,
        params: &[SqlValue],
    ) -> NativeResult<ExecuteOutcome>;

    /// Rows affected by the last statement executed in the transaction.
    fn affected_rows(&self, transaction: TransactionHandle) -> NativeResult<u64>;

    fn column_count(&self, cursor: CursorHandle) -> NativeResult<usize>;

    /// Next record of the cursor, or `None` once it is exhausted.
    fn fetch(&self, cursor: CursorHandle) -> NativeResult<Option<RawRecord>>;

    fn free_cursor(&self, cursor: CursorHandle) -> NativeResult<()>;

    fn free_statement(&self, statement: StatementHandle) -> NativeResult<()>;
}
